use egui::Vec2;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::element::{Element, ElementDraft, ElementId};
use crate::panel::{Panel, PanelId};

/// Aspect-ratio tag shared by every panel in a document. Each ratio fixes the
/// logical coordinate space elements live in, independent of display zoom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanvasRatio {
    #[serde(rename = "4:5")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Widescreen,
}

impl CanvasRatio {
    /// Logical canvas size for this ratio, in element coordinate units.
    pub fn canvas_size(&self) -> Vec2 {
        match self {
            CanvasRatio::Portrait => Vec2::new(400.0, 500.0),
            CanvasRatio::Square => Vec2::new(400.0, 400.0),
            CanvasRatio::Widescreen => Vec2::new(640.0, 360.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CanvasRatio::Portrait => "4:5",
            CanvasRatio::Square => "1:1",
            CanvasRatio::Widescreen => "16:9",
        }
    }
}

impl Default for CanvasRatio {
    fn default() -> Self {
        CanvasRatio::Portrait
    }
}

/// Direction for reordering a panel relative to its neighbors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderDirection {
    Up,
    Down,
}

/// The full editable artifact for one project session: an ordered sequence of
/// panels sharing one canvas ratio.
///
/// This is the unit the history store snapshots. Transient UI focus (selection)
/// deliberately lives outside it, on the session, so it can never be undone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    panels: Vec<Panel>,
    canvas_ratio: CanvasRatio,
}

impl Document {
    /// A fresh document always starts with two empty panels.
    pub fn new(canvas_ratio: CanvasRatio) -> Self {
        Self {
            panels: vec![Panel::new(), Panel::new()],
            canvas_ratio,
        }
    }

    pub(crate) fn from_parts(panels: Vec<Panel>, canvas_ratio: CanvasRatio) -> Self {
        debug_assert!(!panels.is_empty());
        Self {
            panels,
            canvas_ratio,
        }
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn canvas_ratio(&self) -> CanvasRatio {
        self.canvas_ratio
    }

    pub fn canvas_size(&self) -> Vec2 {
        self.canvas_ratio.canvas_size()
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|p| p.id == id)
    }

    pub fn panel_mut(&mut self, id: PanelId) -> Option<&mut Panel> {
        self.panels.iter_mut().find(|p| p.id == id)
    }

    pub fn panel_index(&self, id: PanelId) -> Option<usize> {
        self.panels.iter().position(|p| p.id == id)
    }

    pub fn first_panel_id(&self) -> PanelId {
        self.panels[0].id
    }

    /// Finds the panel owning the given element. Ownership is not indexed
    /// elsewhere; element counts per document are small enough that a linear
    /// scan avoids a second source of truth.
    pub fn owner_of(&self, element_id: ElementId) -> Option<PanelId> {
        self.panels
            .iter()
            .find(|p| p.contains_element(element_id))
            .map(|p| p.id)
    }

    pub fn find_element(&self, element_id: ElementId) -> Option<&Element> {
        self.panels.iter().find_map(|p| p.element(element_id))
    }

    /// Switches the document-wide aspect ratio, re-clamping every element into
    /// the new coordinate space. No-op when the ratio is unchanged.
    pub fn set_canvas_ratio(&mut self, ratio: CanvasRatio) -> bool {
        if self.canvas_ratio == ratio {
            return false;
        }
        self.canvas_ratio = ratio;
        let canvas = ratio.canvas_size();
        for panel in &mut self.panels {
            for element in &mut panel.elements {
                element.clamp_to(canvas);
            }
        }
        true
    }

    /// Appends a new empty panel and returns its id.
    pub fn add_panel(&mut self) -> PanelId {
        let panel = Panel::new();
        let id = panel.id;
        self.panels.push(panel);
        debug!("added panel {id}, {} total", self.panels.len());
        id
    }

    /// Removes a panel. Rejected (returns `false`) when it would leave the
    /// document empty or when the id is unknown.
    pub fn delete_panel(&mut self, id: PanelId) -> bool {
        if self.panels.len() <= 1 {
            debug!("refusing to delete the last remaining panel");
            return false;
        }
        let Some(index) = self.panel_index(id) else {
            return false;
        };
        self.panels.remove(index);
        true
    }

    /// Swaps a panel with its immediate neighbor. No-op at either boundary.
    pub fn reorder_panel(&mut self, id: PanelId, direction: ReorderDirection) -> bool {
        let Some(index) = self.panel_index(id) else {
            return false;
        };
        let target = match direction {
            ReorderDirection::Up if index > 0 => index - 1,
            ReorderDirection::Down if index + 1 < self.panels.len() => index + 1,
            _ => return false,
        };
        self.panels.swap(index, target);
        true
    }

    /// Appends a new element to the addressed panel and returns its id.
    /// No-op when the panel does not exist or the draft is invalid.
    pub fn add_element(&mut self, panel_id: PanelId, draft: ElementDraft) -> Option<ElementId> {
        if !draft.is_valid() {
            debug!("ignoring invalid element draft ({})", draft.kind.type_name());
            return None;
        }
        let canvas = self.canvas_size();
        let panel = self.panel_mut(panel_id)?;
        let element = draft.build(canvas);
        let id = element.id;
        panel.elements.push(element);
        Some(id)
    }

    /// Removes an element wherever it lives. Returns `true` if it was found.
    pub fn delete_element(&mut self, element_id: ElementId) -> bool {
        for panel in &mut self.panels {
            if panel.take_element(element_id).is_some() {
                return true;
            }
        }
        false
    }

    /// Merges a property patch into an element, re-clamping geometry when
    /// position or size changed. No-op on unknown ids.
    pub fn update_element(&mut self, element_id: ElementId, patch: ElementPatch) -> bool {
        let canvas = self.canvas_size();
        for panel in &mut self.panels {
            if let Some(element) = panel.element_mut(element_id) {
                let geometry_changed = patch.apply(element);
                if geometry_changed {
                    element.clamp_to(canvas);
                }
                return true;
            }
        }
        false
    }

    /// Moves an element to another panel at the given target-local position,
    /// clamped into the target's canvas. The duplicate guard makes re-entrant
    /// calls harmless: if the element is already in the target panel only its
    /// position is updated. Landing on any panel always unhides the element,
    /// so a drag that left every canvas and came back shows it again.
    pub fn migrate_element(
        &mut self,
        element_id: ElementId,
        target_panel: PanelId,
        new_pos: egui::Pos2,
    ) -> bool {
        let Some(owner) = self.owner_of(element_id) else {
            return false;
        };
        if self.panel(target_panel).is_none() {
            return false;
        }
        let canvas = self.canvas_size();
        if owner == target_panel {
            let element = self
                .panel_mut(owner)
                .and_then(|p| p.element_mut(element_id))
                .expect("owner panel was just located");
            element.x = new_pos.x;
            element.y = new_pos.y;
            element.hidden_while_dragging = false;
            element.clamp_to(canvas);
            return true;
        }
        let mut element = self
            .panel_mut(owner)
            .and_then(|p| p.take_element(element_id))
            .expect("owner panel was just located");
        element.x = new_pos.x;
        element.y = new_pos.y;
        element.hidden_while_dragging = false;
        element.clamp_to(canvas);
        let target = self
            .panel_mut(target_panel)
            .expect("target panel was just located");
        if !target.contains_element(element_id) {
            target.elements.push(element);
        }
        true
    }

    /// A copy fit for a history snapshot: ephemeral drag flags stripped, so no
    /// committed state can carry a mid-gesture hide marker.
    pub fn sanitized(&self) -> Document {
        let mut copy = self.clone();
        for panel in &mut copy.panels {
            for element in &mut panel.elements {
                element.hidden_while_dragging = false;
            }
        }
        copy
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(CanvasRatio::default())
    }
}

/// Partial element update, the statically-typed form of a "merge these props"
/// call. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ElementPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub content: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<String>,
    pub fill_color: Option<String>,
    pub stroke_color: Option<String>,
    pub stroke_width: Option<f32>,
}

impl ElementPatch {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::default()
        }
    }

    /// Applies the patch, returning whether geometry changed.
    fn apply(&self, element: &mut Element) -> bool {
        use crate::element::ElementKind;

        let mut geometry_changed = false;
        if let Some(x) = self.x {
            element.x = x;
            geometry_changed = true;
        }
        if let Some(y) = self.y {
            element.y = y;
            geometry_changed = true;
        }
        if let Some(width) = self.width {
            element.width = width;
            geometry_changed = true;
        }
        if let Some(height) = self.height {
            element.height = height;
            geometry_changed = true;
        }

        match &mut element.kind {
            ElementKind::Text {
                content,
                font_size,
                color,
            } => {
                if let Some(new_content) = &self.content {
                    *content = new_content.clone();
                }
                if let Some(new_size) = self.font_size {
                    *font_size = new_size;
                }
                if let Some(new_color) = &self.color {
                    *color = new_color.clone();
                }
            }
            ElementKind::Bubble {
                fill_color,
                stroke_color,
                stroke_width,
                ..
            } => {
                if let Some(new_fill) = &self.fill_color {
                    *fill_color = new_fill.clone();
                }
                if let Some(new_stroke) = &self.stroke_color {
                    *stroke_color = new_stroke.clone();
                }
                if let Some(new_width) = self.stroke_width {
                    *stroke_width = new_width;
                }
            }
        }
        geometry_changed
    }
}
