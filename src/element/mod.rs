use egui::{Pos2, Rect, Vec2, pos2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

mod common;

pub use common::{MIN_ELEMENT_SIZE, RESIZE_HANDLE_RADIUS};
pub(crate) use common::clamp_rect_to_canvas;

/// Unique identifier for an element, stable across save/load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementId(Uuid);

impl ElementId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ElementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Type-specific payload of an element.
///
/// Colors are hex strings (`"#rrggbb"`) because the persisted payload is
/// exchanged with a web backend that stores them that way.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Text {
        content: String,
        font_size: f32,
        color: String,
    },
    Bubble {
        style: String,
        template_id: String,
        fill_color: String,
        stroke_color: String,
        stroke_width: f32,
    },
}

impl ElementKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            ElementKind::Text { .. } => "text",
            ElementKind::Bubble { .. } => "bubble",
        }
    }
}

/// A positioned text or speech-bubble overlay inside one panel.
///
/// Coordinates are panel-local logical units, independent of display zoom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(flatten)]
    pub kind: ElementKind,
    /// True only while the pointer is outside every panel during a drag of this
    /// element. Never survives a commit and is never serialized.
    #[serde(skip)]
    pub hidden_while_dragging: bool,
}

impl Element {
    pub fn rect(&self) -> Rect {
        Rect::from_min_size(pos2(self.x, self.y), Vec2::new(self.width, self.height))
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.x = rect.min.x;
        self.y = rect.min.y;
        self.width = rect.width();
        self.height = rect.height();
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        self.rect().contains(pos)
    }

    /// Re-clamps this element's bounding box into a canvas of the given size.
    pub fn clamp_to(&mut self, canvas: Vec2) {
        let clamped = clamp_rect_to_canvas(self.rect(), canvas);
        self.set_rect(clamped);
    }
}

/// Everything needed to create an element except its id, which is assigned on
/// insertion.
#[derive(Debug, Clone)]
pub struct ElementDraft {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub kind: ElementKind,
}

impl ElementDraft {
    pub fn text(content: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            width: 160.0,
            height: 48.0,
            kind: ElementKind::Text {
                content: content.into(),
                font_size: 16.0,
                color: "#000000".to_owned(),
            },
        }
    }

    pub fn bubble(template_id: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            width: 120.0,
            height: 90.0,
            kind: ElementKind::Bubble {
                style: "round".to_owned(),
                template_id: template_id.into(),
                fill_color: "#ffffff".to_owned(),
                stroke_color: "#000000".to_owned(),
                stroke_width: 2.0,
            },
        }
    }

    /// A draft is rejected (silent no-op at the model layer) when it could not
    /// produce a meaningful element, e.g. a text element with empty content.
    pub fn is_valid(&self) -> bool {
        match &self.kind {
            ElementKind::Text { content, .. } => !content.trim().is_empty(),
            ElementKind::Bubble { template_id, .. } => !template_id.is_empty(),
        }
    }

    /// Materializes the draft with a fresh id, clamped into the given canvas.
    pub(crate) fn build(self, canvas: Vec2) -> Element {
        let mut element = Element {
            id: ElementId::new(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            kind: self.kind,
            hidden_while_dragging: false,
        };
        element.clamp_to(canvas);
        element
    }
}
