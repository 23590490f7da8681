use egui::{Pos2, Rect, Vec2};

use crate::panel::PanelId;

mod controller;

pub use controller::{
    GestureState, MoveEffect, PendingKind, PointerController, PointerHit, ResizeHandle,
};

/// Minimum pointer travel, in logical units, before a pointer-down turns into
/// a drag or resize. Prevents a plain click from being misclassified.
pub const DRAG_START_THRESHOLD: f32 = 3.0;

/// A stuck gesture is force-committed after this many seconds rather than left
/// open indefinitely; committing keeps the user's positioning work.
pub const GESTURE_TIMEOUT_SECS: f64 = 5.0;

/// Where each panel's canvas region sits on screen this frame, plus the
/// display zoom. The shell rebuilds this every frame; the controller never
/// reads the windowing system directly.
#[derive(Debug, Clone)]
pub struct CanvasLayout {
    zoom: f32,
    panels: Vec<(PanelId, Rect)>,
}

impl CanvasLayout {
    pub fn new(zoom: f32) -> Self {
        debug_assert!(zoom > 0.0);
        Self {
            zoom,
            panels: Vec::new(),
        }
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    pub fn push_panel(&mut self, id: PanelId, screen_rect: Rect) {
        self.panels.push((id, screen_rect));
    }

    /// The panel whose canvas region contains the given screen position.
    pub fn panel_at(&self, screen_pos: Pos2) -> Option<PanelId> {
        self.panels
            .iter()
            .find(|(_, rect)| rect.contains(screen_pos))
            .map(|(id, _)| *id)
    }

    pub fn screen_rect_of(&self, panel: PanelId) -> Option<Rect> {
        self.panels
            .iter()
            .find(|(id, _)| *id == panel)
            .map(|(_, rect)| *rect)
    }

    /// Converts a screen position into the panel's logical coordinate space.
    pub fn to_logical(&self, panel: PanelId, screen_pos: Pos2) -> Option<Pos2> {
        let rect = self.screen_rect_of(panel)?;
        Some(((screen_pos - rect.min) / self.zoom).to_pos2())
    }

    /// Converts a panel-local logical rectangle into screen space.
    pub fn to_screen(&self, panel: PanelId, logical: Rect) -> Option<Rect> {
        let origin = self.screen_rect_of(panel)?.min;
        Some(Rect::from_min_size(
            origin + logical.min.to_vec2() * self.zoom,
            logical.size() * self.zoom,
        ))
    }

    /// Screen-pixel delta scaled into logical units, so drag and resize
    /// behavior is zoom-invariant.
    pub fn to_logical_delta(&self, screen_delta: Vec2) -> Vec2 {
        screen_delta / self.zoom
    }
}
