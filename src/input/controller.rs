use egui::{CursorIcon, Pos2, Rect, Vec2};
use log::debug;

use crate::document::Document;
use crate::element::{ElementId, RESIZE_HANDLE_RADIUS, clamp_rect_to_canvas};
use crate::history::BoundedHistory;
use crate::overlay::DraftOverlay;
use crate::panel::PanelId;

use super::{CanvasLayout, DRAG_START_THRESHOLD, GESTURE_TIMEOUT_SECS};

/// The eight resize handles around a selected element's bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 8] = [
        ResizeHandle::North,
        ResizeHandle::South,
        ResizeHandle::East,
        ResizeHandle::West,
        ResizeHandle::NorthEast,
        ResizeHandle::NorthWest,
        ResizeHandle::SouthEast,
        ResizeHandle::SouthWest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResizeHandle::North => "n",
            ResizeHandle::South => "s",
            ResizeHandle::East => "e",
            ResizeHandle::West => "w",
            ResizeHandle::NorthEast => "ne",
            ResizeHandle::NorthWest => "nw",
            ResizeHandle::SouthEast => "se",
            ResizeHandle::SouthWest => "sw",
        }
    }

    pub fn cursor_icon(&self) -> CursorIcon {
        match self {
            ResizeHandle::North | ResizeHandle::South => CursorIcon::ResizeVertical,
            ResizeHandle::East | ResizeHandle::West => CursorIcon::ResizeHorizontal,
            ResizeHandle::NorthWest | ResizeHandle::SouthEast => CursorIcon::ResizeNwSe,
            ResizeHandle::NorthEast | ResizeHandle::SouthWest => CursorIcon::ResizeNeSw,
        }
    }

    /// Anchor point of this handle on an element's bounding box.
    pub fn position_on(&self, rect: Rect) -> Pos2 {
        match self {
            ResizeHandle::North => rect.center_top(),
            ResizeHandle::South => rect.center_bottom(),
            ResizeHandle::East => rect.right_center(),
            ResizeHandle::West => rect.left_center(),
            ResizeHandle::NorthEast => rect.right_top(),
            ResizeHandle::NorthWest => rect.left_top(),
            ResizeHandle::SouthEast => rect.right_bottom(),
            ResizeHandle::SouthWest => rect.left_bottom(),
        }
    }

    /// Applies a logical-unit pointer delta to the original rect. Each handle
    /// moves only its own edges; the minimum size floor is enforced here,
    /// before any clamping to panel bounds.
    pub fn apply(&self, original: Rect, delta: Vec2, min_size: f32) -> Rect {
        let mut rect = original;

        let moves_west = matches!(
            self,
            ResizeHandle::West | ResizeHandle::NorthWest | ResizeHandle::SouthWest
        );
        let moves_east = matches!(
            self,
            ResizeHandle::East | ResizeHandle::NorthEast | ResizeHandle::SouthEast
        );
        let moves_north = matches!(
            self,
            ResizeHandle::North | ResizeHandle::NorthEast | ResizeHandle::NorthWest
        );
        let moves_south = matches!(
            self,
            ResizeHandle::South | ResizeHandle::SouthEast | ResizeHandle::SouthWest
        );

        if moves_west {
            rect.min.x = (original.min.x + delta.x).min(original.max.x - min_size);
        }
        if moves_east {
            rect.max.x = (original.max.x + delta.x).max(original.min.x + min_size);
        }
        if moves_north {
            rect.min.y = (original.min.y + delta.y).min(original.max.y - min_size);
        }
        if moves_south {
            rect.max.y = (original.max.y + delta.y).max(original.min.y + min_size);
        }

        rect
    }
}

/// What a pointer-down landed on, reported back so the session can update
/// selection (selection changes are never undoable).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerHit {
    /// Outside every panel's canvas region.
    Nothing,
    /// On a panel's canvas but not on any element.
    Panel(PanelId),
    /// On an element body (potential drag).
    Element { panel: PanelId, element: ElementId },
    /// On a resize handle of the already-selected element.
    Handle {
        panel: PanelId,
        element: ElementId,
        handle: ResizeHandle,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingKind {
    Drag {
        /// Pointer offset from the element's top-left corner, logical units.
        grab_offset: Vec2,
    },
    Resize {
        handle: ResizeHandle,
        original: Rect,
    },
}

/// Per-gesture state machine. `Pending` is the hysteresis window between
/// pointer-down and actual drag/resize activation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Pending {
        element: ElementId,
        panel: PanelId,
        down_screen: Pos2,
        kind: PendingKind,
    },
    Dragging {
        element: ElementId,
        /// Owning panel in the draft overlay; updated on cross-panel moves.
        owner: PanelId,
        grab_offset: Vec2,
        started_at: f64,
    },
    Resizing {
        element: ElementId,
        panel: PanelId,
        handle: ResizeHandle,
        original: Rect,
        down_screen: Pos2,
        started_at: f64,
    },
}

/// Result of feeding one pointer-move to the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveEffect {
    /// Set when a cross-panel migration happened and the session should move
    /// panel selection to the new owner.
    pub select_panel: Option<PanelId>,
    /// Set when the gesture hit its liveness timeout and was force-committed.
    pub committed: bool,
}

/// Translates raw pointer events into draft-overlay mutations: element drags,
/// resizes, cross-panel migration, and the hide-while-outside affordance.
///
/// Only one gesture can be active at a time; a pointer-down arriving while a
/// gesture is live is dropped.
#[derive(Debug)]
pub struct PointerController {
    state: GestureState,
}

impl PointerController {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, GestureState::Idle)
    }

    pub fn is_gesturing(&self) -> bool {
        matches!(
            self.state,
            GestureState::Dragging { .. } | GestureState::Resizing { .. }
        )
    }

    /// Hit-tests a pointer-down and arms the gesture machine. Returns what was
    /// hit so the session can update selection. Ignored unless idle.
    pub fn pointer_down(
        &mut self,
        screen_pos: Pos2,
        layout: &CanvasLayout,
        doc: &Document,
        selected_element: Option<ElementId>,
    ) -> PointerHit {
        if !matches!(self.state, GestureState::Idle) {
            debug!("pointer down ignored: gesture already active");
            return PointerHit::Nothing;
        }

        let Some(panel_id) = layout.panel_at(screen_pos) else {
            return PointerHit::Nothing;
        };

        // Resize handles of the selected element win over element bodies.
        if let Some(selected) = selected_element {
            if let Some(hit) = self.hit_handle(screen_pos, layout, doc, panel_id, selected) {
                return hit;
            }
        }

        let Some(panel) = doc.panel(panel_id) else {
            return PointerHit::Nothing;
        };
        let Some(logical) = layout.to_logical(panel_id, screen_pos) else {
            return PointerHit::Nothing;
        };

        // Topmost element under the pointer: scan in reverse display order.
        if let Some(element) = panel.elements.iter().rev().find(|e| e.contains(logical)) {
            self.state = GestureState::Pending {
                element: element.id,
                panel: panel_id,
                down_screen: screen_pos,
                kind: PendingKind::Drag {
                    grab_offset: logical - element.rect().min,
                },
            };
            return PointerHit::Element {
                panel: panel_id,
                element: element.id,
            };
        }

        PointerHit::Panel(panel_id)
    }

    fn hit_handle(
        &mut self,
        screen_pos: Pos2,
        layout: &CanvasLayout,
        doc: &Document,
        panel_id: PanelId,
        selected: ElementId,
    ) -> Option<PointerHit> {
        let owner = doc.owner_of(selected)?;
        let element = doc.find_element(selected)?;
        let screen_rect = layout.to_screen(owner, element.rect())?;

        for handle in ResizeHandle::ALL {
            let anchor = handle.position_on(screen_rect);
            if anchor.distance(screen_pos) <= RESIZE_HANDLE_RADIUS {
                self.state = GestureState::Pending {
                    element: selected,
                    panel: owner,
                    down_screen: screen_pos,
                    kind: PendingKind::Resize {
                        handle,
                        original: element.rect(),
                    },
                };
                return Some(PointerHit::Handle {
                    panel: panel_id,
                    element: selected,
                    handle,
                });
            }
        }
        None
    }

    /// Feeds a pointer-move. Activates a pending gesture once the pointer has
    /// travelled past the hysteresis threshold, then mutates the draft overlay
    /// in place for each subsequent move.
    pub fn pointer_move(
        &mut self,
        screen_pos: Pos2,
        layout: &CanvasLayout,
        overlay: &mut DraftOverlay,
        history: &mut BoundedHistory,
        now: f64,
    ) -> MoveEffect {
        match self.state {
            GestureState::Idle => MoveEffect::default(),
            GestureState::Pending {
                element,
                panel,
                down_screen,
                kind,
            } => {
                let travelled = layout.to_logical_delta(screen_pos - down_screen).length();
                if travelled <= DRAG_START_THRESHOLD {
                    return MoveEffect::default();
                }
                overlay.begin(history.current().clone());
                self.state = match kind {
                    PendingKind::Drag { grab_offset } => GestureState::Dragging {
                        element,
                        owner: panel,
                        grab_offset,
                        started_at: now,
                    },
                    PendingKind::Resize { handle, original } => GestureState::Resizing {
                        element,
                        panel,
                        handle,
                        original,
                        down_screen,
                        started_at: now,
                    },
                };
                // Re-enter with the gesture armed so this move already lands.
                self.pointer_move(screen_pos, layout, overlay, history, now)
            }
            GestureState::Dragging {
                element,
                owner,
                grab_offset,
                started_at,
            } => {
                if self.timed_out(started_at, now, overlay, history) {
                    return MoveEffect {
                        select_panel: None,
                        committed: true,
                    };
                }
                self.drag_move(
                    screen_pos, layout, overlay, history, element, owner, grab_offset,
                    started_at,
                )
            }
            GestureState::Resizing {
                element,
                panel,
                handle,
                original,
                down_screen,
                started_at,
            } => {
                if self.timed_out(started_at, now, overlay, history) {
                    return MoveEffect {
                        select_panel: None,
                        committed: true,
                    };
                }
                self.resize_move(
                    screen_pos,
                    layout,
                    overlay,
                    history,
                    element,
                    panel,
                    handle,
                    original,
                    down_screen,
                );
                MoveEffect::default()
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn drag_move(
        &mut self,
        screen_pos: Pos2,
        layout: &CanvasLayout,
        overlay: &mut DraftOverlay,
        history: &mut BoundedHistory,
        element: ElementId,
        owner: PanelId,
        grab_offset: Vec2,
        started_at: f64,
    ) -> MoveEffect {
        // Read-modify-write against the previous draft state, never the
        // committed one, so no intermediate move is lost within a gesture.
        let mut working = overlay.view(history.current()).clone();

        // The element may have been deleted out from under the gesture;
        // ignore the event and let the gesture end normally on pointer-up.
        if working.owner_of(element).is_none() {
            debug!("drag target {element} vanished mid-gesture, ignoring move");
            return MoveEffect::default();
        }

        let mut effect = MoveEffect::default();
        match layout.panel_at(screen_pos) {
            None => {
                // Outside every canvas: hide, keep coordinates, do not reparent.
                if let Some(el) = working
                    .owner_of(element)
                    .and_then(|p| working.panel_mut(p))
                    .and_then(|p| p.element_mut(element))
                {
                    el.hidden_while_dragging = true;
                }
            }
            Some(target) => {
                let logical = layout
                    .to_logical(target, screen_pos)
                    .expect("panel_at and to_logical use the same layout");
                let new_min = logical - grab_offset;
                working.migrate_element(element, target, new_min);
                if target != owner {
                    self.state = GestureState::Dragging {
                        element,
                        owner: target,
                        grab_offset,
                        started_at,
                    };
                    effect.select_panel = Some(target);
                }
            }
        }

        overlay.apply(working);
        effect
    }

    #[allow(clippy::too_many_arguments)]
    fn resize_move(
        &mut self,
        screen_pos: Pos2,
        layout: &CanvasLayout,
        overlay: &mut DraftOverlay,
        history: &mut BoundedHistory,
        element: ElementId,
        panel: PanelId,
        handle: ResizeHandle,
        original: Rect,
        down_screen: Pos2,
    ) {
        let mut working = overlay.view(history.current()).clone();
        let canvas = working.canvas_size();

        let Some(el) = working.panel_mut(panel).and_then(|p| p.element_mut(element)) else {
            debug!("resize target {element} vanished mid-gesture, ignoring move");
            return;
        };

        let delta = layout.to_logical_delta(screen_pos - down_screen);
        let resized = handle.apply(original, delta, crate::element::MIN_ELEMENT_SIZE);
        el.set_rect(clamp_rect_to_canvas(resized, canvas));

        overlay.apply(working);
    }

    fn timed_out(
        &mut self,
        started_at: f64,
        now: f64,
        overlay: &mut DraftOverlay,
        history: &mut BoundedHistory,
    ) -> bool {
        if now - started_at < GESTURE_TIMEOUT_SECS {
            return false;
        }
        debug!("gesture exceeded {GESTURE_TIMEOUT_SECS}s, force-committing");
        overlay.commit(history);
        self.state = GestureState::Idle;
        true
    }

    /// Pointer released: commit whatever the gesture produced. Returns `true`
    /// when a draft was actually committed to history.
    pub fn pointer_up(
        &mut self,
        overlay: &mut DraftOverlay,
        history: &mut BoundedHistory,
    ) -> bool {
        let was_gesturing = self.is_gesturing();
        self.state = GestureState::Idle;
        if was_gesturing {
            let had_work = overlay.working().is_some();
            overlay.commit(history);
            had_work
        } else {
            // A click that never crossed the threshold; nothing to commit.
            overlay.cancel();
            false
        }
    }

    /// Escape pressed: discard the gesture, restoring the pre-gesture state.
    pub fn cancel(&mut self, overlay: &mut DraftOverlay) {
        if !matches!(self.state, GestureState::Idle) {
            debug!("gesture cancelled");
        }
        self.state = GestureState::Idle;
        overlay.cancel();
    }

    /// Clock tick outside pointer events, so a drag that stops producing move
    /// events still hits the liveness timeout.
    pub fn tick(
        &mut self,
        now: f64,
        overlay: &mut DraftOverlay,
        history: &mut BoundedHistory,
    ) -> bool {
        let started_at = match self.state {
            GestureState::Dragging { started_at, .. }
            | GestureState::Resizing { started_at, .. } => started_at,
            _ => return false,
        };
        self.timed_out(started_at, now, overlay, history)
    }
}

impl Default for PointerController {
    fn default() -> Self {
        Self::new()
    }
}
