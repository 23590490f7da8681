use std::collections::HashSet;

use egui::{Align2, Color32, FontId, Painter, Rect, Stroke};

use crate::document::Document;
use crate::element::{Element, ElementKind, RESIZE_HANDLE_RADIUS};
use crate::input::{CanvasLayout, ResizeHandle};
use crate::panel::{Panel, PanelId};

const PANEL_FILL: Color32 = Color32::WHITE;
const PANEL_OUTLINE: Color32 = Color32::from_rgb(180, 180, 180);
const SELECTED_PANEL_OUTLINE: Color32 = Color32::from_rgb(30, 120, 255);
const SELECTION_OUTLINE: Color32 = Color32::from_rgb(255, 60, 60);
const HANDLE_FILL: Color32 = Color32::from_rgb(30, 120, 255);

/// Parses a `#rrggbb` hex string; falls back to black on malformed input so a
/// bad persisted color never breaks rendering.
fn parse_hex_color(hex: &str) -> Color32 {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 {
        return Color32::BLACK;
    }
    match u32::from_str_radix(digits, 16) {
        Ok(rgb) => Color32::from_rgb(
            ((rgb >> 16) & 0xff) as u8,
            ((rgb >> 8) & 0xff) as u8,
            (rgb & 0xff) as u8,
        ),
        Err(_) => Color32::BLACK,
    }
}

/// Draws the document onto the shell's painter using the frame's layout.
#[derive(Debug, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(
        &self,
        painter: &Painter,
        doc: &Document,
        layout: &CanvasLayout,
        selected_panel: PanelId,
        selected_element: Option<crate::element::ElementId>,
        generating: &HashSet<PanelId>,
    ) {
        for panel in doc.panels() {
            let Some(screen_rect) = layout.screen_rect_of(panel.id) else {
                continue;
            };
            self.render_panel(
                painter,
                panel,
                screen_rect,
                panel.id == selected_panel,
                generating.contains(&panel.id),
            );

            for element in &panel.elements {
                // The hide-while-outside drag affordance.
                if element.hidden_while_dragging {
                    continue;
                }
                let Some(rect) = layout.to_screen(panel.id, element.rect()) else {
                    continue;
                };
                self.render_element(painter, element, rect, layout.zoom());
                if selected_element == Some(element.id) {
                    self.render_selection(painter, rect);
                }
            }
        }
    }

    fn render_panel(
        &self,
        painter: &Painter,
        panel: &Panel,
        rect: Rect,
        selected: bool,
        generating: bool,
    ) {
        painter.rect_filled(rect, 2.0, PANEL_FILL);
        let outline = if selected {
            Stroke::new(2.0, SELECTED_PANEL_OUTLINE)
        } else {
            Stroke::new(1.0, PANEL_OUTLINE)
        };
        painter.rect_stroke(rect, 2.0, outline);

        // Generated backgrounds are remote URLs; the shell draws a placeholder
        // caption rather than fetching them.
        if let Some(url) = &panel.image_url {
            painter.text(
                rect.left_bottom() + egui::vec2(4.0, -4.0),
                Align2::LEFT_BOTTOM,
                url,
                FontId::proportional(10.0),
                PANEL_OUTLINE,
            );
        }
        if generating {
            painter.text(
                rect.center(),
                Align2::CENTER_CENTER,
                "generating…",
                FontId::proportional(14.0),
                PANEL_OUTLINE,
            );
        }
    }

    fn render_element(&self, painter: &Painter, element: &Element, rect: Rect, zoom: f32) {
        match &element.kind {
            ElementKind::Text {
                content,
                font_size,
                color,
            } => {
                painter.text(
                    rect.left_top(),
                    Align2::LEFT_TOP,
                    content,
                    FontId::proportional(font_size * zoom),
                    parse_hex_color(color),
                );
            }
            ElementKind::Bubble {
                fill_color,
                stroke_color,
                stroke_width,
                ..
            } => {
                painter.rect_filled(rect, 8.0 * zoom, parse_hex_color(fill_color));
                painter.rect_stroke(
                    rect,
                    8.0 * zoom,
                    Stroke::new(stroke_width * zoom, parse_hex_color(stroke_color)),
                );
            }
        }
    }

    fn render_selection(&self, painter: &Painter, rect: Rect) {
        painter.rect_stroke(rect, 0.0, Stroke::new(1.5, SELECTION_OUTLINE));
        for handle in ResizeHandle::ALL {
            let anchor = handle.position_on(rect);
            painter.circle_filled(anchor, RESIZE_HANDLE_RADIUS * 0.5, HANDLE_FILL);
            painter.circle_stroke(
                anchor,
                RESIZE_HANDLE_RADIUS * 0.5,
                Stroke::new(1.0, Color32::WHITE),
            );
        }
    }
}
