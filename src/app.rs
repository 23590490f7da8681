use egui::{Key, Rect, Sense, vec2};
use log::info;

use crate::document::{CanvasRatio, ReorderDirection};
use crate::element::ElementDraft;
use crate::input::CanvasLayout;
use crate::renderer::Renderer;
use crate::session::StudioSession;

const PANEL_GAP: f32 = 24.0;

/// Native shell around a [`StudioSession`]: lays the panels out vertically,
/// forwards pointer and keyboard input, and ticks the session every frame.
pub struct StudioApp {
    session: StudioSession,
    renderer: Renderer,
    zoom: f32,
}

impl StudioApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, session: StudioSession) -> Self {
        Self {
            session,
            renderer: Renderer::new(),
            zoom: 0.6,
        }
    }

    /// Screen rect for each panel this frame: a vertical strip of canvases.
    fn build_layout(&self, origin: egui::Pos2) -> CanvasLayout {
        let mut layout = CanvasLayout::new(self.zoom);
        let canvas = self.session.document().canvas_size() * self.zoom;
        let mut cursor = origin;
        for panel in self.session.document().panels() {
            layout.push_panel(panel.id, Rect::from_min_size(cursor, canvas));
            cursor.y += canvas.y + PANEL_GAP;
        }
        layout
    }

    fn toolbar(&mut self, ui: &mut egui::Ui, now: f64) {
        ui.horizontal(|ui| {
            if ui.button("Add panel").clicked() {
                self.session.add_panel(now);
            }
            let selected = self.session.selected_panel();
            if ui.button("Add text").clicked() {
                self.session
                    .add_element(selected, ElementDraft::text("New text", 40.0, 40.0), now);
            }
            if ui.button("Add bubble").clicked() {
                self.session
                    .add_element(selected, ElementDraft::bubble("round-01", 60.0, 60.0), now);
            }
            if ui.button("Delete panel").clicked() {
                self.session.delete_panel(selected, now);
            }
            if ui.button("▲").clicked() {
                self.session
                    .reorder_panel(selected, ReorderDirection::Up, now);
            }
            if ui.button("▼").clicked() {
                self.session
                    .reorder_panel(selected, ReorderDirection::Down, now);
            }
            ui.separator();
            ui.add_enabled_ui(self.session.can_undo(), |ui| {
                if ui.button("Undo").clicked() {
                    self.session.undo(now);
                }
            });
            ui.add_enabled_ui(self.session.can_redo(), |ui| {
                if ui.button("Redo").clicked() {
                    self.session.redo(now);
                }
            });
            ui.separator();
            for ratio in [
                CanvasRatio::Portrait,
                CanvasRatio::Square,
                CanvasRatio::Widescreen,
            ] {
                let active = self.session.document().canvas_ratio() == ratio;
                if ui.selectable_label(active, ratio.as_str()).clicked() {
                    self.session.set_canvas_ratio(ratio, now);
                }
            }
            ui.separator();
            ui.add(egui::Slider::new(&mut self.zoom, 0.2..=2.0).text("zoom"));
            if ui.button("Save").clicked() {
                self.session.save_now(now);
            }
            if self.session.has_unsaved_changes() {
                ui.label("●");
            }
        });
    }

    fn handle_pointer(&mut self, ui: &egui::Ui, response: &egui::Response, layout: &CanvasLayout, now: f64) {
        let pointer_pos = response.interact_pointer_pos();
        if response.drag_started() {
            if let Some(pos) = pointer_pos {
                self.session.pointer_down(pos, layout);
            }
        }
        if response.dragged() {
            if let Some(pos) = pointer_pos {
                self.session.pointer_move(pos, layout, now);
            }
        }
        if response.drag_stopped() || response.clicked() {
            if response.clicked() {
                if let Some(pos) = pointer_pos {
                    self.session.pointer_down(pos, layout);
                }
            }
            self.session.pointer_up(now);
        }
        if ui.input(|i| i.key_pressed(Key::Escape)) {
            self.session.cancel_gesture();
        }
    }
}

impl eframe::App for StudioApp {
    /// Called by the framework before shutdown; best-effort final flush.
    fn save(&mut self, _storage: &mut dyn eframe::Storage) {
        self.session.flush_on_exit();
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = ctx.input(|i| i.time);

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.toolbar(ui, now);
        });

        egui::SidePanel::right("prompt").show(ctx, |ui| {
            ui.heading("Prompt");
            let selected = self.session.selected_panel();
            let mut prompt = self
                .session
                .document()
                .panel(selected)
                .map(|p| p.prompt.clone())
                .unwrap_or_default();
            let edit = ui.text_edit_multiline(&mut prompt);
            if edit.lost_focus() {
                self.session.set_panel_prompt(selected, prompt, now);
            }
            if ui.button("Generate").clicked() {
                if let Err(err) = self.session.request_generation(selected) {
                    info!("generation not started: {err}");
                }
            }
            if let Some(message) = self.session.take_generation_error() {
                // Surfaced once; a real shell would show a modal here.
                ui.colored_label(egui::Color32::RED, message);
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let canvas = self.session.document().canvas_size() * self.zoom;
                let panel_count = self.session.document().panels().len() as f32;
                let content = vec2(
                    canvas.x,
                    panel_count * (canvas.y + PANEL_GAP),
                );
                let (response, painter) =
                    ui.allocate_painter(content.max(ui.available_size()), Sense::click_and_drag());

                let layout = self.build_layout(response.rect.min + vec2(8.0, 8.0));
                self.handle_pointer(ui, &response, &layout, now);

                self.renderer.render(
                    &painter,
                    self.session.document(),
                    &layout,
                    self.session.selected_panel(),
                    self.session.selected_element(),
                    self.session.generating_panels(),
                );
            });
        });

        self.session.tick(now);

        // Keep ticking while a gesture or pending autosave needs the clock.
        if self.session.is_gesturing() || self.session.has_unsaved_changes() {
            ctx.request_repaint_after(std::time::Duration::from_millis(250));
        }
    }
}
