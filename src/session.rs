use std::collections::HashSet;

use egui::Pos2;
use log::{debug, info, warn};
use thiserror::Error;

use crate::autosave::AutosaveScheduler;
use crate::document::{CanvasRatio, Document, ElementPatch, ReorderDirection};
use crate::element::{ElementDraft, ElementId};
use crate::history::BoundedHistory;
use crate::input::{CanvasLayout, PointerController, PointerHit};
use crate::overlay::DraftOverlay;
use crate::panel::PanelId;
use crate::persist::{PersistenceSink, SavePayload};

/// Request handed to the external image-generation collaborator.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub panel_id: PanelId,
    pub prompt: String,
    pub aspect_ratio: CanvasRatio,
    pub character_ids: Vec<String>,
}

/// Result of a completed generation, merged into the addressed panel.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub image_url: String,
    pub generation_id: String,
}

/// External image-generation collaborator. `request` is fire-and-forget; the
/// completion arrives later via [`StudioSession::complete_generation`].
pub trait ImageGenerator {
    fn request(&mut self, request: GenerationRequest) -> Result<(), String>;
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("panel not found")]
    UnknownPanel,

    #[error("a generation for this panel is already in flight")]
    AlreadyGenerating,

    #[error("no image generator configured")]
    NoGenerator,

    #[error("generation request failed: {0}")]
    Collaborator(String),
}

/// One editing session over a document: the single mutation entry point.
///
/// Owns the history store, the draft overlay, the pointer controller, the
/// autosave scheduler, and the transient selection. External collaborators
/// (persistence, image generation) are constructor-injected; the session
/// never reaches for ambient singletons.
pub struct StudioSession {
    history: BoundedHistory,
    overlay: DraftOverlay,
    controller: PointerController,
    autosave: AutosaveScheduler,

    selected_panel: PanelId,
    selected_element: Option<ElementId>,
    selected_character_ids: Vec<String>,
    title: Option<String>,

    sink: Box<dyn PersistenceSink>,
    generator: Option<Box<dyn ImageGenerator>>,
    /// Panels with an outstanding generation request. Session state rather than
    /// a document flag: snapshots are sanitized on every push, so a marker
    /// stored there would not survive an unrelated committed edit.
    generating: HashSet<PanelId>,
    /// Last generation failure, held until the shell collects it for display.
    generation_error: Option<String>,
}

impl StudioSession {
    /// Starts a session from persisted state, or from the two-panel default
    /// when no payload is supplied.
    pub fn new(
        initial: Option<SavePayload>,
        sink: Box<dyn PersistenceSink>,
        generator: Option<Box<dyn ImageGenerator>>,
    ) -> Self {
        let (document, title) = match initial {
            Some(payload) => {
                let title = payload.title.clone();
                (payload.into_document(CanvasRatio::default()), title)
            }
            None => (Document::new(CanvasRatio::default()), None),
        };
        let selected_panel = document.first_panel_id();
        info!(
            "session started: {} panels, ratio {}",
            document.panels().len(),
            document.canvas_ratio().as_str()
        );
        Self {
            history: BoundedHistory::new(document),
            overlay: DraftOverlay::new(),
            controller: PointerController::new(),
            autosave: AutosaveScheduler::new(),
            selected_panel,
            selected_element: None,
            selected_character_ids: Vec::new(),
            title,
            sink,
            generator,
            generating: HashSet::new(),
            generation_error: None,
        }
    }

    // ----- read access ------------------------------------------------------

    /// The document readers should render: the draft working copy during a
    /// gesture, the committed snapshot otherwise.
    pub fn document(&self) -> &Document {
        self.overlay.view(self.history.current())
    }

    /// The committed snapshot, ignoring any in-progress gesture.
    pub fn committed(&self) -> &Document {
        self.history.current()
    }

    pub fn selected_panel(&self) -> PanelId {
        self.selected_panel
    }

    pub fn selected_element(&self) -> Option<ElementId> {
        self.selected_element
    }

    pub fn selected_character_ids(&self) -> &[String] {
        &self.selected_character_ids
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn is_gesturing(&self) -> bool {
        self.controller.is_gesturing()
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.autosave.has_unsaved_changes()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Whether a generation request for this panel is still outstanding.
    pub fn is_panel_generating(&self, id: PanelId) -> bool {
        self.generating.contains(&id)
    }

    pub fn generating_panels(&self) -> &HashSet<PanelId> {
        &self.generating
    }

    /// Collects the last generation failure for user display, clearing it.
    pub fn take_generation_error(&mut self) -> Option<String> {
        self.generation_error.take()
    }

    // ----- selection (never undoable) ---------------------------------------

    /// Moves panel focus. Selection changes bypass the history entirely.
    pub fn select_panel(&mut self, id: PanelId) {
        if self.document().panel(id).is_some() {
            self.selected_panel = id;
        }
    }

    pub fn select_element(&mut self, id: ElementId) {
        if let Some(owner) = self.document().owner_of(id) {
            self.selected_panel = owner;
            self.selected_element = Some(id);
        }
    }

    pub fn clear_element_selection(&mut self) {
        self.selected_element = None;
    }

    /// Character selection feeds the generation requests and the persisted
    /// payload; it is session state, not document state.
    pub fn set_selected_characters(&mut self, ids: Vec<String>) {
        self.selected_character_ids = ids;
    }

    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    /// Re-points selection at existing targets after any committed change:
    /// a deleted selected panel falls back to the first remaining one, a
    /// vanished selected element clears.
    fn fix_selection(&mut self) {
        let doc = self.overlay.view(self.history.current());
        let first = doc.first_panel_id();
        if doc.panel(self.selected_panel).is_none() {
            self.selected_panel = first;
        }
        if let Some(element) = self.selected_element {
            if doc.owner_of(element).is_none() {
                self.selected_element = None;
            }
        }
        // An in-flight marker for a deleted panel has nothing left to guard.
        self.generating.retain(|id| doc.panel(*id).is_some());
    }

    // ----- committed model operations ---------------------------------------

    /// Clones the committed state, applies `mutate`, and pushes the result as
    /// one history entry when it reports a change.
    fn commit_change(&mut self, now: f64, mutate: impl FnOnce(&mut Document) -> bool) -> bool {
        let mut next = self.history.current().clone();
        if !mutate(&mut next) {
            return false;
        }
        self.history.push(next);
        self.autosave.mark_dirty(now);
        self.fix_selection();
        true
    }

    /// Appends a new empty panel and selects it.
    pub fn add_panel(&mut self, now: f64) -> PanelId {
        let mut created = None;
        self.commit_change(now, |doc| {
            created = Some(doc.add_panel());
            true
        });
        let id = created.expect("add_panel always mutates");
        self.selected_panel = id;
        id
    }

    /// Removes a panel; rejected when it is the last one. If the removed panel
    /// was selected, selection falls back to the first remaining panel.
    pub fn delete_panel(&mut self, id: PanelId, now: f64) -> bool {
        self.commit_change(now, |doc| doc.delete_panel(id))
    }

    pub fn reorder_panel(&mut self, id: PanelId, direction: ReorderDirection, now: f64) -> bool {
        self.commit_change(now, |doc| doc.reorder_panel(id, direction))
    }

    /// Adds an element to a panel and selects it. Silent no-op on an unknown
    /// panel or an invalid draft.
    pub fn add_element(
        &mut self,
        panel_id: PanelId,
        draft: ElementDraft,
        now: f64,
    ) -> Option<ElementId> {
        let mut created = None;
        self.commit_change(now, |doc| {
            created = doc.add_element(panel_id, draft);
            created.is_some()
        });
        if let Some(id) = created {
            self.selected_panel = panel_id;
            self.selected_element = Some(id);
        }
        created
    }

    pub fn delete_element(&mut self, id: ElementId, now: f64) -> bool {
        self.commit_change(now, |doc| doc.delete_element(id))
    }

    pub fn update_element(&mut self, id: ElementId, patch: ElementPatch, now: f64) -> bool {
        self.commit_change(now, |doc| doc.update_element(id, patch))
    }

    /// Replaces a panel's generation prompt. One history entry per call; the
    /// shell is expected to call this on edit completion, not per keystroke.
    pub fn set_panel_prompt(&mut self, id: PanelId, prompt: String, now: f64) -> bool {
        self.commit_change(now, |doc| match doc.panel_mut(id) {
            Some(panel) if panel.prompt != prompt => {
                panel.prompt = prompt;
                true
            }
            _ => false,
        })
    }

    /// Switches the document-wide aspect ratio as one committed change.
    pub fn set_canvas_ratio(&mut self, ratio: CanvasRatio, now: f64) -> bool {
        self.commit_change(now, |doc| doc.set_canvas_ratio(ratio))
    }

    pub fn undo(&mut self, now: f64) -> bool {
        if self.overlay.is_active() {
            return false;
        }
        if self.history.undo().is_none() {
            return false;
        }
        self.autosave.mark_dirty(now);
        self.fix_selection();
        true
    }

    pub fn redo(&mut self, now: f64) -> bool {
        if self.overlay.is_active() {
            return false;
        }
        if self.history.redo().is_none() {
            return false;
        }
        self.autosave.mark_dirty(now);
        self.fix_selection();
        true
    }

    // ----- pointer gestures -------------------------------------------------

    pub fn pointer_down(&mut self, screen_pos: Pos2, layout: &CanvasLayout) {
        let hit = self.controller.pointer_down(
            screen_pos,
            layout,
            self.overlay.view(self.history.current()),
            self.selected_element,
        );
        match hit {
            PointerHit::Nothing => {}
            PointerHit::Panel(panel) => {
                self.selected_panel = panel;
                self.selected_element = None;
            }
            PointerHit::Element { panel, element } => {
                self.selected_panel = panel;
                self.selected_element = Some(element);
            }
            PointerHit::Handle { .. } => {}
        }
    }

    pub fn pointer_move(&mut self, screen_pos: Pos2, layout: &CanvasLayout, now: f64) {
        let effect = self.controller.pointer_move(
            screen_pos,
            layout,
            &mut self.overlay,
            &mut self.history,
            now,
        );
        if let Some(panel) = effect.select_panel {
            self.selected_panel = panel;
        }
        if effect.committed {
            self.autosave.mark_dirty(now);
            self.fix_selection();
        }
    }

    pub fn pointer_up(&mut self, now: f64) {
        if self.controller.pointer_up(&mut self.overlay, &mut self.history) {
            self.autosave.mark_dirty(now);
            self.fix_selection();
        }
    }

    /// Escape: discard the in-progress gesture, restoring pre-gesture state.
    pub fn cancel_gesture(&mut self) {
        self.controller.cancel(&mut self.overlay);
        self.fix_selection();
    }

    // ----- image generation -------------------------------------------------

    /// Kicks off background generation for a panel. Rejected while a request
    /// for the same panel is in flight, no matter what gets committed or
    /// undone in the meantime.
    pub fn request_generation(&mut self, panel_id: PanelId) -> Result<(), GenerationError> {
        if self.generating.contains(&panel_id) {
            return Err(GenerationError::AlreadyGenerating);
        }
        let request = {
            let doc = self.history.current();
            let panel = doc.panel(panel_id).ok_or(GenerationError::UnknownPanel)?;
            GenerationRequest {
                panel_id,
                prompt: panel.prompt.clone(),
                aspect_ratio: doc.canvas_ratio(),
                character_ids: self.selected_character_ids.clone(),
            }
        };
        let generator = self.generator.as_mut().ok_or(GenerationError::NoGenerator)?;

        self.generating.insert(panel_id);
        match generator.request(request) {
            Ok(()) => {
                debug!("generation requested for panel {panel_id}");
                Ok(())
            }
            Err(message) => {
                self.generating.remove(&panel_id);
                warn!("generation request for panel {panel_id} failed: {message}");
                self.generation_error = Some(message.clone());
                Err(GenerationError::Collaborator(message))
            }
        }
    }

    /// Delivers a generation completion. A success merges the result into the
    /// panel as one committed change; a failure lifts the in-flight guard and
    /// surfaces the message for user display. Unknown panels (deleted while
    /// the request was outstanding) are ignored.
    pub fn complete_generation(
        &mut self,
        panel_id: PanelId,
        result: Result<GeneratedImage, String>,
        now: f64,
    ) {
        self.generating.remove(&panel_id);
        if self.history.current().panel(panel_id).is_none() {
            debug!("generation completed for vanished panel {panel_id}, dropping");
            return;
        }
        match result {
            Ok(image) => {
                self.commit_change(now, |doc| match doc.panel_mut(panel_id) {
                    Some(panel) => {
                        panel.set_generation_result(image.image_url, image.generation_id);
                        true
                    }
                    None => false,
                });
            }
            Err(message) => {
                warn!("generation for panel {panel_id} failed: {message}");
                self.generation_error = Some(message);
            }
        }
    }

    // ----- persistence ------------------------------------------------------

    /// Explicit save. Failures are logged and leave the unsaved flag set so a
    /// later cycle retries; the in-memory document is never touched.
    pub fn save_now(&mut self, now: f64) -> bool {
        let payload = SavePayload::from_document(
            self.history.current(),
            &self.selected_character_ids,
            self.title.clone(),
        );
        match self.sink.save(&payload) {
            Ok(()) => {
                debug!("saved {} panels", payload.panels.len());
                self.autosave.save_finished(true, now);
                true
            }
            Err(err) => {
                warn!("save failed: {err}");
                self.autosave.save_finished(false, now);
                false
            }
        }
    }

    /// Best-effort flush for page-unload/shutdown. Allowed to fail silently
    /// beyond a log entry.
    pub fn flush_on_exit(&mut self) {
        if self.autosave.has_unsaved_changes() {
            info!("flushing unsaved changes on exit");
            self.save_now(f64::MAX);
        }
    }

    /// Frame tick: drives the gesture liveness timeout and the autosave
    /// debounce. `now` is monotonic seconds supplied by the shell.
    pub fn tick(&mut self, now: f64) {
        if self
            .controller
            .tick(now, &mut self.overlay, &mut self.history)
        {
            self.autosave.mark_dirty(now);
            self.fix_selection();
        }
        if self.autosave.should_flush(now, self.overlay.is_active()) {
            self.save_now(now);
        }
    }
}
