use std::sync::{Arc, Mutex};

use cutstudio::document::CanvasRatio;
use cutstudio::element::{ElementDraft, ElementKind};
use cutstudio::input::CanvasLayout;
use cutstudio::persist::{PersistenceSink, SaveError, SavePayload};
use cutstudio::session::{
    GeneratedImage, GenerationError, GenerationRequest, ImageGenerator, StudioSession,
};
use egui::{Rect, pos2, vec2};

#[derive(Default)]
struct SinkState {
    saves: Vec<SavePayload>,
    fail: bool,
}

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<SinkState>>);

impl SharedSink {
    fn save_count(&self) -> usize {
        self.0.lock().unwrap().saves.len()
    }

    fn set_failing(&self, fail: bool) {
        self.0.lock().unwrap().fail = fail;
    }
}

impl PersistenceSink for SharedSink {
    fn save(&mut self, payload: &SavePayload) -> Result<(), SaveError> {
        let mut state = self.0.lock().unwrap();
        if state.fail {
            return Err(SaveError::Rejected("backend unavailable".to_owned()));
        }
        state.saves.push(payload.clone());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingGenerator(Arc<Mutex<Vec<GenerationRequest>>>);

impl ImageGenerator for RecordingGenerator {
    fn request(&mut self, request: GenerationRequest) -> Result<(), String> {
        self.0.lock().unwrap().push(request);
        Ok(())
    }
}

fn new_session(sink: &SharedSink, generator: Option<RecordingGenerator>) -> StudioSession {
    StudioSession::new(
        None,
        Box::new(sink.clone()),
        generator.map(|g| Box::new(g) as Box<dyn ImageGenerator>),
    )
}

#[test]
fn added_element_survives_undo_redo_round_trip() {
    let sink = SharedSink::default();
    let mut session = new_session(&sink, None);
    let p1 = session.document().first_panel_id();

    session.add_element(p1, ElementDraft::text("Hi", 20.0, 20.0), 0.0);
    assert_eq!(session.committed().panel(p1).unwrap().elements.len(), 1);

    assert!(session.undo(0.1));
    assert!(session.committed().panel(p1).unwrap().elements.is_empty());

    assert!(session.redo(0.2));
    let elements = &session.committed().panel(p1).unwrap().elements;
    assert_eq!(elements.len(), 1);
    match &elements[0].kind {
        ElementKind::Text { content, .. } => assert_eq!(content, "Hi"),
        other => panic!("expected text element, got {other:?}"),
    }
}

#[test]
fn deleting_the_last_panel_is_rejected() {
    let sink = SharedSink::default();
    let mut session = new_session(&sink, None);
    let p1 = session.document().first_panel_id();
    let p2 = session.document().panels()[1].id;
    session.select_panel(p2);

    assert!(session.delete_panel(p2, 0.0));
    // Selection fell back to the surviving panel.
    assert_eq!(session.selected_panel(), p1);

    assert!(!session.delete_panel(p1, 0.1));
    assert_eq!(session.committed().panels().len(), 1);
}

#[test]
fn autosave_waits_for_the_quiet_period() {
    let sink = SharedSink::default();
    let mut session = new_session(&sink, None);
    let p1 = session.document().first_panel_id();

    session.add_element(p1, ElementDraft::text("Hi", 20.0, 20.0), 0.0);
    assert!(session.has_unsaved_changes());

    session.tick(4.0);
    assert_eq!(sink.save_count(), 0);

    session.tick(9.0);
    assert_eq!(sink.save_count(), 1);
    assert!(!session.has_unsaved_changes());

    // No further changes, no further saves.
    session.tick(60.0);
    assert_eq!(sink.save_count(), 1);
}

#[test]
fn autosave_is_suppressed_while_a_gesture_is_active() {
    let sink = SharedSink::default();
    let mut session = new_session(&sink, None);
    let p1 = session.document().first_panel_id();
    session.add_element(p1, ElementDraft::text("Hi", 40.0, 40.0), 0.0);

    let mut layout = CanvasLayout::new(1.0);
    layout.push_panel(p1, Rect::from_min_size(pos2(0.0, 0.0), vec2(400.0, 500.0)));

    session.pointer_down(pos2(50.0, 50.0), &layout);
    session.pointer_move(pos2(100.0, 100.0), &layout, 1.0);
    assert!(session.is_gesturing());

    // Way past the debounce window, but a gesture is live: nothing may be
    // persisted with transient geometry in it.
    session.tick(4.9);
    assert_eq!(sink.save_count(), 0);

    session.pointer_up(4.95);
    session.tick(30.0);
    assert_eq!(sink.save_count(), 1);
}

#[test]
fn failed_autosave_retries_on_the_next_cycle() {
    let sink = SharedSink::default();
    sink.set_failing(true);
    let mut session = new_session(&sink, None);
    let p1 = session.document().first_panel_id();

    session.add_element(p1, ElementDraft::text("Hi", 20.0, 20.0), 0.0);
    session.tick(9.0);
    assert_eq!(sink.save_count(), 0);
    assert!(session.has_unsaved_changes());

    sink.set_failing(false);
    session.tick(18.0);
    assert_eq!(sink.save_count(), 1);
    assert!(!session.has_unsaved_changes());
}

#[test]
fn flush_on_exit_saves_pending_changes() {
    let sink = SharedSink::default();
    let mut session = new_session(&sink, None);
    let p1 = session.document().first_panel_id();

    session.add_element(p1, ElementDraft::text("Hi", 20.0, 20.0), 0.0);
    session.flush_on_exit();
    assert_eq!(sink.save_count(), 1);

    // Nothing dirty, nothing flushed.
    session.flush_on_exit();
    assert_eq!(sink.save_count(), 1);
}

#[test]
fn overlapping_generation_requests_are_rejected() {
    let sink = SharedSink::default();
    let generator = RecordingGenerator::default();
    let mut session = new_session(&sink, Some(generator.clone()));
    let p1 = session.document().first_panel_id();
    session.set_panel_prompt(p1, "a quiet rooftop at dusk".to_owned(), 0.0);
    session.set_selected_characters(vec!["char-1".to_owned()]);

    assert!(session.request_generation(p1).is_ok());
    assert!(matches!(
        session.request_generation(p1),
        Err(GenerationError::AlreadyGenerating)
    ));
    assert_eq!(generator.0.lock().unwrap().len(), 1);

    let request = generator.0.lock().unwrap()[0].clone();
    assert_eq!(request.prompt, "a quiet rooftop at dusk");
    assert_eq!(request.character_ids, vec!["char-1".to_owned()]);

    session.complete_generation(
        p1,
        Ok(GeneratedImage {
            image_url: "https://img.example/1.png".to_owned(),
            generation_id: "gen-1".to_owned(),
        }),
        1.0,
    );

    assert!(!session.is_panel_generating(p1));
    let panel = session.committed().panel(p1).unwrap();
    assert_eq!(panel.image_url.as_deref(), Some("https://img.example/1.png"));
    assert_eq!(panel.generation_id.as_deref(), Some("gen-1"));

    // The in-flight guard lifts once the first request resolves.
    assert!(session.request_generation(p1).is_ok());
}

#[test]
fn generation_guard_survives_other_edits() {
    let sink = SharedSink::default();
    let generator = RecordingGenerator::default();
    let mut session = new_session(&sink, Some(generator.clone()));
    let p1 = session.document().first_panel_id();

    assert!(session.request_generation(p1).is_ok());

    // Committed edits and undo while the request is outstanding must not
    // lift the guard.
    session.add_element(p1, ElementDraft::text("Hi", 20.0, 20.0), 0.0);
    assert!(matches!(
        session.request_generation(p1),
        Err(GenerationError::AlreadyGenerating)
    ));

    session.undo(0.1);
    assert!(matches!(
        session.request_generation(p1),
        Err(GenerationError::AlreadyGenerating)
    ));
    assert_eq!(generator.0.lock().unwrap().len(), 1);

    session.complete_generation(
        p1,
        Ok(GeneratedImage {
            image_url: "https://img.example/2.png".to_owned(),
            generation_id: "gen-2".to_owned(),
        }),
        1.0,
    );
    assert!(session.request_generation(p1).is_ok());
}

#[test]
fn generation_failure_surfaces_and_clears_the_flag() {
    let sink = SharedSink::default();
    let generator = RecordingGenerator::default();
    let mut session = new_session(&sink, Some(generator));
    let p1 = session.document().first_panel_id();

    assert!(session.request_generation(p1).is_ok());
    assert!(session.is_panel_generating(p1));
    session.complete_generation(p1, Err("model overloaded".to_owned()), 1.0);

    assert!(!session.is_panel_generating(p1));
    let panel = session.committed().panel(p1).unwrap();
    assert!(panel.image_url.is_none());
    assert_eq!(
        session.take_generation_error().as_deref(),
        Some("model overloaded")
    );
    assert!(session.take_generation_error().is_none());
}

#[test]
fn selection_changes_never_enter_history() {
    let sink = SharedSink::default();
    let mut session = new_session(&sink, None);
    let p2 = session.document().panels()[1].id;

    session.select_panel(p2);
    assert_eq!(session.selected_panel(), p2);
    assert!(!session.can_undo());
}

#[test]
fn payload_round_trips_through_the_wire_shape() {
    let sink = SharedSink::default();
    let mut session = new_session(&sink, None);
    let p1 = session.document().first_panel_id();
    session.add_element(p1, ElementDraft::text("Hi", 20.0, 20.0), 0.0);
    session.set_selected_characters(vec!["char-9".to_owned()]);
    session.set_title(Some("My webtoon".to_owned()));

    let payload = SavePayload::from_document(
        session.committed(),
        session.selected_character_ids(),
        session.title().map(str::to_owned),
    );
    let json = serde_json::to_string(&payload).unwrap();
    assert!(json.contains("\"editData\""));
    assert!(json.contains("\"canvasRatio\":\"4:5\""));
    assert!(json.contains("\"type\":\"text\""));
    assert!(json.contains("\"selectedCharacterIds\":[\"char-9\"]"));

    let restored: SavePayload = serde_json::from_str(&json).unwrap();
    let doc = restored.into_document(CanvasRatio::Portrait);
    assert_eq!(doc.panels().len(), 2);
    assert_eq!(doc.panel(p1).unwrap().elements.len(), 1);
}

#[test]
fn empty_payload_seeds_the_two_panel_default() {
    let payload = SavePayload {
        panels: Vec::new(),
        title: None,
    };
    let doc = payload.into_document(CanvasRatio::Widescreen);
    assert_eq!(doc.panels().len(), 2);
    assert_eq!(doc.canvas_ratio(), CanvasRatio::Widescreen);
}
