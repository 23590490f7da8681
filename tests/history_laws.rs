use cutstudio::document::{CanvasRatio, Document};
use cutstudio::element::ElementDraft;
use cutstudio::history::BoundedHistory;

// Builds a document whose first panel's prompt encodes a marker, so snapshots
// are distinguishable.
fn doc_with_marker(marker: &str) -> Document {
    let mut doc = Document::new(CanvasRatio::Portrait);
    doc.panel_mut(doc.first_panel_id()).unwrap().prompt = marker.to_owned();
    doc
}

fn marker_of(doc: &Document) -> &str {
    &doc.panels()[0].prompt
}

#[test]
fn undo_and_redo_walk_the_log() {
    let mut history = BoundedHistory::new(doc_with_marker("a"));
    history.push(doc_with_marker("b"));
    history.push(doc_with_marker("c"));

    assert_eq!(marker_of(history.current()), "c");
    assert_eq!(marker_of(history.undo().unwrap()), "b");
    assert_eq!(marker_of(history.undo().unwrap()), "a");
    assert!(history.undo().is_none());
    assert!(!history.can_undo());

    assert_eq!(marker_of(history.redo().unwrap()), "b");
    assert_eq!(marker_of(history.redo().unwrap()), "c");
    assert!(history.redo().is_none());
    assert!(!history.can_redo());
}

#[test]
fn push_after_undo_discards_the_future() {
    let mut history = BoundedHistory::new(doc_with_marker("base"));
    history.push(doc_with_marker("a"));
    history.push(doc_with_marker("b"));
    history.undo();

    history.push(doc_with_marker("c"));

    // The branch containing "b" is gone for good.
    assert!(!history.can_redo());
    assert!(history.redo().is_none());
    assert_eq!(marker_of(history.current()), "c");
    assert_eq!(marker_of(history.undo().unwrap()), "a");
}

#[test]
fn capacity_evicts_oldest_entries() {
    let capacity = 5;
    let mut history = BoundedHistory::with_capacity(doc_with_marker("0"), capacity);
    for i in 1..=10 {
        history.push(doc_with_marker(&i.to_string()));
    }

    // Exactly `capacity` states reachable, counting the current one.
    let mut reachable = 1;
    while history.undo().is_some() {
        reachable += 1;
    }
    assert_eq!(reachable, capacity);

    // The oldest surviving entry is the one pushed `capacity - 1` steps back.
    assert_eq!(marker_of(history.current()), "6");
}

#[test]
fn snapshots_are_sanitized_on_push() {
    let mut doc = doc_with_marker("dirty");
    let panel_id = doc.first_panel_id();
    let id = doc
        .add_element(panel_id, ElementDraft::text("Hi", 10.0, 10.0))
        .unwrap();
    doc.panel_mut(panel_id)
        .unwrap()
        .element_mut(id)
        .unwrap()
        .hidden_while_dragging = true;

    let mut history = BoundedHistory::new(doc_with_marker("base"));
    history.push(doc);

    assert!(!history.current().panels()[0].elements[0].hidden_while_dragging);
}
