use log::debug;

use crate::document::Document;
use crate::history::BoundedHistory;

/// Transient working copy of the document used while a pointer gesture is in
/// progress.
///
/// Continuous pointer motion produces many intermediate frames; none of them
/// may land in the history. The overlay holds the frames instead and turns the
/// whole gesture into a single history entry on commit, or into nothing on
/// cancel. While a gesture is live, [`DraftOverlay::view`] is the one
/// authoritative accessor for what readers see.
#[derive(Debug, Default)]
pub struct DraftOverlay {
    /// The pre-gesture committed document, kept as the rollback target.
    base: Option<Document>,
    working: Option<Document>,
}

impl DraftOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.base.is_some()
    }

    /// Captures the pre-gesture state. Must be called once per gesture, before
    /// the first intermediate mutation; a stale overlay from a gesture that
    /// never tore down is discarded first.
    pub fn begin(&mut self, base: Document) {
        if self.base.is_some() {
            debug!("overlay: begin while active, discarding stale gesture");
        }
        self.base = Some(base);
        self.working = None;
    }

    /// Replaces the working copy shown to readers. May be called once per
    /// pointer-move; never touches the history.
    pub fn apply(&mut self, working: Document) {
        debug_assert!(self.base.is_some(), "apply outside an active gesture");
        self.working = Some(working);
    }

    /// The document readers observe: the working copy while present, the
    /// committed snapshot otherwise. Never a mix of the two.
    pub fn view<'a>(&'a self, committed: &'a Document) -> &'a Document {
        self.working.as_ref().unwrap_or(committed)
    }

    pub fn working(&self) -> Option<&Document> {
        self.working.as_ref()
    }

    /// Commits the gesture: strips ephemeral drag flags from the working copy
    /// and pushes it as one history entry. A gesture that produced no actual
    /// movement (no working copy) is a safe no-op that still tears down.
    pub fn commit(&mut self, history: &mut BoundedHistory) {
        let working = self.working.take();
        self.base = None;
        if let Some(doc) = working {
            history.push(doc);
        }
    }

    /// Discards the working copy; the committed state was never touched, so
    /// dropping the overlay restores exactly the captured base.
    pub fn cancel(&mut self) -> Option<Document> {
        self.working = None;
        self.base.take()
    }
}
