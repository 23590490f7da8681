use log::debug;

/// Quiet period after the last committed change before a save is attempted.
pub const AUTOSAVE_DEBOUNCE_SECS: f64 = 8.0;

/// Debounced autosave scheduler.
///
/// Observes committed-state changes only; the session never marks it dirty for
/// draft-overlay intermediates. Time is injected (`now` in seconds) so the
/// debounce logic is deterministic under test.
#[derive(Debug)]
pub struct AutosaveScheduler {
    debounce_secs: f64,
    /// Time of the most recent committed change since the last save attempt.
    dirty_at: Option<f64>,
    has_unsaved_changes: bool,
}

impl AutosaveScheduler {
    pub fn new() -> Self {
        Self::with_debounce(AUTOSAVE_DEBOUNCE_SECS)
    }

    pub fn with_debounce(debounce_secs: f64) -> Self {
        Self {
            debounce_secs,
            dirty_at: None,
            has_unsaved_changes: false,
        }
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    /// Records a committed change. Each call restarts the quiet period.
    pub fn mark_dirty(&mut self, now: f64) {
        self.dirty_at = Some(now);
        self.has_unsaved_changes = true;
    }

    /// Whether the debounce window has elapsed and a save should be attempted.
    /// Always false while a gesture is active, so transient geometry is never
    /// persisted.
    pub fn should_flush(&self, now: f64, gesture_active: bool) -> bool {
        if gesture_active {
            return false;
        }
        match self.dirty_at {
            Some(dirty_at) => now - dirty_at >= self.debounce_secs,
            None => false,
        }
    }

    /// Report the outcome of a save attempt. On failure the unsaved flag stays
    /// set and the quiet period restarts, so the save is retried one debounce
    /// window later (or sooner, via an explicit save).
    pub fn save_finished(&mut self, success: bool, now: f64) {
        if success {
            self.dirty_at = None;
            self.has_unsaved_changes = false;
        } else {
            debug!("autosave failed, leaving unsaved-changes flag set");
            self.dirty_at = Some(now);
        }
    }
}

impl Default for AutosaveScheduler {
    fn default() -> Self {
        Self::new()
    }
}
