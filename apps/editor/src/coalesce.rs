use std::time::{Duration, Instant};

/// Write-coalescing for attribute edits: a save becomes due once no edit has
/// arrived for `window`.
#[derive(Debug, Clone)]
pub struct SaveCoalescer {
    window: Duration,
    last_edit: Option<Instant>,
}

impl SaveCoalescer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_edit: None,
        }
    }

    /// Record an edit; restarts the quiet period.
    pub fn note_edit(&mut self, now: Instant) {
        self.last_edit = Some(now);
    }

    pub fn is_pending(&self) -> bool {
        self.last_edit.is_some()
    }

    pub fn is_due(&self, now: Instant) -> bool {
        match self.last_edit {
            Some(at) => now.saturating_duration_since(at) >= self.window,
            None => false,
        }
    }

    /// Clear the pending edit, returning whether there was one.
    pub fn take(&mut self) -> bool {
        self.last_edit.take().is_some()
    }
}
