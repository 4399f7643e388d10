pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// Clock-driven trailing-edge debouncer (e.g. for a search box feeding a list).
///
/// Like the windower's scrolling reset, time is supplied by the caller as `now_ms`, so the
/// debouncer never owns a timer. Only the latest pushed value survives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Debouncer<T> {
    delay_ms: u64,
    pending: Option<T>,
    deadline_ms: Option<u64>,
}

impl<T> Debouncer<T> {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay_ms,
            pending: None,
            deadline_ms: None,
        }
    }

    pub fn delay_ms(&self) -> u64 {
        self.delay_ms
    }

    pub fn set_delay_ms(&mut self, delay_ms: u64) {
        self.delay_ms = delay_ms;
    }

    /// Replaces the pending value and restarts the quiet period.
    pub fn push(&mut self, value: T, now_ms: u64) {
        self.pending = Some(value);
        self.deadline_ms = Some(now_ms.saturating_add(self.delay_ms));
    }

    /// Returns the pending value once the quiet period has elapsed.
    pub fn poll(&mut self, now_ms: u64) -> Option<T> {
        let deadline = self.deadline_ms?;
        if now_ms < deadline {
            return None;
        }
        self.deadline_ms = None;
        self.pending.take()
    }

    /// Emits the pending value immediately.
    pub fn flush(&mut self) -> Option<T> {
        self.deadline_ms = None;
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        self.deadline_ms = None;
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline_ms(&self) -> Option<u64> {
        self.deadline_ms
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_MS)
    }
}
