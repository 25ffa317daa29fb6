use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default minimum spacing between accepted reply requests.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1200);

/// Rejects triggers arriving within `window` of the last accepted one.
///
/// The check and the timestamp update happen under one lock, which is
/// released before the caller does any work.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last: Mutex<Option<Instant>>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last: Mutex::new(None),
        }
    }

    /// Accept a trigger that happened at `at`.
    ///
    /// Returns `false` when `at` falls inside the cooldown of the previous
    /// accepted trigger. Triggers stamped before the last accepted one are
    /// treated as duplicates.
    pub fn try_enter(&self, at: Instant) -> bool {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(prev) = *last {
            if at.saturating_duration_since(prev) < self.window {
                return false;
            }
        }
        *last = Some(at);
        true
    }
}
