#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Autosave system deciding when the session must be written back to storage.

use geocache_core::Event;

/// Pure system that watches world events for changes worth persisting.
#[derive(Debug, Default)]
pub struct Autosave {
    pending: bool,
}

impl Autosave {
    /// Creates a system with nothing pending.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events, returning `true` when a save is now due.
    ///
    /// Rejected collections leave nothing to persist and never mark a save.
    pub fn handle(&mut self, events: &[Event]) -> bool {
        if events.iter().any(mutates_session) {
            self.pending = true;
        }
        self.pending
    }

    /// Acknowledges that the session was written.
    pub fn mark_saved(&mut self) {
        self.pending = false;
    }

    /// Reports whether unsaved changes exist.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending
    }
}

fn mutates_session(event: &Event) -> bool {
    match event {
        Event::PlayerMoved { .. } | Event::CoinCollected { .. } => true,
        Event::CollectRejected { .. } => false,
    }
}
