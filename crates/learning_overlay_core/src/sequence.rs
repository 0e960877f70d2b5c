//! Request sequencing for refreshes that may complete out of order.
//!
//! Every refresh takes a ticket before it starts fetching. When it finishes it may only
//! publish its result if no newer ticket has been issued in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: AtomicU64,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a ticket newer than every ticket issued before.
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Passes `value` through only while `ticket` is the newest one.
    pub fn accept<T>(&self, ticket: RequestTicket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tickets_increase() {
        let sequencer = RequestSequencer::new();
        let first = sequencer.issue();
        let second = sequencer.issue();
        assert!(second > first);
        assert_eq!(first.value(), 1);
    }

    #[test]
    fn superseded_result_is_discarded() {
        let sequencer = RequestSequencer::new();
        let older = sequencer.issue();
        let newer = sequencer.issue();

        // The newer request finishes first, then the older one lands late.
        assert_eq!(sequencer.accept(newer, "fresh"), Some("fresh"));
        assert_eq!(sequencer.accept(older, "stale"), None);
    }
}
