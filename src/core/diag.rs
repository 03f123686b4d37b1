//! Diagnostic sink with savepoints.
//!
//! DTLS silently ignores bad packets, and the backends invoked while
//! processing one (cipher, MAC) may record diagnostic events before the
//! record is known to be junk. The sink supports a savepoint protocol: the
//! pipeline takes a [`Savepoint`] before invoking the cipher and rewinds to
//! it on every silent-drop path, so forged records leave the caller-visible
//! queue exactly as it was. Events recorded during a successful decryption
//! are kept (the savepoint is simply dropped).

/// A single diagnostic event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The subsystem that recorded the event.
    pub origin: &'static str,
    /// What happened.
    pub message: &'static str,
}

/// Position in the event queue to rewind to.
#[derive(Debug, Clone, Copy)]
#[must_use]
pub struct Savepoint(usize);

/// Ordered queue of diagnostic events owned by one record layer.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    events: Vec<Diagnostic>,
}

impl DiagnosticSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event.
    pub fn record(&mut self, origin: &'static str, message: &'static str) {
        self.events.push(Diagnostic { origin, message });
    }

    /// Take a savepoint at the current queue position.
    pub fn mark(&self) -> Savepoint {
        Savepoint(self.events.len())
    }

    /// Discard every event recorded since the savepoint.
    pub fn pop_to_mark(&mut self, mark: Savepoint) {
        self.events.truncate(mark.0);
    }

    /// Events currently in the queue.
    pub fn events(&self) -> &[Diagnostic] {
        &self.events
    }

    /// True if no events are queued.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Remove and return all queued events.
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewind_discards_marked_events() {
        let mut sink = DiagnosticSink::new();
        sink.record("layer", "kept");

        let mark = sink.mark();
        sink.record("cipher", "quarantined");
        sink.record("cipher", "also quarantined");
        sink.pop_to_mark(mark);

        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.events()[0].message, "kept");
    }

    #[test]
    fn test_dropped_savepoint_keeps_events() {
        let mut sink = DiagnosticSink::new();
        let _mark = sink.mark();
        sink.record("cipher", "survives");
        assert_eq!(sink.events().len(), 1);
    }

    #[test]
    fn test_drain_empties_sink() {
        let mut sink = DiagnosticSink::new();
        sink.record("layer", "one");
        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert!(sink.is_empty());
    }
}
