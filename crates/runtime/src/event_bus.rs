/// An emitted event and its position in the bus's emission order.
#[derive(Debug, Clone, PartialEq)]
pub struct Event<E> {
    pub sequence: u64,
    pub payload: E,
}

/// Ordered, single-consumer event queue.
///
/// Producers `emit` payloads; the owning layer drains them in emission order.
/// Sequence numbers keep increasing across drains so consumers can merge
/// events from several buses deterministically.
#[derive(Debug)]
pub struct EventBus<E> {
    next_sequence: u64,
    events: Vec<Event<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            next_sequence: 0,
            events: Vec::new(),
        }
    }

    pub fn emit(&mut self, payload: E) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.events.push(Event { sequence, payload });
        sequence
    }

    pub fn events(&self) -> &[Event<E>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn drain(&mut self) -> Vec<Event<E>> {
        std::mem::take(&mut self.events)
    }

    /// Drains and drops sequence numbers.
    pub fn drain_payloads(&mut self) -> Vec<E> {
        self.drain().into_iter().map(|e| e.payload).collect()
    }
}
