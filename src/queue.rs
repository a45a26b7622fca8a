/// Deferred event queue - capture instrument input now, handle it later
///
/// A bounded single-producer/single-consumer ring. Both ends are wait-free
/// and the storage is allocated once, when the queue is built.
use rtrb::{Consumer, Producer, RingBuffer};

use crate::error::{Error, Result};
use crate::midi::MidiEvent;

pub struct DeferredQueue {
    producer: Producer<MidiEvent>,
    consumer: Consumer<MidiEvent>,
}

impl DeferredQueue {
    pub fn new(capacity: usize) -> Self {
        let (producer, consumer) = RingBuffer::new(capacity);
        Self { producer, consumer }
    }

    /// Fails with [Error::QueueOverflow] when full; the queue is unchanged.
    pub fn push(&mut self, event: MidiEvent) -> Result<()> {
        self.producer
            .push(event)
            .map_err(|_| Error::QueueOverflow)
    }

    /// Pops until empty, handing each event to `f`. Returns how many were
    /// drained.
    pub fn drain<F: FnMut(MidiEvent)>(&mut self, mut f: F) -> usize {
        let mut drained = 0;
        while let Ok(event) = self.consumer.pop() {
            f(event);
            drained += 1;
        }
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cc(value: u8) -> MidiEvent {
        MidiEvent::message(0xB0, 7, value)
    }

    fn drained(queue: &mut DeferredQueue) -> Vec<MidiEvent> {
        let mut seen = Vec::new();
        queue.drain(|e| seen.push(e));
        seen
    }

    #[test]
    fn test_drain_in_arrival_order() {
        let mut queue = DeferredQueue::new(4);
        queue.push(cc(1)).unwrap();
        queue.push(cc(2)).unwrap();
        assert_eq!(drained(&mut queue), vec![cc(1), cc(2)]);
        assert_eq!(queue.drain(|_| {}), 0);
    }

    #[test]
    fn test_overflow_is_reported_and_harmless() {
        let mut queue = DeferredQueue::new(2);
        queue.push(cc(1)).unwrap();
        queue.push(cc(2)).unwrap();
        assert_eq!(queue.push(cc(3)), Err(Error::QueueOverflow));
        assert_eq!(drained(&mut queue), vec![cc(1), cc(2)]);

        // Space is reusable after draining.
        queue.push(cc(4)).unwrap();
        assert_eq!(drained(&mut queue), vec![cc(4)]);
    }

    #[test]
    fn test_holds_exactly_its_capacity() {
        let mut queue = DeferredQueue::new(64);
        for value in 0..64 {
            queue.push(cc(value)).unwrap();
        }
        assert_eq!(queue.push(cc(64)), Err(Error::QueueOverflow));
        assert_eq!(queue.drain(|_| {}), 64);
    }
}
