//! Event Queue Module
//!
//! Provides a bounded, thread-safe FIFO channel for asynchronous event
//! delivery. Producers append from any thread; consumers drain in posting
//! order, independently of the producers' lifetime. The capacity is fixed
//! at construction and never grows.

use std::collections::VecDeque;
use std::sync::Mutex;

/// Bounded FIFO event queue
///
/// Generic over the event payload. All operations lock a single internal
/// mutex, so posting and draining are safe to interleave from multiple
/// threads; events are never reordered.
pub struct EventQueue<T> {
    entries: Mutex<VecDeque<T>>,
    capacity: usize,
}

impl<T> EventQueue<T> {
    /// Create a queue holding at most `capacity` undrained events
    ///
    /// # Arguments
    /// * `capacity` - Maximum number of pending events
    ///
    /// # Examples
    /// ```
    /// use infrastructure_events::EventQueue;
    ///
    /// let queue: EventQueue<u32> = EventQueue::with_capacity(16);
    /// assert_eq!(queue.capacity(), 16);
    /// assert!(queue.is_empty());
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Append an event to the queue
    ///
    /// # Arguments
    /// * `event` - Event to append
    ///
    /// # Returns
    /// * `true` - Event was appended
    /// * `false` - Queue is at capacity; the event was dropped
    ///
    /// # Examples
    /// ```
    /// use infrastructure_events::EventQueue;
    ///
    /// let queue = EventQueue::with_capacity(1);
    /// assert!(queue.post(1));
    /// assert!(!queue.post(2));
    /// ```
    pub fn post(&self, event: T) -> bool {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() >= self.capacity {
            return false;
        }
        entries.push_back(event);
        true
    }

    /// Pop the oldest pending event
    ///
    /// # Returns
    /// * `Some(event)` - Oldest event, removed from the queue
    /// * `None` - Queue is empty
    pub fn next(&self) -> Option<T> {
        let mut entries = self.entries.lock().unwrap();
        entries.pop_front()
    }

    /// Remove and return all pending events in posting order
    ///
    /// # Examples
    /// ```
    /// use infrastructure_events::EventQueue;
    ///
    /// let queue = EventQueue::with_capacity(8);
    /// queue.post("a");
    /// queue.post("b");
    /// assert_eq!(queue.drain(), vec!["a", "b"]);
    /// assert!(queue.is_empty());
    /// ```
    pub fn drain(&self) -> Vec<T> {
        let mut entries = self.entries.lock().unwrap();
        entries.drain(..).collect()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries.len()
    }

    /// Check if no events are pending
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The capacity fixed at construction
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_post_and_next_fifo_order() {
        let queue = EventQueue::with_capacity(8);
        assert!(queue.post(1));
        assert!(queue.post(2));
        assert!(queue.post(3));

        assert_eq!(queue.next(), Some(1));
        assert_eq!(queue.next(), Some(2));
        assert_eq!(queue.next(), Some(3));
        assert_eq!(queue.next(), None);
    }

    #[test]
    fn test_capacity_bound() {
        let queue = EventQueue::with_capacity(2);
        assert!(queue.post("a"));
        assert!(queue.post("b"));
        assert!(!queue.post("c"));
        assert_eq!(queue.len(), 2);

        // Draining frees capacity again
        queue.next();
        assert!(queue.post("c"));
    }

    #[test]
    fn test_drain_empties_queue() {
        let queue = EventQueue::with_capacity(4);
        queue.post(10);
        queue.post(20);

        let drained = queue.drain();
        assert_eq!(drained, vec![10, 20]);
        assert!(queue.is_empty());
        assert_eq!(queue.drain(), Vec::<i32>::new());
    }

    #[test]
    fn test_zero_capacity_rejects_everything() {
        let queue = EventQueue::with_capacity(0);
        assert!(!queue.post(1));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_post() {
        let queue = Arc::new(EventQueue::with_capacity(1000));
        let mut threads = vec![];

        for i in 0..10 {
            let queue_clone = Arc::clone(&queue);
            threads.push(thread::spawn(move || {
                for j in 0..100 {
                    assert!(queue_clone.post(i * 100 + j));
                }
            }));
        }

        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(queue.len(), 1000);
        // Full now
        assert!(!queue.post(-1));
    }

    #[test]
    fn test_producer_consumer_threads() {
        let queue = Arc::new(EventQueue::with_capacity(256));
        let producer_queue = Arc::clone(&queue);

        let producer = thread::spawn(move || {
            for i in 0..100 {
                while !producer_queue.post(i) {
                    thread::yield_now();
                }
            }
        });

        let mut received = Vec::new();
        while received.len() < 100 {
            if let Some(event) = queue.next() {
                received.push(event);
            } else {
                thread::yield_now();
            }
        }

        producer.join().unwrap();
        // Single producer: FIFO order is observable end to end
        let expected: Vec<i32> = (0..100).collect();
        assert_eq!(received, expected);
    }
}
