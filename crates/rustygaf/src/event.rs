//! Asynchronous outcome delivery
//!
//! Completions and indications are queued in order of production and drained by
//! the upper layer on its own task context.

use std::collections::VecDeque;

/// FIFO queue of events produced by a GAF component
#[derive(Debug, Clone)]
pub struct EventQueue<E> {
    events: VecDeque<E>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: E) {
        self.events.push_back(event);
    }

    /// Take the oldest pending event
    pub fn pop(&mut self) -> Option<E> {
        self.events.pop_front()
    }

    /// Take every pending event, oldest first
    pub fn drain(&mut self) -> Vec<E> {
        self.events.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
