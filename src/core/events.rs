//! Fire-and-forget notifications.
//!
//! Events are delivered to every subscriber as they are pushed and are also
//! buffered until the owner drains them, the same way a tick returns its
//! events for the presentation layer to map.

use std::fmt;

type Listener<E> = Box<dyn FnMut(&E)>;

pub struct EventQueue<E> {
    pending: Vec<E>,
    listeners: Vec<Listener<E>>,
}

impl<E> Default for EventQueue<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: fmt::Debug> fmt::Debug for EventQueue<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventQueue")
            .field("pending", &self.pending)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl<E> EventQueue<E> {
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&E) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn push(&mut self, event: E) {
        for listener in &mut self.listeners {
            listener(&event);
        }
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<E> {
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_drain_empties_buffer() {
        let mut queue = EventQueue::new();
        queue.push(1);
        queue.push(2);
        assert_eq!(queue.drain(), vec![1, 2]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_every_subscriber_sees_event() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut queue = EventQueue::new();
        for id in 0..2 {
            let seen = Rc::clone(&seen);
            queue.subscribe(move |event: &&str| seen.borrow_mut().push((id, *event)));
        }
        queue.push("equipped");
        assert_eq!(*seen.borrow(), vec![(0, "equipped"), (1, "equipped")]);
        assert_eq!(queue.len(), 1);
    }
}
