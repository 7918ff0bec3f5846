// SPDX-License-Identifier: MIT OR Apache-2.0
//! Deferred frame actions.
//!
//! A FIFO of closures returning whether they are done. The host ticks the
//! queue once per frame; each tick runs the front action once and drops it
//! only when it reports completion.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

type FrameAction = Box<dyn FnMut() -> bool>;

/// Queue of deferred actions, one attempted per tick.
///
/// Every method takes `&self` so an action holding an `Rc` to the queue
/// may add, insert or clear while it runs.
#[derive(Default)]
pub struct FrameActionQueue {
    actions: RefCell<VecDeque<FrameAction>>,
    clears: Cell<u64>,
}

impl FrameActionQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an action to run after all the others
    pub fn add(&self, action: impl FnMut() -> bool + 'static) {
        self.actions.borrow_mut().push_back(Box::new(action));
    }

    /// Queue an action to run on the next tick
    pub fn insert(&self, action: impl FnMut() -> bool + 'static) {
        self.actions.borrow_mut().push_front(Box::new(action));
    }

    /// Drop every pending action
    pub fn clear(&self) {
        self.actions.borrow_mut().clear();
        self.clears.set(self.clears.get() + 1);
    }

    /// Number of pending actions
    pub fn len(&self) -> usize {
        self.actions.borrow().len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.actions.borrow().is_empty()
    }

    /// Run the front action once. It stays at the front when it is not done
    /// yet, unless it cleared the queue while running. Returns whether an
    /// action ran.
    pub fn tick(&self) -> bool {
        let Some(mut action) = self.actions.borrow_mut().pop_front() else {
            return false;
        };
        let epoch = self.clears.get();
        let done = action();
        if !done && epoch == self.clears.get() {
            self.actions.borrow_mut().push_front(action);
        }
        true
    }
}

impl fmt::Debug for FrameActionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameActionQueue")
            .field("pending", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn scripted(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str, results: Vec<bool>) -> impl FnMut() -> bool {
        let log = Rc::clone(log);
        let mut results = results.into_iter();
        move || {
            log.borrow_mut().push(name);
            results.next().unwrap_or(true)
        }
    }

    #[test]
    fn test_one_action_per_tick() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let queue = FrameActionQueue::new();
        queue.add(scripted(&log, "A1", vec![false, true]));
        queue.add(scripted(&log, "A2", vec![true]));

        assert!(queue.tick());
        assert_eq!(*log.borrow(), ["A1"]);
        assert_eq!(queue.len(), 2);

        assert!(queue.tick());
        assert_eq!(*log.borrow(), ["A1", "A1"]);
        assert_eq!(queue.len(), 1);

        assert!(queue.tick());
        assert_eq!(*log.borrow(), ["A1", "A1", "A2"]);
        assert!(queue.is_empty());

        assert!(!queue.tick());
        assert_eq!(log.borrow().len(), 3);
    }

    #[test]
    fn test_insert_runs_next() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let queue = FrameActionQueue::new();
        queue.add(scripted(&log, "last", vec![true]));
        queue.insert(scripted(&log, "first", vec![true]));

        queue.tick();
        queue.tick();
        assert_eq!(*log.borrow(), ["first", "last"]);
    }

    #[test]
    fn test_action_may_clear_the_queue() {
        let queue = Rc::new(FrameActionQueue::new());
        let handle = Rc::clone(&queue);
        queue.add(move || {
            handle.clear();
            false
        });
        queue.add(|| true);

        assert!(queue.tick());
        assert!(queue.is_empty());
        assert!(!queue.tick());
    }

    #[test]
    fn test_action_may_queue_more() {
        let queue = Rc::new(FrameActionQueue::new());
        let handle = Rc::clone(&queue);
        queue.add(move || {
            handle.add(|| true);
            true
        });

        queue.tick();
        assert_eq!(queue.len(), 1);
    }
}
