//! Bounded blocking MPMC FIFO with a shutdown mode.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

struct Inner<T> {
    queue: VecDeque<T>,
    block_new_values: bool,
}

/// Multi-producer / multi-consumer queue with a size bound.
///
/// `push` blocks while full, `pop` blocks while empty. Once
/// `block_new_values` is set, `push` is refused and `pop` of an empty
/// queue returns `None` instead of waiting, which lets consumers drain
/// and exit.
pub struct ThreadedQueue<T> {
    max_size: usize,
    inner: Mutex<Inner<T>>,
    cv: Condvar,
}

impl<T> ThreadedQueue<T> {
    pub fn new(max_size: usize) -> Self {
        assert!(max_size > 0, "queue needs a positive size bound");
        Self {
            max_size,
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                block_new_values: false,
            }),
            cv: Condvar::new(),
        }
    }

    /// Blocking push. Returns false if the queue is refusing new values.
    pub fn push(&self, value: T) -> bool {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if inner.block_new_values {
                return false;
            }
            if inner.queue.len() < self.max_size {
                break;
            }
            inner = self.cv.wait(inner).unwrap();
        }
        inner.queue.push_back(value);
        self.cv.notify_one();
        true
    }

    /// Blocking pop. Returns `None` once the queue is empty and blocked.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(value) = inner.queue.pop_front() {
                self.cv.notify_one();
                return Some(value);
            }
            if inner.block_new_values {
                return None;
            }
            inner = self.cv.wait(inner).unwrap();
        }
    }

    /// Non-blocking pop.
    pub fn try_pop(&self) -> Option<T> {
        let mut inner = self.inner.lock().unwrap();
        let value = inner.queue.pop_front();
        if value.is_some() {
            self.cv.notify_one();
        }
        value
    }

    pub fn size(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().queue.is_empty()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.queue.clear();
        self.cv.notify_all();
    }

    /// Refuse all future pushes and wake every waiter.
    pub fn block_new_values(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.block_new_values = true;
        self.cv.notify_all();
    }
}
