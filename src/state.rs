//! Observable state holder.
//!
//! A thin layer over [`tokio::sync::watch`]: the owner mutates, everybody else holds a
//! [`StateReceiver`] that can be read synchronously with `borrow()` or awaited with
//! `changed()`.

use std::sync::Arc;
use tokio::sync::watch;

/// Read-only view of an [`ObservableState`] handed to the presentation layer.
pub type StateReceiver<T> = watch::Receiver<T>;

#[derive(Debug)]
pub struct ObservableState<T> {
    tx: Arc<watch::Sender<T>>,
}

impl<T> Clone for ObservableState<T> {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

impl<T> ObservableState<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// Applies `f` in place and notifies every subscriber.
    pub fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut T),
    {
        self.tx.send_modify(f);
    }

    /// Applies `f` in place; subscribers are notified only when `f` returns true.
    pub fn mutate_if<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        self.tx.send_if_modified(f)
    }

    /// Replaces the value, returning the previous one.
    pub fn replace(&self, value: T) -> T {
        self.tx.send_replace(value)
    }

    /// Runs `f` against the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    pub fn subscribe(&self) -> StateReceiver<T> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl<T: Clone> ObservableState<T> {
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }
}

impl<T: PartialEq> ObservableState<T> {
    /// Stores `value` and notifies only when it differs from the current one.
    /// Returns whether a change happened.
    pub fn set(&self, value: T) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        })
    }
}
