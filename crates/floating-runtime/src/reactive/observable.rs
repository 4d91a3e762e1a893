#![forbid(unsafe_code)]

//! Shared, version-tracked values with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] keeps its value, a version counter and its subscriber
//! list behind one `Rc<RefCell<..>>`. Subscribers are held as `Weak`
//! callbacks; the strong side lives in the [`Subscription`] guard handed back
//! to the caller, so dropping the guard is all it takes to unsubscribe. Dead
//! entries are pruned on every subscribe and every notification, so the list
//! never grows past the live subscribers plus those dropped since the last
//! prune.
//!
//! Notification snapshots the subscriber list and the new value before any
//! callback runs, so callbacks may read the observable, subscribe to it or
//! drop their own guard without hitting a borrow conflict.
//!
//! # Failure Modes
//!
//! - **Callback writes the same observable**: allowed; the nested write runs
//!   its own notification cycle before the outer one continues.
//! - **Subscription dropped mid-cycle**: the callback may still run for the
//!   cycle already in progress, never for the next one.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::tracking::{self, Source};

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    version: u64,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared value that notifies subscribers when it changes.
///
/// Cloning an `Observable` creates a new handle to the **same** value.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Current value. Registers a dependency in the active tracking frame.
    #[must_use]
    pub fn get(&self) -> T {
        self.track();
        self.inner.borrow().value.clone()
    }

    /// Access the value by reference. Registers a dependency.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        f(&self.inner.borrow().value)
    }

    /// Register a dependency without reading the value.
    pub fn track(&self) {
        tracking::record(self.source_id(), || Rc::new(self.clone()) as Rc<dyn Source>);
    }

    /// Replace the value. Equal values are ignored: no version bump and no
    /// notification.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Mutate in place; notifies only if the value actually changed.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.inner.borrow().value.clone();
        f(&mut next);
        self.set(next);
    }

    /// Call `callback` with the new value after every change.
    ///
    /// The callback stays registered for as long as the returned guard lives.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        let mut inner = self.inner.borrow_mut();
        inner.subscribers.retain(|w| w.strong_count() > 0);
        inner.subscribers.push(Rc::downgrade(&strong));
        Subscription::new(strong)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Entries in the subscriber list, dead ones included.
    #[cfg(test)]
    pub(crate) fn stored_subscribers(&self) -> usize {
        self.inner.borrow().subscribers.len()
    }

    /// Number of changes since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Read-only view of this value.
    #[must_use]
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal {
            source: self.clone(),
        }
    }

    pub(crate) fn source_id(&self) -> usize {
        Rc::as_ptr(&self.inner).cast::<()>() as usize
    }

    fn notify(&self) {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|w| w.strong_count() > 0);
            let callbacks: Vec<Rc<Callback<T>>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (inner.value.clone(), callbacks)
        };
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T: Clone + PartialEq + 'static> Source for Observable<T> {
    fn source_id(&self) -> usize {
        Observable::source_id(self)
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        self.subscribe(move |_| on_change())
    }
}

/// Read-only handle to an [`Observable`].
///
/// Handed out where callers may observe a value but must not write it.
pub struct ReadSignal<T> {
    source: Observable<T>,
}

impl<T> Clone for ReadSignal<T> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadSignal").field(&self.source).finish()
    }
}

impl<T: Clone + PartialEq + 'static> ReadSignal<T> {
    #[must_use]
    pub fn get(&self) -> T {
        self.source.get()
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.source.with(f)
    }

    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.source.subscribe(callback)
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.source.version()
    }
}

/// RAII guard for a subscriber callback. Dropping it unsubscribes.
pub struct Subscription {
    _keep_alive: Box<dyn Any>,
}

impl Subscription {
    pub(crate) fn new(keep_alive: impl Any) -> Self {
        Self {
            _keep_alive: Box::new(keep_alive),
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
