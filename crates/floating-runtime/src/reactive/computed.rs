#![forbid(unsafe_code)]

//! Memoized values derived from observables and other computeds.
//!
//! [`Computed<T>`] keeps a `T`-free half (dirty flag and watchers) apart from
//! the compute function and its cache, so dependency callbacks only need a
//! `Weak` to the first half. A dependency change marks the value dirty and
//! tells every watcher; the next [`get()`](Computed::get) recomputes.
//!
//! Dependencies are either listed up front (`from_observable`, `from2`,
//! `from3`, `from_fn`) or rediscovered on every recompute
//! ([`Computed::tracked`]). Listed computes run untracked, so an enclosing
//! effect depends on the computed and not on whatever it reads internally.
//!
//! A panicking compute leaves the previous cache in place with the dirty flag
//! already cleared; `invalidate()` forces a retry. When a dependency is
//! dropped its subscription goes inert and the cache is kept as is.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::observable::{Observable, Subscription};
use super::tracking::{self, Source};

/// The `T`-independent half of a computed value.
struct Shared {
    dirty: Cell<bool>,
    watchers: RefCell<Vec<Weak<dyn Fn()>>>,
}

impl Shared {
    fn invalidate(&self) {
        self.dirty.set(true);
        let watchers: Vec<Rc<dyn Fn()>> = {
            let mut watchers = self.watchers.borrow_mut();
            watchers.retain(|w| w.strong_count() > 0);
            watchers.iter().filter_map(Weak::upgrade).collect()
        };
        for watcher in watchers {
            watcher();
        }
    }

    /// Callback that invalidates this computed for as long as it exists.
    fn marker(self: &Rc<Self>) -> Rc<dyn Fn()> {
        let weak = Rc::downgrade(self);
        Rc::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.invalidate();
            }
        })
    }
}

struct State<T> {
    compute: Box<dyn Fn() -> T>,
    cached: Option<T>,
    version: u64,
    /// Re-discover dependencies on every recompute.
    tracked: bool,
    subscriptions: Vec<Subscription>,
}

/// A lazily-evaluated, memoized value derived from other reactive values.
///
/// Cloning a `Computed` creates a new handle to the **same** inner state.
pub struct Computed<T> {
    shared: Rc<Shared>,
    state: Rc<RefCell<State<T>>>,
}

impl<T> Clone for Computed<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Computed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Computed")
            .field("cached", &state.cached)
            .field("dirty", &self.shared.dirty.get())
            .field("version", &state.version)
            .field("tracked", &state.tracked)
            .finish()
    }
}

impl<T: Clone + 'static> Computed<T> {
    fn build(compute: Box<dyn Fn() -> T>, tracked: bool) -> Self {
        Self {
            shared: Rc::new(Shared {
                dirty: Cell::new(true),
                watchers: RefCell::new(Vec::new()),
            }),
            state: Rc::new(RefCell::new(State {
                compute,
                cached: None,
                version: 0,
                tracked,
                subscriptions: Vec::new(),
            })),
        }
    }

    fn with_sources(compute: Box<dyn Fn() -> T>, sources: &[&dyn Source]) -> Self {
        let computed = Self::build(compute, false);
        let subs = sources
            .iter()
            .map(|source| source.watch(computed.shared.marker()))
            .collect();
        computed.state.borrow_mut().subscriptions = subs;
        computed
    }

    /// Derived from a single observable.
    pub fn from_observable<S: Clone + PartialEq + 'static>(
        source: &Observable<S>,
        map: impl Fn(&S) -> T + 'static,
    ) -> Self {
        let s = source.clone();
        Self::with_sources(Box::new(move || s.with(|v| map(v))), &[source as &dyn Source])
    }

    /// Derived from two observables.
    pub fn from2<S1, S2>(
        s1: &Observable<S1>,
        s2: &Observable<S2>,
        map: impl Fn(&S1, &S2) -> T + 'static,
    ) -> Self
    where
        S1: Clone + PartialEq + 'static,
        S2: Clone + PartialEq + 'static,
    {
        let (a, b) = (s1.clone(), s2.clone());
        Self::with_sources(
            Box::new(move || a.with(|v1| b.with(|v2| map(v1, v2)))),
            &[s1 as &dyn Source, s2 as &dyn Source],
        )
    }

    /// Derived from three observables.
    pub fn from3<S1, S2, S3>(
        s1: &Observable<S1>,
        s2: &Observable<S2>,
        s3: &Observable<S3>,
        map: impl Fn(&S1, &S2, &S3) -> T + 'static,
    ) -> Self
    where
        S1: Clone + PartialEq + 'static,
        S2: Clone + PartialEq + 'static,
        S3: Clone + PartialEq + 'static,
    {
        let (a, b, c) = (s1.clone(), s2.clone(), s3.clone());
        Self::with_sources(
            Box::new(move || a.with(|v1| b.with(|v2| c.with(|v3| map(v1, v2, v3))))),
            &[s1 as &dyn Source, s2 as &dyn Source, s3 as &dyn Source],
        )
    }

    /// Low-level constructor: the caller keeps the computed fresh through
    /// `subscriptions` or explicit [`invalidate()`](Self::invalidate) calls.
    pub fn from_fn(compute: impl Fn() -> T + 'static, subscriptions: Vec<Subscription>) -> Self {
        let computed = Self::build(Box::new(compute), false);
        computed.state.borrow_mut().subscriptions = subscriptions;
        computed
    }

    /// Dependencies are whatever `compute` reads, re-discovered on every
    /// recompute. Reads inside [`untrack`](super::untrack) are not
    /// dependencies.
    pub fn tracked(compute: impl Fn() -> T + 'static) -> Self {
        Self::build(Box::new(compute), true)
    }

    fn refresh(&self) {
        if !self.shared.dirty.get() && self.state.borrow().cached.is_some() {
            return;
        }
        let mut state = self.state.borrow_mut();
        // Cleared first so a change during compute leaves us dirty again.
        self.shared.dirty.set(false);
        if state.tracked {
            let (value, sources) = tracking::collect(|| (state.compute)());
            state.subscriptions.clear();
            let subs = sources
                .iter()
                .map(|source| source.watch(self.shared.marker()))
                .collect();
            state.subscriptions = subs;
            state.cached = Some(value);
        } else {
            let value = tracking::untrack(|| (state.compute)());
            state.cached = Some(value);
        }
        state.version += 1;
    }

    fn track(&self) {
        tracking::record(self.source_id(), || Rc::new(self.clone()) as Rc<dyn Source>);
    }

    /// Current value, recomputed if a dependency changed. Registers a
    /// dependency in the active tracking frame.
    #[must_use]
    pub fn get(&self) -> T {
        self.track();
        self.refresh();
        self.state
            .borrow()
            .cached
            .clone()
            .expect("cached is always Some after refresh")
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure calls `get()` on the same `Computed`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.track();
        self.refresh();
        let state = self.state.borrow();
        f(state
            .cached
            .as_ref()
            .expect("cached is always Some after refresh"))
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.shared.dirty.get()
    }

    /// Force the next `get()` to recompute, and notify watchers.
    pub fn invalidate(&self) {
        self.shared.invalidate();
    }

    /// Increments by 1 on each recomputation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.borrow().version
    }

    /// Call `callback` whenever the value is invalidated.
    #[must_use = "dropping the Subscription unsubscribes immediately"]
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> Subscription {
        self.watch(Rc::new(callback))
    }
}

impl<T: Clone + 'static> Source for Computed<T> {
    fn source_id(&self) -> usize {
        Rc::as_ptr(&self.shared) as usize
    }

    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription {
        let mut watchers = self.shared.watchers.borrow_mut();
        watchers.retain(|w| w.strong_count() > 0);
        watchers.push(Rc::downgrade(&on_change));
        Subscription::new(on_change)
    }
}
