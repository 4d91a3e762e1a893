#![forbid(unsafe_code)]

//! Side effects that re-run when their dependencies change.
//!
//! An [`Effect`] runs its closure once on creation inside a tracking frame.
//! Every [`Observable`](super::Observable) or [`Computed`](super::Computed)
//! read during that run becomes a dependency; a change to any of them
//! schedules the next run, which re-discovers the dependency set from
//! scratch. Reads wrapped in [`untrack`](super::untrack) are not dependencies.
//!
//! # Scheduling
//!
//! - Outside [`batch`], a dependency change re-runs the effect synchronously.
//! - Inside [`batch`], effects are queued (each at most once) and flushed in
//!   queue order when the outermost batch closes.
//! - A trigger that arrives while the effect is already running is replayed
//!   right after the current run finishes; the effect never re-enters itself.
//!
//! # Invariants
//!
//! 1. A disposed effect never runs again and holds no subscriptions.
//! 2. Dependencies of run *n* stay live until run *n + 1* has finished, so a
//!    change that lands mid-run is replayed afterwards.
//! 3. A batch flush runs each queued effect at most once per flush pass.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use super::observable::Subscription;
use super::tracking;

struct EffectInner {
    run: RefCell<Box<dyn FnMut()>>,
    subscriptions: RefCell<Vec<Subscription>>,
    running: Cell<bool>,
    /// Triggered while running; replay after the current run.
    pending: Cell<bool>,
    /// Sitting in the batch queue.
    queued: Cell<bool>,
    disposed: Cell<bool>,
    runs: Cell<u64>,
}

impl EffectInner {
    fn schedule(self: &Rc<Self>) {
        if self.disposed.get() {
            return;
        }
        let deferred = BATCH.with(|batch| {
            if batch.depth.get() == 0 {
                return false;
            }
            if !self.queued.replace(true) {
                batch.queue.borrow_mut().push(Rc::downgrade(self));
            }
            true
        });
        if !deferred {
            self.execute();
        }
    }

    fn execute(self: &Rc<Self>) {
        if self.disposed.get() {
            return;
        }
        if self.running.replace(true) {
            self.pending.set(true);
            return;
        }
        let _guard = RunningGuard(self);
        loop {
            self.pending.set(false);

            let ((), sources) = tracking::collect(|| (*self.run.borrow_mut())());
            self.runs.set(self.runs.get() + 1);
            if self.disposed.get() {
                break;
            }

            let weak = Rc::downgrade(self);
            let on_change: Rc<dyn Fn()> = Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.schedule();
                }
            });
            let subs = sources
                .iter()
                .map(|source| source.watch(Rc::clone(&on_change)))
                .collect();
            *self.subscriptions.borrow_mut() = subs;

            if !self.pending.get() {
                break;
            }
        }
    }

    fn dispose(&self) {
        self.disposed.set(true);
        self.pending.set(false);
        self.subscriptions.borrow_mut().clear();
    }
}

struct RunningGuard<'a>(&'a EffectInner);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.running.set(false);
    }
}

/// A side effect bound to the reactive values it reads.
///
/// Dropping the handle disposes the effect.
pub struct Effect {
    inner: Rc<EffectInner>,
}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("runs", &self.inner.runs.get())
            .field("dependencies", &self.inner.subscriptions.borrow().len())
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

impl Effect {
    /// Create the effect and run it once immediately.
    pub fn new(run: impl FnMut() + 'static) -> Self {
        let inner = Rc::new(EffectInner {
            run: RefCell::new(Box::new(run)),
            subscriptions: RefCell::new(Vec::new()),
            running: Cell::new(false),
            pending: Cell::new(false),
            queued: Cell::new(false),
            disposed: Cell::new(false),
            runs: Cell::new(0),
        });
        inner.schedule();
        Self { inner }
    }

    /// Stop the effect. Idempotent.
    pub fn dispose(&self) {
        self.inner.dispose();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// How many times the closure has run.
    #[must_use]
    pub fn run_count(&self) -> u64 {
        self.inner.runs.get()
    }

    /// Number of dependencies recorded by the last run.
    #[must_use]
    pub fn dependency_count(&self) -> usize {
        self.inner.subscriptions.borrow().len()
    }
}

impl Drop for Effect {
    fn drop(&mut self) {
        self.inner.dispose();
    }
}

struct BatchState {
    depth: Cell<usize>,
    queue: RefCell<Vec<Weak<EffectInner>>>,
}

thread_local! {
    static BATCH: BatchState = const {
        BatchState {
            depth: Cell::new(0),
            queue: RefCell::new(Vec::new()),
        }
    };
}

struct BatchGuard;

impl Drop for BatchGuard {
    fn drop(&mut self) {
        let outermost = BATCH.with(|batch| {
            let depth = batch.depth.get() - 1;
            batch.depth.set(depth);
            depth == 0
        });
        if outermost {
            flush();
        }
    }
}

fn flush() {
    loop {
        let queued = BATCH.with(|batch| std::mem::take(&mut *batch.queue.borrow_mut()));
        if queued.is_empty() {
            break;
        }
        for effect in queued.iter().filter_map(Weak::upgrade) {
            effect.queued.set(false);
            effect.execute();
        }
    }
}

/// Run `f`, deferring effect re-runs until the outermost batch closes.
///
/// Several writes inside one batch re-run each dependent effect once.
pub fn batch<R>(f: impl FnOnce() -> R) -> R {
    BATCH.with(|batch| batch.depth.set(batch.depth.get() + 1));
    let _guard = BatchGuard;
    f()
}
