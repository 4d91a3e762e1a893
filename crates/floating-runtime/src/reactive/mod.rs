#![forbid(unsafe_code)]

//! Reactive state graph for floating-element controllers.
//!
//! - [`Observable`]: shared value with a version counter and subscribers.
//! - [`ReadSignal`]: read-only handle onto an `Observable`.
//! - [`Subscription`]: unsubscribes when dropped.
//! - [`Computed`]: memoized value derived from other reactive values.
//! - [`Effect`]: reruns whenever something it read has changed.
//! - [`untrack`] reads without taking a dependency, and [`batch`] defers
//!   effect reruns until the outermost batch returns.
//!
//! The graph is single-threaded (`Rc`, `RefCell`, `Cell`). Subscribers are
//! held as `Weak` callbacks and pruned while notifying.
//!
//! Reads of an `Observable` or `Computed` are recorded in the innermost
//! thread-local tracking frame. When an `Effect` or a tracked `Computed`
//! finishes a run, it swaps its subscriptions for the recorded set.
//!
//! Writing a value equal to the current one does nothing: the version stays
//! put and nobody is notified. Subscribers hear changes in the order they
//! subscribed, and a dropped [`Subscription`] is never called again.

pub mod computed;
pub mod effect;
pub mod observable;
mod tracking;

pub use computed::Computed;
pub use effect::{Effect, batch};
pub use observable::{Observable, ReadSignal, Subscription};
pub use tracking::{is_tracking, untrack};
