#![forbid(unsafe_code)]

//! Runtime: a small single-threaded reactive graph and the floating-element
//! controller built on it.
//!
//! [`FloatingState`] binds a reference element and a floating element,
//! asks a [`PositionEngine`](floating_core::PositionEngine) where the floating
//! element goes, and keeps the resulting coordinates and CSS up to date as
//! options, elements, or the page change.

pub mod floating;
pub mod reactive;

pub use floating::{Cleanup, FloatingOptions, FloatingState, Updater, WhileElementsMounted};
pub use reactive::{
    Computed, Effect, Observable, ReadSignal, Subscription, batch, is_tracking, untrack,
};
