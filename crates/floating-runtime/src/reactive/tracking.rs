#![forbid(unsafe_code)]

//! Dependency recording for [`Effect`](super::Effect) and tracked
//! [`Computed`](super::Computed) values.
//!
//! A thread-local stack of frames records which sources are read while a
//! closure runs. The innermost frame wins: nested effects collect their own
//! dependencies, and [`untrack`] pushes a frame that records nothing.
//!
//! # Invariants
//!
//! 1. A source is recorded at most once per frame.
//! 2. Reads outside any frame, or inside an [`untrack`] frame, are not
//!    recorded anywhere.
//! 3. Frames are popped even if the closure panics.

use std::cell::RefCell;
use std::rc::Rc;

use super::observable::Subscription;

/// Something a tracking frame can depend on.
pub(crate) trait Source {
    /// Stable identity of the shared state behind this handle.
    fn source_id(&self) -> usize;

    /// Call `on_change` whenever the source changes, for as long as the
    /// returned guard lives.
    fn watch(&self, on_change: Rc<dyn Fn()>) -> Subscription;
}

/// `None` is an untracked frame.
type Frame = Option<Vec<Rc<dyn Source>>>;

thread_local! {
    static FRAMES: RefCell<Vec<Frame>> = const { RefCell::new(Vec::new()) };
}

struct FrameGuard;

impl Drop for FrameGuard {
    fn drop(&mut self) {
        FRAMES.with(|frames| {
            frames.borrow_mut().pop();
        });
    }
}

fn push_frame(frame: Frame) -> FrameGuard {
    FRAMES.with(|frames| frames.borrow_mut().push(frame));
    FrameGuard
}

/// Record a read of the source with identity `id` in the innermost frame.
///
/// `make` is only called when the read is actually recorded.
pub(crate) fn record(id: usize, make: impl FnOnce() -> Rc<dyn Source>) {
    FRAMES.with(|frames| {
        let mut frames = frames.borrow_mut();
        let Some(Some(sources)) = frames.last_mut() else {
            return;
        };
        if sources.iter().all(|s| s.source_id() != id) {
            sources.push(make());
        }
    });
}

/// Run `f` in a fresh recording frame and return what it read.
pub(crate) fn collect<R>(f: impl FnOnce() -> R) -> (R, Vec<Rc<dyn Source>>) {
    let guard = push_frame(Some(Vec::new()));
    let value = f();
    let sources = FRAMES.with(|frames| {
        frames
            .borrow_mut()
            .last_mut()
            .and_then(Option::take)
            .unwrap_or_default()
    });
    drop(guard);
    (value, sources)
}

/// Run `f` without registering any of its reads as dependencies of the
/// surrounding effect or computed value.
///
/// Writes inside `f` still notify subscribers as usual.
pub fn untrack<R>(f: impl FnOnce() -> R) -> R {
    let _guard = push_frame(None);
    f()
}

/// Whether a read right now would be recorded.
#[must_use]
pub fn is_tracking() -> bool {
    FRAMES.with(|frames| matches!(frames.borrow().last(), Some(Some(_))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::Observable;

    #[test]
    fn collect_records_each_source_once() {
        let a = Observable::new(1);
        let b = Observable::new(2);
        let (sum, sources) = collect(|| a.get() + a.get() + b.get());
        assert_eq!(sum, 4);
        assert_eq!(sources.len(), 2);
    }

    #[test]
    fn untrack_hides_reads() {
        let a = Observable::new(1);
        let b = Observable::new(2);
        let (_, sources) = collect(|| {
            let _ = a.get();
            untrack(|| b.get())
        });
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].source_id(), a.source_id());
    }

    #[test]
    fn nested_frames_are_isolated() {
        let outer = Observable::new(1);
        let inner = Observable::new(2);
        let (inner_sources, outer_sources) = collect(|| {
            let _ = outer.get();
            collect(|| inner.get()).1
        });
        assert_eq!(inner_sources.len(), 1);
        assert_eq!(outer_sources.len(), 1);
        assert_eq!(outer_sources[0].source_id(), outer.source_id());
    }

    #[test]
    fn tracking_flag_follows_frames() {
        assert!(!is_tracking());
        collect(|| {
            assert!(is_tracking());
            untrack(|| assert!(!is_tracking()));
            assert!(is_tracking());
        });
        assert!(!is_tracking());
    }

    #[test]
    fn frame_popped_after_panic() {
        let result = std::panic::catch_unwind(|| {
            collect(|| panic!("boom"));
        });
        assert!(result.is_err());
        assert!(!is_tracking());
    }
}
