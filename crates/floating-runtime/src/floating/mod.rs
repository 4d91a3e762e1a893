#![forbid(unsafe_code)]

//! Reactive state for one floating element anchored to one reference element.
//!
//! # Design
//!
//! [`FloatingState`] owns a set of [`Observable`] cells (element bindings,
//! requested options, and the last computed position) and three [`Effect`]s:
//!
//! | effect | tracks | runs |
//! |---|---|---|
//! | position | requested placement, strategy, middleware | `update()` |
//! | visibility | open flag | `reset()` |
//! | tracking | reference, floating | `attach()` |
//!
//! Each effect body does its work under [`untrack`], so nothing `update()` or
//! the tracking callback reads leaks into the effect's dependency set. All
//! three run once at construction.
//!
//! `update()` hands the engine's future to the caller's [`LocalSpawn`]
//! executor. The spawned task keeps only a weak handle to the state: a result
//! that arrives after the controller was dropped is discarded. Superseded
//! computations are not cancelled; whichever resolves last wins.
//!
//! # Invariants
//!
//! 1. `is_positioned()` becomes `true` only when a computation succeeds, and
//!    falls back to `false` whenever the configured open flag changes.
//! 2. At most one tracking cleanup is held; it runs before the next
//!    `attach()` and once on drop.
//! 3. [`floating_styles()`](FloatingState::floating_styles) is a projection of
//!    the state and never writes to it.
//!
//! # Failure Modes
//!
//! - **Engine error**: position state is left as it was; the error is kept in
//!   [`error()`](FloatingState::error) until the next success.
//! - **Executor refuses the task**: reported the same way, as
//!   [`FloatingError::Spawn`].

mod options;

pub use options::{Cleanup, FloatingOptions, Updater, WhileElementsMounted};

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use floating_core::{
    ComputePositionConfig, ComputePositionReturn, FloatingElement, FloatingError, FloatingStyles,
    Middleware, MiddlewareData, Placement, PositionEngine, Result, Strategy, floating_styles,
};
use futures::task::{LocalSpawn, LocalSpawnExt};

use crate::reactive::{Computed, Effect, Observable, ReadSignal, batch, untrack};
use options::Refresh;

struct Inner<R, F> {
    this: Weak<Self>,
    engine: Box<dyn PositionEngine<R, F>>,
    spawner: Box<dyn LocalSpawn>,

    reference: Observable<Option<R>>,
    floating: Observable<Option<F>>,

    open: Observable<Option<bool>>,
    requested_placement: Observable<Placement>,
    requested_strategy: Observable<Strategy>,
    middleware: Observable<Vec<Middleware>>,
    transform: Observable<bool>,
    while_elements_mounted: Option<WhileElementsMounted<R, F>>,

    x: Observable<f64>,
    y: Observable<f64>,
    placement: Observable<Placement>,
    strategy: Observable<Strategy>,
    middleware_data: Observable<MiddlewareData>,
    is_positioned: Observable<bool>,
    error: Observable<Option<FloatingError>>,

    cleanup: RefCell<Option<Cleanup>>,
}

impl<R, F> Inner<R, F>
where
    R: Clone + PartialEq + 'static,
    F: FloatingElement + Clone + PartialEq + 'static,
{
    fn update(&self) {
        let (Some(reference), Some(floating)) =
            untrack(|| (self.reference.get(), self.floating.get()))
        else {
            return;
        };
        let config = untrack(|| ComputePositionConfig {
            placement: self.requested_placement.get(),
            strategy: self.requested_strategy.get(),
            middleware: self.middleware.get(),
        });
        #[cfg(feature = "tracing")]
        log_update(&config);

        let pending = self
            .engine
            .compute_position(&reference, &floating, config);
        let this = self.this.clone();
        let task = async move {
            let result = pending.await;
            if let Some(inner) = this.upgrade() {
                inner.apply(result);
            }
        };
        if let Err(err) = self.spawner.spawn_local(task) {
            self.fail(FloatingError::from(err));
        }
    }

    fn apply(&self, result: Result<ComputePositionReturn>) {
        match result {
            Ok(data) => batch(|| {
                self.x.set(data.x);
                self.y.set(data.y);
                self.strategy.set(data.strategy);
                self.placement.set(data.placement);
                self.middleware_data.set(data.middleware_data);
                self.error.set(None);
                self.is_positioned.set(true);
            }),
            Err(err) => self.fail(err),
        }
    }

    fn fail(&self, err: FloatingError) {
        #[cfg(feature = "tracing")]
        tracing::warn!(message = "floating.update.failed", error = %err);
        self.error.set(Some(err));
    }

    fn attach(&self) {
        self.run_cleanup();
        let Some(mounted) = self.while_elements_mounted.as_ref() else {
            self.update();
            return;
        };
        let (Some(reference), Some(floating)) =
            untrack(|| (self.reference.get(), self.floating.get()))
        else {
            return;
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(message = "floating.attach");
        let updater = Updater::new(self.this.clone());
        let cleanup = mounted(&reference, &floating, updater);
        *self.cleanup.borrow_mut() = Some(cleanup);
    }

    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            #[cfg(feature = "tracing")]
            tracing::debug!(message = "floating.cleanup");
            cleanup();
        }
    }

    fn reset(&self) {
        if untrack(|| self.open.get()).is_some() {
            #[cfg(feature = "tracing")]
            tracing::debug!(message = "floating.reset");
            self.is_positioned.set(false);
        }
    }
}

impl<R, F> Refresh for Inner<R, F>
where
    R: Clone + PartialEq + 'static,
    F: FloatingElement + Clone + PartialEq + 'static,
{
    fn refresh(&self) {
        self.update();
    }
}

#[cfg(feature = "tracing")]
fn log_update(config: &ComputePositionConfig) {
    tracing::debug!(
        message = "floating.update",
        placement = %config.placement,
        strategy = %config.strategy,
        middleware = config.middleware.len(),
    );
}

/// Keeps a floating element positioned next to its reference element.
///
/// `R` is the reference element handle and `F` the floating element handle.
/// Handles are compared with `PartialEq`: binding an equal handle again does
/// nothing.
///
/// Dropping the controller stops its effects and runs the live tracking
/// cleanup, if any.
pub struct FloatingState<R, F> {
    inner: Rc<Inner<R, F>>,
    styles: Computed<FloatingStyles>,
    effects: Vec<Effect>,
}

impl<R, F> fmt::Debug for FloatingState<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &self.inner;
        f.debug_struct("FloatingState")
            .field("x", &inner.x)
            .field("y", &inner.y)
            .field("placement", &inner.placement)
            .field("strategy", &inner.strategy)
            .field("is_positioned", &inner.is_positioned)
            .field("tracking", &inner.cleanup.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl<R, F> FloatingState<R, F>
where
    R: Clone + PartialEq + 'static,
    F: FloatingElement + Clone + PartialEq + 'static,
{
    /// Build the controller and run its effects once.
    ///
    /// Position computations are spawned on `spawner`.
    pub fn new(
        engine: impl PositionEngine<R, F> + 'static,
        spawner: impl LocalSpawn + 'static,
        options: FloatingOptions<R, F>,
    ) -> Self {
        let inner = Rc::new_cyclic(|this| Inner {
            this: this.clone(),
            engine: Box::new(engine),
            spawner: Box::new(spawner),
            reference: Observable::new(None),
            floating: Observable::new(None),
            open: Observable::new(options.open),
            requested_placement: Observable::new(options.placement),
            requested_strategy: Observable::new(options.strategy),
            middleware: Observable::new(options.middleware),
            transform: Observable::new(options.transform),
            while_elements_mounted: options.while_elements_mounted,
            x: Observable::new(0.0),
            y: Observable::new(0.0),
            placement: Observable::new(options.placement),
            strategy: Observable::new(options.strategy),
            middleware_data: Observable::new(MiddlewareData::new()),
            is_positioned: Observable::new(false),
            error: Observable::new(None),
            cleanup: RefCell::new(None),
        });

        let styles = {
            let strategy = inner.strategy.clone();
            let x = inner.x.clone();
            let y = inner.y.clone();
            let transform = inner.transform.clone();
            let floating = inner.floating.clone();
            Computed::tracked(move || {
                let (strategy, x, y, transform) =
                    (strategy.get(), x.get(), y.get(), transform.get());
                floating.with(|el| floating_styles(strategy, x, y, transform, el.as_ref()))
            })
        };

        let effects = vec![
            Self::effect(&inner, |inner| {
                inner.requested_placement.track();
                inner.requested_strategy.track();
                inner.middleware.track();
                untrack(|| inner.update());
            }),
            Self::effect(&inner, |inner| {
                inner.open.track();
                untrack(|| inner.reset());
            }),
            Self::effect(&inner, |inner| {
                inner.reference.track();
                inner.floating.track();
                untrack(|| inner.attach());
            }),
        ];

        Self {
            inner,
            styles,
            effects,
        }
    }

    fn effect(inner: &Rc<Inner<R, F>>, body: fn(&Inner<R, F>)) -> Effect {
        let weak = Rc::downgrade(inner);
        Effect::new(move || {
            if let Some(inner) = weak.upgrade() {
                body(&inner);
            }
        })
    }

    /// Recompute the position now. Does nothing unless both elements are
    /// bound.
    pub fn update(&self) {
        self.inner.update();
    }

    /// Weak, clonable handle to [`update`](Self::update).
    #[must_use]
    pub fn updater(&self) -> Updater {
        let target: Weak<dyn Refresh> = self.inner.this.clone();
        Updater::new(target)
    }

    #[must_use]
    pub fn x(&self) -> f64 {
        self.inner.x.get()
    }

    #[must_use]
    pub fn y(&self) -> f64 {
        self.inner.y.get()
    }

    /// Placement the engine settled on.
    #[must_use]
    pub fn placement(&self) -> Placement {
        self.inner.placement.get()
    }

    #[must_use]
    pub fn strategy(&self) -> Strategy {
        self.inner.strategy.get()
    }

    #[must_use]
    pub fn middleware_data(&self) -> MiddlewareData {
        self.inner.middleware_data.get()
    }

    #[must_use]
    pub fn is_positioned(&self) -> bool {
        self.inner.is_positioned.get()
    }

    /// The last failed computation, cleared by the next successful one.
    #[must_use]
    pub fn error(&self) -> Option<FloatingError> {
        self.inner.error.get()
    }

    /// CSS for the floating element, derived from the current state.
    #[must_use]
    pub fn floating_styles(&self) -> FloatingStyles {
        self.styles.get()
    }

    /// Reactive handle to the derived styles.
    #[must_use]
    pub fn styles_signal(&self) -> Computed<FloatingStyles> {
        self.styles.clone()
    }

    #[must_use]
    pub fn x_signal(&self) -> ReadSignal<f64> {
        self.inner.x.read_only()
    }

    #[must_use]
    pub fn y_signal(&self) -> ReadSignal<f64> {
        self.inner.y.read_only()
    }

    #[must_use]
    pub fn placement_signal(&self) -> ReadSignal<Placement> {
        self.inner.placement.read_only()
    }

    #[must_use]
    pub fn strategy_signal(&self) -> ReadSignal<Strategy> {
        self.inner.strategy.read_only()
    }

    #[must_use]
    pub fn middleware_data_signal(&self) -> ReadSignal<MiddlewareData> {
        self.inner.middleware_data.read_only()
    }

    #[must_use]
    pub fn is_positioned_signal(&self) -> ReadSignal<bool> {
        self.inner.is_positioned.read_only()
    }

    #[must_use]
    pub fn error_signal(&self) -> ReadSignal<Option<FloatingError>> {
        self.inner.error.read_only()
    }

    #[must_use]
    pub fn reference(&self) -> Option<R> {
        self.inner.reference.get()
    }

    /// Bind (or unbind, with `None`) the reference element.
    pub fn set_reference(&self, reference: Option<R>) {
        self.inner.reference.set(reference);
    }

    #[must_use]
    pub fn floating(&self) -> Option<F> {
        self.inner.floating.get()
    }

    /// Bind (or unbind, with `None`) the floating element.
    pub fn set_floating(&self, floating: Option<F>) {
        self.inner.floating.set(floating);
    }

    #[must_use]
    pub fn open(&self) -> Option<bool> {
        self.inner.open.get()
    }

    pub fn set_open(&self, open: Option<bool>) {
        self.inner.open.set(open);
    }

    /// Requested placement, as opposed to [`placement`](Self::placement).
    #[must_use]
    pub fn requested_placement(&self) -> Placement {
        self.inner.requested_placement.get()
    }

    pub fn set_placement(&self, placement: Placement) {
        self.inner.requested_placement.set(placement);
    }

    /// Requested strategy, as opposed to [`strategy`](Self::strategy).
    #[must_use]
    pub fn requested_strategy(&self) -> Strategy {
        self.inner.requested_strategy.get()
    }

    pub fn set_strategy(&self, strategy: Strategy) {
        self.inner.requested_strategy.set(strategy);
    }

    #[must_use]
    pub fn middleware(&self) -> Vec<Middleware> {
        self.inner.middleware.get()
    }

    pub fn set_middleware(&self, middleware: Vec<Middleware>) {
        self.inner.middleware.set(middleware);
    }

    #[must_use]
    pub fn transform(&self) -> bool {
        self.inner.transform.get()
    }

    pub fn set_transform(&self, transform: bool) {
        self.inner.transform.set(transform);
    }

    /// Apply every reactive option at once; a change to several of
    /// placement, strategy and middleware triggers a single update.
    ///
    /// `while_elements_mounted` is fixed at construction and ignored here.
    pub fn set_options(&self, options: FloatingOptions<R, F>) {
        batch(|| {
            self.inner.open.set(options.open);
            self.inner.requested_placement.set(options.placement);
            self.inner.requested_strategy.set(options.strategy);
            self.inner.middleware.set(options.middleware);
            self.inner.transform.set(options.transform);
        });
    }

    /// Whether a tracking cleanup is currently held.
    #[must_use]
    pub fn is_tracking(&self) -> bool {
        self.inner.cleanup.borrow().is_some()
    }
}

impl<R, F> Drop for FloatingState<R, F> {
    fn drop(&mut self) {
        for effect in &self.effects {
            effect.dispose();
        }
        let cleanup = self.inner.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            #[cfg(feature = "tracing")]
            tracing::debug!(message = "floating.cleanup");
            cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floating_core::PositionFuture;
    use futures::channel::oneshot;
    use futures::executor::LocalPool;
    use futures::future::{self, FutureExt};
    use std::cell::Cell;

    #[derive(Debug, Clone, PartialEq)]
    struct El {
        id: u32,
        dpr: Option<f64>,
    }

    impl El {
        fn new(id: u32) -> Self {
            Self { id, dpr: Some(1.0) }
        }
    }

    impl FloatingElement for El {
        fn device_pixel_ratio(&self) -> Option<f64> {
            self.dpr
        }
    }

    type Calls = Rc<RefCell<Vec<ComputePositionConfig>>>;

    /// Engine that answers immediately at (10.0, 20.0) with the requested
    /// placement and strategy, recording every call.
    fn instant_engine(calls: Calls) -> impl PositionEngine<El, El> {
        move |_: &El, _: &El, config: ComputePositionConfig| -> PositionFuture {
            calls.borrow_mut().push(config.clone());
            future::ready(Ok(ComputePositionReturn {
                x: 10.0,
                y: 20.0,
                placement: config.placement,
                strategy: config.strategy,
                middleware_data: MiddlewareData::new(),
            }))
            .boxed_local()
        }
    }

    fn controller(options: FloatingOptions<El, El>) -> (LocalPool, FloatingState<El, El>, Calls) {
        let pool = LocalPool::new();
        let calls: Calls = Rc::new(RefCell::new(Vec::new()));
        let state = FloatingState::new(
            instant_engine(Rc::clone(&calls)),
            pool.spawner(),
            options,
        );
        (pool, state, calls)
    }

    #[test]
    fn initial_state_mirrors_options() {
        let (_pool, state, calls) = controller(
            FloatingOptions::new()
                .placement(Placement::TopEnd)
                .strategy(Strategy::Fixed),
        );
        assert_eq!(state.x(), 0.0);
        assert_eq!(state.y(), 0.0);
        assert_eq!(state.placement(), Placement::TopEnd);
        assert_eq!(state.strategy(), Strategy::Fixed);
        assert!(state.middleware_data().is_empty());
        assert!(!state.is_positioned());
        assert!(state.error().is_none());
        assert!(calls.borrow().is_empty(), "no elements, no computation");
    }

    #[test]
    fn binding_both_elements_positions() {
        let (mut pool, state, calls) = controller(FloatingOptions::new());
        state.set_reference(Some(El::new(1)));
        assert!(calls.borrow().is_empty());
        state.set_floating(Some(El::new(2)));
        assert_eq!(calls.borrow().len(), 1);

        pool.run_until_stalled();
        assert!(state.is_positioned());
        assert_eq!((state.x(), state.y()), (10.0, 20.0));
    }

    #[test]
    fn rebinding_equal_element_is_noop() {
        let (_pool, state, calls) = controller(FloatingOptions::new());
        state.set_reference(Some(El::new(1)));
        state.set_floating(Some(El::new(2)));
        state.set_floating(Some(El::new(2)));
        assert_eq!(calls.borrow().len(), 1);
    }

    #[test]
    fn option_changes_recompute_with_new_config() {
        let (mut pool, state, calls) = controller(FloatingOptions::new());
        state.set_reference(Some(El::new(1)));
        state.set_floating(Some(El::new(2)));
        state.set_placement(Placement::Left);
        state.set_strategy(Strategy::Fixed);
        state.set_middleware(vec![Middleware::offset(8.0)]);

        let calls = calls.borrow();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[3].placement, Placement::Left);
        assert_eq!(calls[3].strategy, Strategy::Fixed);
        assert_eq!(calls[3].middleware, vec![Middleware::offset(8.0)]);
        drop(calls);

        pool.run_until_stalled();
        assert_eq!(state.placement(), Placement::Left);
        assert_eq!(state.strategy(), Strategy::Fixed);
    }

    #[test]
    fn set_options_updates_once() {
        let (_pool, state, calls) = controller(FloatingOptions::new());
        state.set_reference(Some(El::new(1)));
        state.set_floating(Some(El::new(2)));
        state.set_options(
            FloatingOptions::new()
                .placement(Placement::Right)
                .strategy(Strategy::Fixed)
                .with_middleware(Middleware::flip()),
        );
        assert_eq!(calls.borrow().len(), 2);
    }

    #[test]
    fn transform_change_restyles_without_recompute() {
        let (mut pool, state, calls) = controller(FloatingOptions::new());
        state.set_reference(Some(El::new(1)));
        state.set_floating(Some(El::new(2)));
        pool.run_until_stalled();
        assert_eq!(
            state.floating_styles().transform.as_deref(),
            Some("translate(10px, 20px)")
        );

        state.set_transform(false);
        assert_eq!(calls.borrow().len(), 1);
        let styles = state.floating_styles();
        assert_eq!(styles.transform, None);
        assert_eq!(styles.left, "10px");
        assert_eq!(styles.top, "20px");
    }

    #[test]
    fn reset_only_when_open_is_configured() {
        let (mut pool, state, _calls) = controller(FloatingOptions::new().without_open());
        state.set_reference(Some(El::new(1)));
        state.set_floating(Some(El::new(2)));
        pool.run_until_stalled();
        assert!(state.is_positioned());

        state.set_open(None);
        assert!(state.is_positioned());
        state.set_open(Some(false));
        assert!(!state.is_positioned());
    }

    #[test]
    fn updater_outlives_controller_harmlessly() {
        let (mut pool, state, calls) = controller(FloatingOptions::new());
        state.set_reference(Some(El::new(1)));
        state.set_floating(Some(El::new(2)));
        let updater = state.updater();
        updater.update();
        assert_eq!(calls.borrow().len(), 2);

        drop(state);
        pool.run_until_stalled();
        updater.update();
        assert_eq!(calls.borrow().len(), 2);
        assert!(!updater.is_attached());
    }

    #[test]
    fn result_after_drop_is_discarded() {
        let mut pool = LocalPool::new();
        let senders = Rc::new(RefCell::new(Vec::new()));
        let engine = {
            let senders = Rc::clone(&senders);
            move |_: &El, _: &El, _: ComputePositionConfig| -> PositionFuture {
                let (tx, rx) = oneshot::channel::<Result<ComputePositionReturn>>();
                senders.borrow_mut().push(tx);
                rx.map(|r| r.unwrap_or_else(|_| Err(FloatingError::engine("cancelled"))))
                    .boxed_local()
            }
        };
        let state = FloatingState::new(engine, pool.spawner(), FloatingOptions::new());
        state.set_reference(Some(El::new(1)));
        state.set_floating(Some(El::new(2)));
        let x = state.x_signal();
        drop(state);

        let tx = senders.borrow_mut().remove(0);
        let _ = tx.send(Ok(ComputePositionReturn {
            x: 99.0,
            ..ComputePositionReturn::default()
        }));
        pool.run_until_stalled();
        assert_eq!(x.get(), 0.0);
    }

    #[test]
    fn effects_are_disposed_on_drop() {
        let (_pool, state, calls) = controller(FloatingOptions::new());
        let reference = state.inner.reference.clone();
        let floating = state.inner.floating.clone();
        assert_eq!(reference.subscriber_count(), 1);
        drop(state);
        reference.set(Some(El::new(1)));
        floating.set(Some(El::new(2)));
        assert_eq!(reference.subscriber_count(), 0);
        assert!(calls.borrow().is_empty());
    }

    #[test]
    fn mounted_callback_receives_live_updater() {
        let updaters: Rc<RefCell<Vec<Updater>>> = Rc::new(RefCell::new(Vec::new()));
        let cleanups = Rc::new(Cell::new(0u32));
        let options = {
            let updaters = Rc::clone(&updaters);
            let cleanups = Rc::clone(&cleanups);
            FloatingOptions::new().while_elements_mounted(
                move |_: &El, _: &El, updater: Updater| -> Cleanup {
                    updaters.borrow_mut().push(updater);
                    let cleanups = Rc::clone(&cleanups);
                    Box::new(move || cleanups.set(cleanups.get() + 1))
                },
            )
        };
        let (_pool, state, calls) = controller(options);
        state.set_reference(Some(El::new(1)));
        assert!(updaters.borrow().is_empty(), "floating not bound yet");
        state.set_floating(Some(El::new(2)));
        assert_eq!(updaters.borrow().len(), 1);
        assert!(state.is_tracking());
        assert!(calls.borrow().is_empty(), "the callback decides when to update");

        updaters.borrow()[0].update();
        assert_eq!(calls.borrow().len(), 1);

        state.set_reference(None);
        assert_eq!(cleanups.get(), 1);
        assert!(!state.is_tracking());
        drop(state);
        assert_eq!(cleanups.get(), 1);
    }
}
