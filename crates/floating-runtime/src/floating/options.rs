#![forbid(unsafe_code)]

//! Configuration for [`FloatingState`](super::FloatingState).

use std::fmt;
use std::rc::{Rc, Weak};

use floating_core::{Middleware, Placement, Strategy};

/// Undo whatever a [`WhileElementsMounted`] callback set up.
pub type Cleanup = Box<dyn FnOnce()>;

/// Called with both elements once they are bound, and again every time either
/// changes. It must call [`Updater::update`] whenever something relevant to
/// positioning changes (scroll, resize, layout) and return a [`Cleanup`] that
/// removes everything it installed.
pub type WhileElementsMounted<R, F> = Rc<dyn Fn(&R, &F, Updater) -> Cleanup>;

/// Whatever an [`Updater`] points at.
pub(crate) trait Refresh {
    fn refresh(&self);
}

struct Detached;

impl Refresh for Detached {
    fn refresh(&self) {}
}

/// Handle that re-runs a controller's position computation.
///
/// Holds the controller weakly: once the controller is dropped, `update` does
/// nothing.
#[derive(Clone)]
pub struct Updater {
    target: Weak<dyn Refresh>,
}

impl Updater {
    pub(crate) fn new(target: Weak<dyn Refresh>) -> Self {
        Self { target }
    }

    /// An updater attached to nothing.
    #[must_use]
    pub fn detached() -> Self {
        let target: Weak<dyn Refresh> = Weak::<Detached>::new();
        Self { target }
    }

    /// Request a new position computation.
    pub fn update(&self) {
        if let Some(target) = self.target.upgrade() {
            target.refresh();
        }
    }

    /// Whether the controller is still alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.target.strong_count() > 0
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Options for a floating controller.
///
/// `R` is the reference element type and `F` the floating element type.
pub struct FloatingOptions<R, F> {
    /// Open/closed state of the floating element. `None` leaves the
    /// positioned flag alone when visibility changes.
    pub open: Option<bool>,
    /// Requested placement; the engine may settle on another (flip).
    pub placement: Placement,
    pub strategy: Strategy,
    /// Applied by the engine in order.
    pub middleware: Vec<Middleware>,
    /// Position with `transform: translate(..)` instead of `left`/`top`.
    pub transform: bool,
    pub while_elements_mounted: Option<WhileElementsMounted<R, F>>,
}

impl<R, F> Default for FloatingOptions<R, F> {
    fn default() -> Self {
        Self {
            open: Some(true),
            placement: Placement::Bottom,
            strategy: Strategy::Absolute,
            middleware: Vec::new(),
            transform: true,
            while_elements_mounted: None,
        }
    }
}

impl<R, F> Clone for FloatingOptions<R, F> {
    fn clone(&self) -> Self {
        Self {
            open: self.open,
            placement: self.placement,
            strategy: self.strategy,
            middleware: self.middleware.clone(),
            transform: self.transform,
            while_elements_mounted: self.while_elements_mounted.clone(),
        }
    }
}

impl<R, F> fmt::Debug for FloatingOptions<R, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FloatingOptions")
            .field("open", &self.open)
            .field("placement", &self.placement)
            .field("strategy", &self.strategy)
            .field("middleware", &self.middleware)
            .field("transform", &self.transform)
            .field(
                "while_elements_mounted",
                &self.while_elements_mounted.is_some(),
            )
            .finish()
    }
}

impl<R, F> FloatingOptions<R, F> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn open(mut self, open: bool) -> Self {
        self.open = Some(open);
        self
    }

    /// Do not track open/closed state.
    #[must_use]
    pub fn without_open(mut self) -> Self {
        self.open = None;
        self
    }

    #[must_use]
    pub fn placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    #[must_use]
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    #[must_use]
    pub fn middleware(mut self, middleware: Vec<Middleware>) -> Self {
        self.middleware = middleware;
        self
    }

    /// Append one middleware to the pipeline.
    #[must_use]
    pub fn with_middleware(mut self, middleware: Middleware) -> Self {
        self.middleware.push(middleware);
        self
    }

    #[must_use]
    pub fn transform(mut self, transform: bool) -> Self {
        self.transform = transform;
        self
    }

    #[must_use]
    pub fn while_elements_mounted(
        mut self,
        callback: impl Fn(&R, &F, Updater) -> Cleanup + 'static,
    ) -> Self {
        self.while_elements_mounted = Some(Rc::new(callback));
        self
    }
}
