#![forbid(unsafe_code)]

//! Reactive floating-element positioning.
//!
//! A [`FloatingState`] keeps a floating element (tooltip, popover, menu)
//! anchored to a reference element. It asks a [`PositionEngine`] for
//! coordinates whenever the placement options or the bound elements change,
//! and exposes the result as reactive state plus a ready-to-apply
//! [`FloatingStyles`] record.
//!
//! # Crates
//!
//! - `floating-core`: placements, middleware descriptors, the engine seam,
//!   style derivation.
//! - `floating-runtime`: the reactive graph and the controller.
//! - `floating-web`: DOM elements and the `FloatingUIDOM` engine (`wasm32`
//!   only, apart from the JSON shapes).
//!
//! # Example
//!
//! ```
//! use floating::prelude::*;
//! use futures::executor::LocalPool;
//! use futures::future::{self, FutureExt};
//!
//! #[derive(Clone, PartialEq)]
//! struct Node;
//!
//! impl FloatingElement for Node {
//!     fn device_pixel_ratio(&self) -> Option<f64> {
//!         Some(1.0)
//!     }
//! }
//!
//! let engine = |_: &Node, _: &Node, config: ComputePositionConfig| -> PositionFuture {
//!     future::ready(Ok(ComputePositionReturn {
//!         x: 12.4,
//!         y: 8.0,
//!         placement: config.placement,
//!         strategy: config.strategy,
//!         middleware_data: MiddlewareData::new(),
//!     }))
//!     .boxed_local()
//! };
//!
//! let mut pool = LocalPool::new();
//! let state = FloatingState::new(
//!     engine,
//!     pool.spawner(),
//!     FloatingOptions::new()
//!         .placement(Placement::BottomStart)
//!         .with_middleware(Middleware::offset(4.0))
//!         .transform(false),
//! );
//! state.set_reference(Some(Node));
//! state.set_floating(Some(Node));
//! pool.run_until_stalled();
//!
//! assert!(state.is_positioned());
//! assert_eq!(
//!     state.floating_styles().to_css(),
//!     "position: absolute; left: 12px; top: 8px;"
//! );
//! ```

pub use floating_core::{
    Alignment, ArrowData, ArrowOptions, Axis, ComputePositionConfig, ComputePositionReturn,
    Coords, FloatingElement, FloatingError, FloatingStyles, HideData, LimitShift, Middleware,
    MiddlewareData, OffsetData, Padding, Placement, PositionEngine, PositionFuture, Result, ShiftData, Side,
    SideObject, Strategy, floating_styles, round_by_dpr,
};
pub use floating_runtime::{
    Cleanup, Computed, Effect, FloatingOptions, FloatingState, Observable, ReadSignal,
    Subscription, Updater, WhileElementsMounted, batch, untrack,
};
pub use floating_web::AutoUpdateOptions;
#[cfg(target_arch = "wasm32")]
pub use floating_web::{
    DomElement, DomEngine, WasmSpawner, apply_styles, auto_update, dom_floating_state,
};

/// The names most consumers need.
pub mod prelude {
    pub use crate::{
        ArrowOptions, ComputePositionConfig, ComputePositionReturn, FloatingElement,
        FloatingOptions, FloatingState, FloatingStyles, Middleware, MiddlewareData, Padding,
        Placement, PositionEngine, PositionFuture, Strategy, Updater,
    };
    #[cfg(target_arch = "wasm32")]
    pub use crate::{DomElement, auto_update, dom_floating_state};
}
