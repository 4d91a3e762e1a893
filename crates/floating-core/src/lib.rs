#![forbid(unsafe_code)]

//! Core: placement vocabulary, the positioning-engine seam, and style
//! derivation for floating elements.
//!
//! Nothing in this crate computes placement. The engine behind
//! [`PositionEngine`] does; this crate describes what is sent to it, what
//! comes back, and how the result becomes CSS.

pub mod engine;
pub mod error;
pub mod geometry;
pub mod middleware;
pub mod placement;
pub mod style;

pub use engine::{
    ComputePositionConfig, ComputePositionReturn, FloatingElement, PositionEngine, PositionFuture,
};
pub use error::{FloatingError, Result};
pub use geometry::{Coords, Padding, SideObject};
pub use middleware::{
    ArrowData, ArrowOptions, HideData, LimitShift, Middleware, MiddlewareData, OffsetData,
    ShiftData,
};
pub use placement::{Alignment, Axis, Placement, Side, Strategy};
pub use style::{
    FloatingStyles, WILL_CHANGE_DPR_THRESHOLD, device_pixel_ratio, floating_styles,
    round_by_dpr, round_by_element_dpr, round_half_up,
};
