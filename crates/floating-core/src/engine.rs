#![forbid(unsafe_code)]

//! Seams to the external positioning engine and the host's element types.
//!
//! The engine is opaque: it receives the two elements and a
//! [`ComputePositionConfig`] and eventually yields a
//! [`ComputePositionReturn`]. Nothing here knows how placement is computed.

use std::rc::Rc;

use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::middleware::{Middleware, MiddlewareData};
use crate::placement::{Placement, Strategy};

/// An element that can be positioned.
///
/// Only the rendering context's device pixel ratio is needed here; every
/// other element property is the engine's business.
pub trait FloatingElement {
    /// Physical pixels per CSS pixel for the element's window, if known.
    fn device_pixel_ratio(&self) -> Option<f64>;
}

impl<T: FloatingElement + ?Sized> FloatingElement for &T {
    fn device_pixel_ratio(&self) -> Option<f64> {
        (**self).device_pixel_ratio()
    }
}

impl<T: FloatingElement + ?Sized> FloatingElement for Rc<T> {
    fn device_pixel_ratio(&self) -> Option<f64> {
        (**self).device_pixel_ratio()
    }
}

/// Input to a single position computation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComputePositionConfig {
    pub placement: Placement,
    pub strategy: Strategy,
    pub middleware: Vec<Middleware>,
}

/// Result of a single position computation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputePositionReturn {
    pub x: f64,
    pub y: f64,
    /// Final placement, which may differ from the requested one (flip).
    pub placement: Placement,
    pub strategy: Strategy,
    #[serde(default)]
    pub middleware_data: MiddlewareData,
}

/// Pending result of [`PositionEngine::compute_position`].
pub type PositionFuture = LocalBoxFuture<'static, Result<ComputePositionReturn>>;

/// The external positioning engine.
///
/// `R` is the reference element type, `F` the floating element type. The
/// returned future must not borrow from the arguments.
pub trait PositionEngine<R, F> {
    fn compute_position(
        &self,
        reference: &R,
        floating: &F,
        config: ComputePositionConfig,
    ) -> PositionFuture;
}

impl<R, F, Func> PositionEngine<R, F> for Func
where
    Func: Fn(&R, &F, ComputePositionConfig) -> PositionFuture,
{
    fn compute_position(
        &self,
        reference: &R,
        floating: &F,
        config: ComputePositionConfig,
    ) -> PositionFuture {
        self(reference, floating, config)
    }
}
