#![forbid(unsafe_code)]

//! JSON shapes exchanged with the `FloatingUIDOM` global.
//!
//! Values cross the JS boundary as JSON text, so everything here is plain
//! serde and runs (and is tested) on any target.

use floating_core::{
    ComputePositionConfig, ComputePositionReturn, FloatingError, LimitShift, Result,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Name of the global object the engine is looked up on.
pub const GLOBAL_NAMESPACE: &str = "FloatingUIDOM";

/// Options passed to `FloatingUIDOM.autoUpdate`.
///
/// Defaults match the engine's: everything on except per-frame polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoUpdateOptions {
    /// Update when any scroll ancestor scrolls.
    pub ancestor_scroll: bool,
    /// Update when any scroll ancestor resizes.
    pub ancestor_resize: bool,
    /// Update when either element resizes.
    pub element_resize: bool,
    /// Update when the reference moves on screen.
    pub layout_shift: bool,
    /// Update on every animation frame. Expensive; use for animated anchors.
    pub animation_frame: bool,
}

impl Default for AutoUpdateOptions {
    fn default() -> Self {
        Self {
            ancestor_scroll: true,
            ancestor_resize: true,
            element_resize: true,
            layout_shift: true,
            animation_frame: false,
        }
    }
}

impl AutoUpdateOptions {
    #[must_use]
    pub fn ancestor_scroll(mut self, on: bool) -> Self {
        self.ancestor_scroll = on;
        self
    }

    #[must_use]
    pub fn ancestor_resize(mut self, on: bool) -> Self {
        self.ancestor_resize = on;
        self
    }

    #[must_use]
    pub fn element_resize(mut self, on: bool) -> Self {
        self.element_resize = on;
        self
    }

    #[must_use]
    pub fn layout_shift(mut self, on: bool) -> Self {
        self.layout_shift = on;
        self
    }

    #[must_use]
    pub fn animation_frame(mut self, on: bool) -> Self {
        self.animation_frame = on;
        self
    }

    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "ancestorScroll": self.ancestor_scroll,
            "ancestorResize": self.ancestor_resize,
            "elementResize": self.element_resize,
            "layoutShift": self.layout_shift,
            "animationFrame": self.animation_frame,
        })
    }
}

/// The `computePosition` options object, minus the middleware array which
/// has to be built from engine-side factories.
#[must_use]
pub fn call_options(config: &ComputePositionConfig) -> Value {
    json!({
        "placement": config.placement,
        "strategy": config.strategy,
    })
}

/// Argument for `FloatingUIDOM.limitShift`.
#[must_use]
pub fn limit_shift_options(limiter: &LimitShift) -> Value {
    json!({
        "offset": limiter.offset,
        "mainAxis": limiter.main_axis,
        "crossAxis": limiter.cross_axis,
    })
}

/// Decode the JSON text of a `computePosition` result.
pub fn parse_return(text: &str) -> Result<ComputePositionReturn> {
    serde_json::from_str(text)
        .map_err(|err| FloatingError::engine(format!("unexpected computePosition result: {err}")))
}

/// Qualified name of an engine export, for error messages.
#[must_use]
pub fn export_name(name: &str) -> String {
    format!("{GLOBAL_NAMESPACE}.{name}")
}
