#![forbid(unsafe_code)]

//! Style derivation for the floating element.
//!
//! [`FloatingStyles::compute`] is a pure projection of
//! `{strategy, x, y, transform, device pixel ratio}` onto the CSS the host
//! applies to the floating element. Coordinates are snapped to physical
//! pixels first so that text and borders stay crisp on high-density displays.
//!
//! # Invariants
//!
//! 1. Identical inputs produce identical output.
//! 2. Without a floating element the output is `position: <strategy>;
//!    left: 0; top: 0` whatever the coordinates.
//! 3. Transform mode never moves `left`/`top` away from `0`; offset mode never
//!    emits `transform` or `will-change`.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::engine::FloatingElement;
use crate::placement::Strategy;

/// Device pixel ratio at or above which the floating element is promoted to
/// its own compositing layer in transform mode.
pub const WILL_CHANGE_DPR_THRESHOLD: f64 = 1.5;

/// The element's device pixel ratio, `1.0` when unknown or not a positive
/// finite number.
#[must_use]
pub fn device_pixel_ratio<F: FloatingElement + ?Sized>(element: &F) -> f64 {
    sanitize_dpr(element.device_pixel_ratio())
}

fn sanitize_dpr(dpr: Option<f64>) -> f64 {
    match dpr {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 1.0,
    }
}

/// Round to the nearest integer; half-way values round toward positive
/// infinity.
///
/// Works from the floor rather than adding `0.5` first, which would round
/// `0.49999999999999994` and odd integers above 2^52 up by one.
#[inline]
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    let floor = value.floor();
    if value - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}

/// Snap `value` (CSS pixels) to the nearest physical pixel boundary.
#[inline]
#[must_use]
pub fn round_by_dpr(value: f64, dpr: f64) -> f64 {
    let dpr = sanitize_dpr(Some(dpr));
    round_half_up(value * dpr) / dpr
}

/// [`round_by_dpr`] using the element's own ratio.
#[must_use]
pub fn round_by_element_dpr<F: FloatingElement + ?Sized>(element: &F, value: f64) -> f64 {
    round_by_dpr(value, device_pixel_ratio(element))
}

/// CSS applied to the floating element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatingStyles {
    pub position: Strategy,
    pub top: String,
    pub left: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub transform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub will_change: Option<String>,
}

impl FloatingStyles {
    /// Neutral style used before a floating element is bound.
    #[must_use]
    pub fn initial(strategy: Strategy) -> Self {
        Self {
            position: strategy,
            top: "0".to_string(),
            left: "0".to_string(),
            transform: None,
            will_change: None,
        }
    }

    /// Derive the style record.
    ///
    /// `device_pixel_ratio` is `None` when no floating element is bound, and
    /// the bound element's ratio otherwise. Ratios that are not positive and
    /// finite count as `1.0`.
    #[must_use]
    pub fn compute(
        strategy: Strategy,
        x: f64,
        y: f64,
        transform: bool,
        device_pixel_ratio: Option<f64>,
    ) -> Self {
        let Some(dpr) = device_pixel_ratio else {
            return Self::initial(strategy);
        };
        let dpr = sanitize_dpr(Some(dpr));
        let x = css_number(round_by_dpr(x, dpr));
        let y = css_number(round_by_dpr(y, dpr));

        if transform {
            return Self {
                transform: Some(format!("translate({x}px, {y}px)")),
                will_change: (dpr >= WILL_CHANGE_DPR_THRESHOLD).then(|| "transform".to_string()),
                ..Self::initial(strategy)
            };
        }

        Self {
            position: strategy,
            top: format!("{y}px"),
            left: format!("{x}px"),
            transform: None,
            will_change: None,
        }
    }

    /// Property/value pairs in declaration order, kebab-case names.
    #[must_use]
    pub fn declarations(&self) -> Vec<(&'static str, &str)> {
        let mut out = vec![
            ("position", self.position.as_css()),
            ("left", self.left.as_str()),
            ("top", self.top.as_str()),
        ];
        if let Some(transform) = &self.transform {
            out.push(("transform", transform.as_str()));
        }
        if let Some(will_change) = &self.will_change {
            out.push(("will-change", will_change.as_str()));
        }
        out
    }

    /// Inline `style` attribute text.
    #[must_use]
    pub fn to_css(&self) -> String {
        let mut css = String::new();
        for (name, value) in self.declarations() {
            if !css.is_empty() {
                css.push(' ');
            }
            let _ = write!(css, "{name}: {value};");
        }
        css
    }
}

/// Derive styles for an optional floating element.
#[must_use]
pub fn floating_styles<F: FloatingElement + ?Sized>(
    strategy: Strategy,
    x: f64,
    y: f64,
    transform: bool,
    floating: Option<&F>,
) -> FloatingStyles {
    FloatingStyles::compute(
        strategy,
        x,
        y,
        transform,
        floating.map(device_pixel_ratio),
    )
}

// Numbers print the way the host prints them: integral values without a
// fraction, and no negative zero.
fn css_number(value: f64) -> f64 {
    if value == 0.0 { 0.0 } else { value }
}
