#![forbid(unsafe_code)]

//! Middleware descriptors and the data they report back.
//!
//! The positioning pipeline itself lives in the engine. A [`Middleware`] is a
//! declarative description of one step: a well-known name, JSON options, and
//! an optional opaque payload for values that cannot be serialized (the arrow
//! element). Engines interpret descriptors by name.
//!
//! Equality is structural on name and options and by identity on the payload,
//! so re-supplying an equal middleware list does not count as a change.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::geometry::Padding;
use crate::placement::{Alignment, Placement};

/// One step of the engine's positioning pipeline.
#[derive(Clone)]
pub struct Middleware {
    name: Cow<'static, str>,
    options: Value,
    payload: Option<Rc<dyn Any>>,
}

impl Middleware {
    /// Descriptor for a middleware the engine knows by `name`.
    #[must_use]
    pub fn custom(name: impl Into<Cow<'static, str>>, options: Value) -> Self {
        Self {
            name: name.into(),
            options,
            payload: None,
        }
    }

    /// Move the floating element away from the reference by `distance` along
    /// the placement side.
    #[must_use]
    pub fn offset(distance: f64) -> Self {
        Self::custom("offset", json!(distance))
    }

    /// Offset with separate main-axis, cross-axis and alignment-axis values.
    #[must_use]
    pub fn offset_axes(main_axis: f64, cross_axis: f64, alignment_axis: Option<f64>) -> Self {
        Self::custom(
            "offset",
            json!({
                "mainAxis": main_axis,
                "crossAxis": cross_axis,
                "alignmentAxis": alignment_axis,
            }),
        )
    }

    /// Flip to the opposite side when the preferred one overflows.
    #[must_use]
    pub fn flip() -> Self {
        Self::custom("flip", json!({}))
    }

    /// Flip, trying `fallbacks` in order.
    #[must_use]
    pub fn flip_with_fallbacks(fallbacks: &[Placement]) -> Self {
        let names: Vec<&str> = fallbacks.iter().map(|p| p.as_str()).collect();
        Self::custom("flip", json!({ "fallbackPlacements": names }))
    }

    /// Shift along the cross axis to stay in view.
    #[must_use]
    pub fn shift(padding: Padding) -> Self {
        Self::custom("shift", json!({ "padding": padding }))
    }

    /// Shift, with the engine's `limitShift` limiter keeping the floating
    /// element from detaching from the reference.
    #[must_use]
    pub fn shift_limited(padding: Padding, limiter: LimitShift) -> Self {
        Self::custom("shift", json!({ "padding": padding, "limiter": limiter }))
    }

    /// Report whether the reference is hidden or the floating element escaped.
    #[must_use]
    pub fn hide() -> Self {
        Self::custom("hide", json!({}))
    }

    /// Let the engine report available width and height.
    #[must_use]
    pub fn size(padding: Padding) -> Self {
        Self::custom("size", json!({ "padding": padding }))
    }

    /// Position against the client rects of an inline reference.
    #[must_use]
    pub fn inline() -> Self {
        Self::custom("inline", json!({}))
    }

    /// Choose the side with the most space, optionally constrained to an
    /// alignment.
    #[must_use]
    pub fn auto_placement(alignment: Option<Alignment>) -> Self {
        Self::custom("autoPlacement", json!({ "alignment": alignment }))
    }

    /// Position an arrow element inside the floating element.
    ///
    /// The element travels as the payload; engines downcast it to their own
    /// element type.
    #[must_use]
    pub fn arrow<E: 'static>(options: ArrowOptions<E>) -> Self {
        let payload: Rc<dyn Any> = Rc::new(options.element);
        Self {
            name: Cow::Borrowed("arrow"),
            options: json!({ "padding": options.padding }),
            payload: Some(payload),
        }
    }

    /// Replace the options record.
    #[must_use]
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn options(&self) -> &Value {
        &self.options
    }

    /// Limiter options of a `shift` descriptor built by
    /// [`Middleware::shift_limited`].
    #[must_use]
    pub fn limiter(&self) -> Option<LimitShift> {
        if self.name != "shift" {
            return None;
        }
        self.options
            .get("limiter")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// The payload, if it is of type `T`.
    #[must_use]
    pub fn payload<T: 'static>(&self) -> Option<&T> {
        self.payload.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

impl PartialEq for Middleware {
    fn eq(&self, other: &Self) -> bool {
        let same_payload = match (&self.payload, &other.payload) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b)),
            _ => false,
        };
        self.name == other.name && self.options == other.options && same_payload
    }
}

impl fmt::Debug for Middleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Middleware")
            .field("name", &self.name)
            .field("options", &self.options)
            .field("has_payload", &self.payload.is_some())
            .finish()
    }
}

/// Options for [`Middleware::arrow`].
#[derive(Debug, Clone)]
pub struct ArrowOptions<E> {
    /// The arrow element to position.
    pub element: E,
    /// Space kept between the arrow and the floating element's edges, useful
    /// with rounded corners.
    pub padding: Padding,
}

impl<E> ArrowOptions<E> {
    #[must_use]
    pub fn new(element: E) -> Self {
        Self {
            element,
            padding: Padding::default(),
        }
    }

    #[must_use]
    pub fn with_padding(mut self, padding: impl Into<Padding>) -> Self {
        self.padding = padding.into();
        self
    }
}

/// Options for the engine's `limitShift` limiter.
///
/// Defaults match the engine's: limit the main axis only, no offset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitShift {
    /// How far the floating element may travel past the reference edge.
    pub offset: f64,
    pub main_axis: bool,
    pub cross_axis: bool,
}

impl Default for LimitShift {
    fn default() -> Self {
        Self {
            offset: 0.0,
            main_axis: true,
            cross_axis: false,
        }
    }
}

impl LimitShift {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn main_axis(mut self, on: bool) -> Self {
        self.main_axis = on;
        self
    }

    #[must_use]
    pub fn cross_axis(mut self, on: bool) -> Self {
        self.cross_axis = on;
        self
    }
}

/// Data reported by middleware, keyed by middleware name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MiddlewareData(Map<String, Value>);

impl MiddlewareData {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.0.insert(name.into(), value);
    }

    /// Entry `name` decoded as `T`; `None` if absent or of another shape.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        self.0
            .get(name)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    #[must_use]
    pub fn arrow(&self) -> Option<ArrowData> {
        self.get_as("arrow")
    }

    #[must_use]
    pub fn offset(&self) -> Option<OffsetData> {
        self.get_as("offset")
    }

    #[must_use]
    pub fn shift(&self) -> Option<ShiftData> {
        self.get_as("shift")
    }

    #[must_use]
    pub fn hide(&self) -> Option<HideData> {
        self.get_as("hide")
    }
}

impl From<Map<String, Value>> for MiddlewareData {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowData {
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(default)]
    pub center_offset: f64,
    pub alignment_offset: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OffsetData {
    pub x: f64,
    pub y: f64,
    pub placement: Placement,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShiftData {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HideData {
    pub reference_hidden: Option<bool>,
    pub escaped: Option<bool>,
}
