#![forbid(unsafe_code)]

//! Small geometry records exchanged with the positioning engine.

use serde::{Deserialize, Serialize};

/// A point in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub x: f64,
    pub y: f64,
}

impl Coords {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One value per side, in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SideObject {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl SideObject {
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self {
            top: value,
            right: value,
            bottom: value,
            left: value,
        }
    }
}

/// Padding accepted by middleware: either one value for every side or a
/// partial per-side record (missing sides are zero).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Padding {
    All(f64),
    Sides(SideObject),
}

impl Padding {
    /// Expand to an explicit per-side record.
    #[must_use]
    pub const fn to_sides(self) -> SideObject {
        match self {
            Self::All(v) => SideObject::uniform(v),
            Self::Sides(sides) => sides,
        }
    }
}

impl Default for Padding {
    fn default() -> Self {
        Self::All(0.0)
    }
}

impl From<f64> for Padding {
    fn from(value: f64) -> Self {
        Self::All(value)
    }
}

impl From<SideObject> for Padding {
    fn from(sides: SideObject) -> Self {
        Self::Sides(sides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_expands() {
        assert_eq!(Padding::All(4.0).to_sides(), SideObject::uniform(4.0));
        let sides = SideObject {
            top: 1.0,
            ..SideObject::default()
        };
        assert_eq!(Padding::from(sides).to_sides().top, 1.0);
        assert_eq!(Padding::default().to_sides(), SideObject::uniform(0.0));
    }

    #[test]
    fn padding_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Padding::All(5.0)).unwrap(), "5.0");
        let parsed: Padding =
            serde_json::from_str(r#"{"top":1,"right":2,"bottom":3,"left":4}"#).unwrap();
        assert_eq!(parsed.to_sides().left, 4.0);
    }
}
