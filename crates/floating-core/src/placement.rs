#![forbid(unsafe_code)]

//! Placement, side, alignment and positioning strategy.
//!
//! These are the names the positioning engine speaks. The string forms
//! (`"bottom-start"`, `"fixed"`, ...) are the canonical wire names and are
//! used for `Display`, `FromStr` and serde.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::FloatingError;

/// One of the four sides of the reference element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Right,
    Bottom,
    Left,
}

impl Side {
    /// The side directly across from this one.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Top => Self::Bottom,
            Self::Right => Self::Left,
            Self::Bottom => Self::Top,
            Self::Left => Self::Right,
        }
    }

    /// The axis the floating element moves along when placed on this side.
    #[must_use]
    pub const fn axis(self) -> Axis {
        match self {
            Self::Top | Self::Bottom => Axis::Y,
            Self::Left | Self::Right => Axis::X,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::Right => "right",
            Self::Bottom => "bottom",
            Self::Left => "left",
        }
    }
}

/// Alignment along the cross axis of a [`Side`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Start,
    End,
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Where the floating element is anchored relative to the reference element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Placement {
    Top,
    TopStart,
    TopEnd,
    Right,
    RightStart,
    RightEnd,
    #[default]
    Bottom,
    BottomStart,
    BottomEnd,
    Left,
    LeftStart,
    LeftEnd,
}

impl Placement {
    /// All twelve placements, side-major in clockwise order.
    pub const ALL: [Self; 12] = [
        Self::Top,
        Self::TopStart,
        Self::TopEnd,
        Self::Right,
        Self::RightStart,
        Self::RightEnd,
        Self::Bottom,
        Self::BottomStart,
        Self::BottomEnd,
        Self::Left,
        Self::LeftStart,
        Self::LeftEnd,
    ];

    /// Build a placement from its side and optional alignment.
    #[must_use]
    pub const fn new(side: Side, alignment: Option<Alignment>) -> Self {
        match (side, alignment) {
            (Side::Top, None) => Self::Top,
            (Side::Top, Some(Alignment::Start)) => Self::TopStart,
            (Side::Top, Some(Alignment::End)) => Self::TopEnd,
            (Side::Right, None) => Self::Right,
            (Side::Right, Some(Alignment::Start)) => Self::RightStart,
            (Side::Right, Some(Alignment::End)) => Self::RightEnd,
            (Side::Bottom, None) => Self::Bottom,
            (Side::Bottom, Some(Alignment::Start)) => Self::BottomStart,
            (Side::Bottom, Some(Alignment::End)) => Self::BottomEnd,
            (Side::Left, None) => Self::Left,
            (Side::Left, Some(Alignment::Start)) => Self::LeftStart,
            (Side::Left, Some(Alignment::End)) => Self::LeftEnd,
        }
    }

    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::Top | Self::TopStart | Self::TopEnd => Side::Top,
            Self::Right | Self::RightStart | Self::RightEnd => Side::Right,
            Self::Bottom | Self::BottomStart | Self::BottomEnd => Side::Bottom,
            Self::Left | Self::LeftStart | Self::LeftEnd => Side::Left,
        }
    }

    #[must_use]
    pub const fn alignment(self) -> Option<Alignment> {
        match self {
            Self::Top | Self::Right | Self::Bottom | Self::Left => None,
            Self::TopStart | Self::RightStart | Self::BottomStart | Self::LeftStart => {
                Some(Alignment::Start)
            }
            Self::TopEnd | Self::RightEnd | Self::BottomEnd | Self::LeftEnd => {
                Some(Alignment::End)
            }
        }
    }

    /// Same alignment, opposite side (what a flip produces).
    #[must_use]
    pub const fn opposite(self) -> Self {
        Self::new(self.side().opposite(), self.alignment())
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Top => "top",
            Self::TopStart => "top-start",
            Self::TopEnd => "top-end",
            Self::Right => "right",
            Self::RightStart => "right-start",
            Self::RightEnd => "right-end",
            Self::Bottom => "bottom",
            Self::BottomStart => "bottom-start",
            Self::BottomEnd => "bottom-end",
            Self::Left => "left",
            Self::LeftStart => "left-start",
            Self::LeftEnd => "left-end",
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Placement {
    type Err = FloatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| FloatingError::InvalidPlacement {
                value: s.to_string(),
            })
    }
}

/// CSS positioning mode for the floating element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Absolute,
    Fixed,
}

impl Strategy {
    /// Value for the CSS `position` property.
    #[must_use]
    pub const fn as_css(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Fixed => "fixed",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_css())
    }
}

impl FromStr for Strategy {
    type Err = FloatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "absolute" => Ok(Self::Absolute),
            "fixed" => Ok(Self::Fixed),
            other => Err(FloatingError::InvalidStrategy {
                value: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_placement_is_bottom() {
        assert_eq!(Placement::default(), Placement::Bottom);
        assert_eq!(Strategy::default(), Strategy::Absolute);
    }

    #[test]
    fn side_and_alignment_decompose() {
        for placement in Placement::ALL {
            let rebuilt = Placement::new(placement.side(), placement.alignment());
            assert_eq!(rebuilt, placement);
        }
        assert_eq!(Placement::TopStart.side(), Side::Top);
        assert_eq!(Placement::LeftEnd.alignment(), Some(Alignment::End));
        assert_eq!(Placement::Right.alignment(), None);
    }

    #[test]
    fn opposite_keeps_alignment() {
        assert_eq!(Placement::BottomStart.opposite(), Placement::TopStart);
        assert_eq!(Placement::Left.opposite(), Placement::Right);
        assert_eq!(Side::Top.axis(), Axis::Y);
        assert_eq!(Side::Left.axis(), Axis::X);
    }

    #[test]
    fn parse_accepts_every_wire_name() {
        for placement in Placement::ALL {
            assert_eq!(placement.as_str().parse::<Placement>().unwrap(), placement);
        }
        assert!(matches!(
            "middle".parse::<Placement>(),
            Err(FloatingError::InvalidPlacement { .. })
        ));
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&Placement::BottomEnd).unwrap();
        assert_eq!(json, "\"bottom-end\"");
        let back: Placement = serde_json::from_str("\"right-start\"").unwrap();
        assert_eq!(back, Placement::RightStart);
        assert_eq!(serde_json::to_string(&Strategy::Fixed).unwrap(), "\"fixed\"");
    }

    #[test]
    fn strategy_parse_and_css() {
        assert_eq!("fixed".parse::<Strategy>().unwrap(), Strategy::Fixed);
        assert_eq!(Strategy::Absolute.as_css(), "absolute");
        assert!("sticky".parse::<Strategy>().is_err());
    }
}
