//! Core coordinate types.

use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by the coordinate system registry and conversion helper.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordError {
    /// CRS string could not be mapped to a known identifier.
    #[error("Unsupported CRS: '{0}'")]
    UnsupportedCrs(String),

    /// Identifier is not one of the registered coordinate systems.
    #[error("Unsupported coordinate system identifier: {0}")]
    UnsupportedCoordinateSystem(i32),

    /// Neither a converter nor a chain of converters connects the pair.
    #[error("No converter from {from} to {to}")]
    NoConverter { from: i32, to: i32 },
}

/// A point in a specific coordinate system.
///
/// Arithmetic between two coordinates requires both to share the same
/// `system_identifier`. Mixing systems is a caller bug and panics; convert
/// through [`ConversionHelper`](super::ConversionHelper) first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// Identifier of the coordinate system the values are expressed in.
    pub system_identifier: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coord {
    /// Create a coordinate.
    pub fn new(system_identifier: i32, x: f64, y: f64, z: f64) -> Self {
        Self {
            system_identifier,
            x,
            y,
            z,
        }
    }

    /// Create a coordinate with `z = 0`.
    pub fn flat(system_identifier: i32, x: f64, y: f64) -> Self {
        Self::new(system_identifier, x, y, 0.0)
    }

    /// Euclidean distance in the x/y plane.
    ///
    /// # Panics
    ///
    /// Panics if the two coordinates use different systems.
    pub fn distance_2d(&self, other: &Coord) -> f64 {
        assert_same_system(self.system_identifier, other.system_identifier);
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}) @{}",
            self.x, self.y, self.z, self.system_identifier
        )
    }
}

#[inline]
#[track_caller]
fn assert_same_system(lhs: i32, rhs: i32) {
    assert_eq!(
        lhs, rhs,
        "coordinate system mismatch: {} vs {} (convert before combining)",
        lhs, rhs
    );
}

impl Add for Coord {
    type Output = Coord;

    #[track_caller]
    fn add(self, rhs: Coord) -> Coord {
        assert_same_system(self.system_identifier, rhs.system_identifier);
        Coord::new(
            self.system_identifier,
            self.x + rhs.x,
            self.y + rhs.y,
            self.z + rhs.z,
        )
    }
}

impl Sub for Coord {
    type Output = Coord;

    #[track_caller]
    fn sub(self, rhs: Coord) -> Coord {
        assert_same_system(self.system_identifier, rhs.system_identifier);
        Coord::new(
            self.system_identifier,
            self.x - rhs.x,
            self.y - rhs.y,
            self.z - rhs.z,
        )
    }
}

impl Mul<f64> for Coord {
    type Output = Coord;

    fn mul(self, factor: f64) -> Coord {
        Coord::new(
            self.system_identifier,
            self.x * factor,
            self.y * factor,
            self.z * factor,
        )
    }
}

/// Axis-aligned rectangle in a single coordinate system.
///
/// `top_left` and `bottom_right` follow the orientation of the source system,
/// so `top_left.y` is usually greater than `bottom_right.y` for projected
/// systems (y grows northwards). Containment checks handle either orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectCoord {
    pub top_left: Coord,
    pub bottom_right: Coord,
}

impl RectCoord {
    /// Create a rectangle from two corners.
    ///
    /// # Panics
    ///
    /// Panics if the corners use different coordinate systems.
    #[track_caller]
    pub fn new(top_left: Coord, bottom_right: Coord) -> Self {
        assert_same_system(top_left.system_identifier, bottom_right.system_identifier);
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Identifier shared by both corners.
    pub fn system_identifier(&self) -> i32 {
        self.top_left.system_identifier
    }

    pub fn width(&self) -> f64 {
        (self.bottom_right.x - self.top_left.x).abs()
    }

    pub fn height(&self) -> f64 {
        (self.bottom_right.y - self.top_left.y).abs()
    }

    pub fn min_x(&self) -> f64 {
        self.top_left.x.min(self.bottom_right.x)
    }

    pub fn max_x(&self) -> f64 {
        self.top_left.x.max(self.bottom_right.x)
    }

    pub fn min_y(&self) -> f64 {
        self.top_left.y.min(self.bottom_right.y)
    }

    pub fn max_y(&self) -> f64 {
        self.top_left.y.max(self.bottom_right.y)
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Coord {
        Coord::new(
            self.system_identifier(),
            self.top_left.x + 0.5 * (self.bottom_right.x - self.top_left.x),
            self.top_left.y + 0.5 * (self.bottom_right.y - self.top_left.y),
            0.0,
        )
    }

    /// Whether `coord` lies inside the rectangle (edges inclusive).
    ///
    /// # Panics
    ///
    /// Panics if `coord` is not in this rectangle's system.
    #[track_caller]
    pub fn contains(&self, coord: &Coord) -> bool {
        assert_same_system(self.system_identifier(), coord.system_identifier);
        (self.min_x()..=self.max_x()).contains(&coord.x)
            && (self.min_y()..=self.max_y()).contains(&coord.y)
    }

    /// Whether `other` lies entirely within this rectangle.
    #[track_caller]
    pub fn contains_rect(&self, other: &RectCoord) -> bool {
        self.contains(&other.top_left) && self.contains(&other.bottom_right)
    }

    /// Whether the two rectangles overlap (touching edges count).
    ///
    /// # Panics
    ///
    /// Panics if the rectangles use different systems.
    #[track_caller]
    pub fn intersects(&self, other: &RectCoord) -> bool {
        assert_same_system(self.system_identifier(), other.system_identifier());
        self.min_x() <= other.max_x()
            && other.min_x() <= self.max_x()
            && self.min_y() <= other.max_y()
            && other.min_y() <= self.max_y()
    }
}

impl fmt::Display for RectCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[({}, {}) - ({}, {})] @{}",
            self.top_left.x,
            self.top_left.y,
            self.bottom_right.x,
            self.bottom_right.y,
            self.system_identifier()
        )
    }
}
