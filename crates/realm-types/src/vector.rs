//! Continuous 2D world-space coordinates.
//!
//! Positions are `f64` pairs. Waypoints produced by the navigator sit on
//! integer grid coordinates; characters between waypoints hold fractional
//! positions. [`Vec2::rounded`] recovers the grid cell a character occupies.

use core::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point or displacement in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vec2 {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Vec2 {
    /// The origin.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Create a vector from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to `other`.
    pub fn distance(self, other: Self) -> f64 {
        (other - self).length()
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalized(self) -> Option<Self> {
        let len = self.length();
        if len > f64::EPSILON {
            Some(Self::new(self.x / len, self.y / len))
        } else {
            None
        }
    }

    /// Whether `other` lies within `range` of this point (closed interval).
    pub fn is_in_range(self, other: Self, range: f64) -> bool {
        self.distance(other) <= range + RANGE_TOLERANCE
    }

    /// Snap to the nearest integer grid coordinate.
    pub fn rounded(self) -> Self {
        Self::new(self.x.round(), self.y.round())
    }

    /// Whether both components are finite numbers.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Slack applied to range checks so grid-snapped positions compare stably.
const RANGE_TOLERANCE: f64 = 1e-9;

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl core::fmt::Display for Vec2 {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
