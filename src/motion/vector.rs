// src/motion/vector.rs - 2D point/vector math for plotter paths
use std::fmt;
use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

use super::MotionError;

/// A 2D point or displacement (plotter units, e.g. inches)
///
/// Serialized as a `[x, y]` pair so path files stay compact.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Vec2d {
    pub x: f64,
    pub y: f64,
}

impl From<[f64; 2]> for Vec2d {
    fn from(p: [f64; 2]) -> Self {
        Self { x: p[0], y: p[1] }
    }
}

impl From<Vec2d> for [f64; 2] {
    fn from(p: Vec2d) -> Self {
        [p.x, p.y]
    }
}

impl Vec2d {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn dot(&self, other: &Vec2d) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn distance(&self, other: &Vec2d) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn distance_squared(&self, other: &Vec2d) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }

    pub fn magnitude(&self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Unit vector in the same direction.
    ///
    /// A zero (or non-finite) vector has no direction and is reported as a
    /// geometry error instead of producing NaN components.
    pub fn normalize(&self) -> Result<Vec2d, MotionError> {
        let mag = self.magnitude();
        if mag == 0.0 || !mag.is_finite() {
            return Err(MotionError::Geometry(format!(
                "cannot normalize degenerate vector {}",
                self
            )));
        }
        Ok(Vec2d::new(self.x / mag, self.y / mag))
    }

    /// Point reached by moving `magnitude` units from `self` toward `to`.
    ///
    /// This is an arc-length step, not a fractional blend. Stepping toward the
    /// same point returns `self`.
    pub fn linear_interpolate(&self, to: &Vec2d, magnitude: f64) -> Vec2d {
        match (*to - *self).normalize() {
            Ok(direction) => *self + direction * magnitude,
            Err(_) => *self,
        }
    }

    /// Distance from `self` to the line segment `v`-`w` (not the infinite line).
    pub fn segment_distance(&self, v: &Vec2d, w: &Vec2d) -> f64 {
        let l2 = v.distance_squared(w);
        if l2 == 0.0 {
            return self.distance(v);
        }
        let t = (((self.x - v.x) * (w.x - v.x) + (self.y - v.y) * (w.y - v.y)) / l2).clamp(0.0, 1.0);
        let projection = Vec2d::new(v.x + t * (w.x - v.x), v.y + t * (w.y - v.y));
        self.distance(&projection)
    }
}

impl Add for Vec2d {
    type Output = Vec2d;

    fn add(self, other: Vec2d) -> Vec2d {
        Vec2d::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vec2d {
    type Output = Vec2d;

    fn sub(self, other: Vec2d) -> Vec2d {
        Vec2d::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<f64> for Vec2d {
    type Output = Vec2d;

    fn mul(self, scalar: f64) -> Vec2d {
        Vec2d::new(self.x * scalar, self.y * scalar)
    }
}

impl fmt::Display for Vec2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point(x={:.2}, y={:.2})", self.x, self.y)
    }
}
