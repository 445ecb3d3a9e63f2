// src/motion/trajectory.rs
//! Velocity profile construction for a single segment
//!
//! Builds the minimal-time piecewise-constant-acceleration profile (single
//! ramp, triangle or trapezoid) that carries the pen from an entry velocity
//! to a required exit velocity over a straight segment.
use serde::Serialize;

use super::EPS;
use super::vector::Vec2d;

/// Constant-acceleration motion primitive
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    /// Signed acceleration along the block (units/s²)
    pub acceleration: f64,

    /// Duration (seconds)
    pub duration: f64,

    /// Velocity at the start of the block (units/s)
    pub start_velocity: f64,

    pub start_point: Vec2d,
    pub end_point: Vec2d,
}

impl Block {
    pub fn new(
        acceleration: f64,
        duration: f64,
        start_velocity: f64,
        start_point: Vec2d,
        end_point: Vec2d,
    ) -> Self {
        Self {
            acceleration,
            duration,
            start_velocity,
            start_point,
            end_point,
        }
    }

    pub fn exit_velocity(&self) -> f64 {
        self.start_velocity + self.acceleration * self.duration
    }

    /// Distance covered according to the block's kinematics.
    pub fn distance(&self) -> f64 {
        self.distance_at(self.duration)
    }

    /// Distance covered `t` seconds into the block.
    pub fn distance_at(&self, t: f64) -> f64 {
        self.start_velocity * t + 0.5 * self.acceleration * t * t
    }

    /// Unit direction of travel; `None` for a zero-length block.
    pub fn direction(&self) -> Option<Vec2d> {
        (self.end_point - self.start_point).normalize().ok()
    }

    pub fn position_at(&self, t: f64) -> Vec2d {
        match self.direction() {
            Some(dir) => self.start_point + dir * self.distance_at(t),
            None => self.start_point,
        }
    }
}

/// Accelerate-then-decelerate profile with no cruise phase
#[derive(Debug, Clone)]
pub struct Triangle {
    /// Acceleration distance
    pub s1: f64,
    /// Deceleration distance
    pub s2: f64,
    pub t1: f64,
    pub t2: f64,
    pub peak_velocity: f64,
    pub start_velocity: f64,
    pub acceleration: f64,
    pub p1: Vec2d,
    pub p2: Vec2d,
    pub p3: Vec2d,
}

impl Triangle {
    /// Solve the triangle for a segment of length `s` from `p1` to `p3`.
    ///
    /// `s1` may come out negative (exit velocity unreachable) or larger than
    /// `s` (exit velocity out of reach); callers classify before using it.
    pub fn new(s: f64, vi: f64, vf: f64, a: f64, p1: Vec2d, p3: Vec2d) -> Self {
        let mut s1 = (2.0 * a * s + vf * vf - vi * vi) / (4.0 * a);
        if s1 < 0.0 && s1 > -EPS {
            s1 = 0.0;
        }
        let s2 = s - s1;
        let peak_velocity = (vi * vi + 2.0 * a * s1).max(0.0).sqrt();
        let t1 = ((peak_velocity - vi) / a).max(0.0);
        let t2 = ((vf - peak_velocity) / -a).max(0.0);
        let p2 = p1.linear_interpolate(&p3, s1);
        Self {
            s1,
            s2,
            t1,
            t2,
            peak_velocity,
            start_velocity: vi,
            acceleration: a,
            p1,
            p2,
            p3,
        }
    }

    pub fn blocks(&self) -> Vec<Block> {
        vec![
            Block::new(self.acceleration, self.t1, self.start_velocity, self.p1, self.p2),
            Block::new(-self.acceleration, self.t2, self.peak_velocity, self.p2, self.p3),
        ]
    }
}

/// Accelerate, cruise, decelerate
#[derive(Debug, Clone)]
pub struct Trapezoid {
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
    pub t1: f64,
    pub t2: f64,
    pub t3: f64,
    pub start_velocity: f64,
    pub cruise_velocity: f64,
    pub acceleration: f64,
    pub p1: Vec2d,
    pub p2: Vec2d,
    pub p3: Vec2d,
    pub p4: Vec2d,
}

impl Trapezoid {
    pub fn new(s: f64, vi: f64, vmax: f64, vf: f64, a: f64, p1: Vec2d, p4: Vec2d) -> Self {
        let t1 = ((vmax - vi) / a).max(0.0);
        let s1 = (vmax + vi) / 2.0 * t1;
        let t3 = ((vf - vmax) / -a).max(0.0);
        let s3 = (vf + vmax) / 2.0 * t3;
        let s2 = (s - s1 - s3).max(0.0);
        let t2 = s2 / vmax;
        let p2 = p1.linear_interpolate(&p4, s1);
        let p3 = p1.linear_interpolate(&p4, s - s3);
        Self {
            s1,
            s2,
            s3,
            t1,
            t2,
            t3,
            start_velocity: vi,
            cruise_velocity: vmax,
            acceleration: a,
            p1,
            p2,
            p3,
            p4,
        }
    }

    pub fn blocks(&self) -> Vec<Block> {
        vec![
            Block::new(self.acceleration, self.t1, self.start_velocity, self.p1, self.p2),
            Block::new(0.0, self.t2, self.cruise_velocity, self.p2, self.p3),
            Block::new(-self.acceleration, self.t3, self.cruise_velocity, self.p3, self.p4),
        ]
    }
}

/// Outcome of building the profile for one segment
#[derive(Debug, Clone)]
pub enum Profile {
    /// Exit velocity cannot be reached even braking the whole way; the entry
    /// velocity must be lowered to `max_entry_velocity`.
    Backtrack { max_entry_velocity: f64 },

    /// Too short to reach the requested exit velocity; a single acceleration
    /// ramp ending at `exit_velocity`.
    Ramp { block: Block, exit_velocity: f64 },

    Triangle(Triangle),

    Trapezoid(Trapezoid),
}

impl Profile {
    /// Blocks covering the segment; empty for `Backtrack`.
    pub fn blocks(&self) -> Vec<Block> {
        match self {
            Profile::Backtrack { .. } => Vec::new(),
            Profile::Ramp { block, .. } => vec![block.clone()],
            Profile::Triangle(tri) => tri.blocks(),
            Profile::Trapezoid(trap) => trap.blocks(),
        }
    }

    pub fn duration(&self) -> f64 {
        self.blocks().iter().map(|b| b.duration).sum()
    }
}

/// Per-segment profile builder for a fixed velocity cap and acceleration
#[derive(Debug, Clone)]
pub struct TrajectoryGenerator {
    /// Cruise velocity cap (units/s)
    max_velocity: f64,

    /// Acceleration magnitude (units/s²)
    acceleration: f64,
}

impl TrajectoryGenerator {
    pub fn new(max_velocity: f64, acceleration: f64) -> Self {
        Self {
            max_velocity,
            acceleration,
        }
    }

    /// Build the profile for a segment from `p1` to `p2` entered at
    /// `start_velocity` and required to leave at `end_velocity`.
    pub fn generate(&self, start_velocity: f64, end_velocity: f64, p1: Vec2d, p2: Vec2d) -> Profile {
        let a = self.acceleration;
        let s = p1.distance(&p2);
        let triangle = Triangle::new(s, start_velocity, end_velocity, a, p1, p2);

        if triangle.s1 < -EPS {
            return Profile::Backtrack {
                max_entry_velocity: (end_velocity * end_velocity + 2.0 * a * s).sqrt(),
            };
        }

        if triangle.s2 < 0.0 {
            let exit_velocity = (start_velocity * start_velocity + 2.0 * a * s).sqrt();
            let t = (exit_velocity - start_velocity) / a;
            return Profile::Ramp {
                block: Block::new(a, t, start_velocity, p1, p2),
                exit_velocity,
            };
        }

        if triangle.peak_velocity > self.max_velocity {
            return Profile::Trapezoid(Trapezoid::new(
                s,
                start_velocity,
                self.max_velocity,
                end_velocity,
                a,
                p1,
                p2,
            ));
        }

        Profile::Triangle(triangle)
    }
}
