// src/motion/junction.rs - Cornering velocity at segment junctions
use super::EPS;
use super::vector::Vec2d;

/// Junction deviation cornering model.
///
/// `corner_factor` is the lateral deviation allowed while rounding a corner;
/// larger values permit faster cornering.
#[derive(Debug, Clone)]
pub struct JunctionDeviation {
    pub corner_factor: f64,
}

impl JunctionDeviation {
    pub fn new(corner_factor: f64) -> Self {
        Self { corner_factor }
    }

    /// Maximum velocity through the junction between two segments, given
    /// their normalized direction vectors.
    ///
    /// Straight-through yields `max_velocity`, a full reversal yields 0, and
    /// the result never increases as the turn sharpens.
    pub fn calculate_junction_speed(
        &self,
        dir_in: &Vec2d,
        dir_out: &Vec2d,
        max_velocity: f64,
        acceleration: f64,
    ) -> f64 {
        let cosine = (-dir_in.dot(dir_out)).clamp(-1.0, 1.0);
        if cosine > 1.0 - EPS {
            return 0.0;
        }
        let sine = ((1.0 - cosine) / 2.0).sqrt();
        if (sine - 1.0).abs() < EPS {
            return max_velocity;
        }
        let v = ((acceleration * self.corner_factor * sine) / (1.0 - sine)).sqrt();
        v.min(max_velocity)
    }
}
