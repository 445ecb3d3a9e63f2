// src/motion/stepper.rs - Slicing plans into timed stepper moves
use serde::Serialize;

use crate::config::Config;

use super::MotionError;
use super::planner::Plan;
use super::vector::Vec2d;

/// Motion state at a specific time
#[derive(Debug, Clone, PartialEq)]
pub struct MotionState {
    /// Time since start of the plan (seconds)
    pub time: f64,

    pub position: Vec2d,

    /// Speed along the path (units/s)
    pub velocity: f64,

    /// Acceleration along the path (units/s²)
    pub acceleration: f64,
}

/// One timed move for the stepper driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StepMove {
    pub duration_ms: u32,
    pub steps_x: i32,
    pub steps_y: i32,
}

/// Consumer of timed step moves, e.g. the plotter's serial link.
pub trait StepTransport {
    /// Execute one move and return the device acknowledgment.
    fn stepper_move(&mut self, mv: &StepMove) -> Result<String, MotionError>;
}

/// Samples a plan at a fixed timeslice and converts displacement to steps.
#[derive(Debug, Clone)]
pub struct StepSlicer {
    steps_per_unit: f64,
    timeslice_ms: u32,
}

impl StepSlicer {
    pub fn new(steps_per_unit: f64, timeslice_ms: u32) -> Self {
        Self {
            steps_per_unit,
            timeslice_ms,
        }
    }

    pub fn new_from_config(config: &Config) -> Self {
        Self::new(config.stepper.steps_per_unit, config.stepper.timeslice_ms)
    }

    /// Convert a plan into moves of `timeslice_ms` each.
    ///
    /// Fractional steps are carried into the next slice per axis so the
    /// summed steps track the plan's total displacement.
    pub fn slice(&self, plan: &Plan) -> Vec<StepMove> {
        let mut moves = Vec::new();
        if self.timeslice_ms == 0 {
            return moves;
        }
        let mut cursor = plan.cursor();
        let Some(mut prev) = cursor.sample(0.0) else {
            return moves;
        };
        let step_s = self.timeslice_ms as f64 / 1000.0;
        let slices = (plan.total_time / step_s).ceil() as usize;
        let (mut error_x, mut error_y) = (0.0, 0.0);

        for k in 1..=slices {
            let Some(next) = cursor.sample(k as f64 * step_s) else {
                break;
            };
            let delta = next.position - prev.position;
            let fx = delta.x * self.steps_per_unit + error_x;
            let fy = delta.y * self.steps_per_unit + error_y;
            let (sx, sy) = (fx.trunc(), fy.trunc());
            error_x = fx - sx;
            error_y = fy - sy;
            moves.push(StepMove {
                duration_ms: self.timeslice_ms,
                steps_x: sx as i32,
                steps_y: sy as i32,
            });
            prev = next;
        }
        moves
    }

    /// Slice `plan` and feed every move to `transport`, stopping at the
    /// first failure. Returns the number of moves sent.
    pub fn stream<T: StepTransport>(&self, plan: &Plan, transport: &mut T) -> Result<usize, MotionError> {
        let moves = self.slice(plan);
        for (i, mv) in moves.iter().enumerate() {
            let ack = transport.stepper_move(mv).map_err(|e| {
                tracing::error!("Move {} of {} failed: {}", i + 1, moves.len(), e);
                e
            })?;
            tracing::trace!("Move {:?} acknowledged: {}", mv, ack.trim());
        }
        Ok(moves.len())
    }
}
