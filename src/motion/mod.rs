// src/motion/mod.rs - Path planning for the two-axis plotter

pub mod vector;
pub mod throttle;
pub mod junction;
pub mod trajectory;
pub mod planner;
pub mod stepper;

use thiserror::Error;

pub use vector::Vec2d;
pub use throttle::CurveThrottler;
pub use junction::JunctionDeviation;
pub use trajectory::{Profile, TrajectoryGenerator};
pub use planner::{plan, Block, MotionPlanner, Plan, PlanCursor, PlannerConfig, Segment};
pub use stepper::{MotionState, StepMove, StepSlicer, StepTransport};

/// Numerical tolerance shared by the cornering model and profile classification.
pub const EPS: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum MotionError {
    #[error("Input error: {0}")]
    Input(String),
    #[error("Geometry error: {0}")]
    Geometry(String),
    #[error("Infeasible constraint: {0}")]
    InfeasibleConstraint(String),
    #[error("Transport error: {0}")]
    Transport(String),
}
