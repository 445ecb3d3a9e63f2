// plotter-rs: trajectory planning for a two-axis pen plotter

pub mod config;
pub mod drawing;
pub mod motion;

pub use config::{load_config, Config, ConfigError};
pub use drawing::{Drawing, DrawingStats, PathPlan, PenPath};
pub use motion::{plan, Block, MotionError, Plan, PlannerConfig, Vec2d};
