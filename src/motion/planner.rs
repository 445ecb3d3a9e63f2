// src/motion/planner.rs - Segment planner: waypoints to a time-parameterized plan
use serde::Serialize;

use crate::config::Config;

use super::MotionError;
use super::junction::JunctionDeviation;
use super::stepper::MotionState;
use super::throttle::CurveThrottler;
use super::trajectory::{Profile, TrajectoryGenerator};
use super::vector::Vec2d;

pub use super::trajectory::Block;

/// Kinematic limits for one planning call
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Cruise velocity cap (units/s)
    pub max_velocity: f64,
    /// Acceleration magnitude (units/s²)
    pub acceleration: f64,
    /// Lateral deviation allowed at corners (units)
    pub corner_factor: f64,
    /// Curve throttler look-ahead time step (seconds)
    pub time_step: f64,
    /// Curve throttler deviation threshold (units)
    pub threshold: f64,
    /// Log every profile decision
    pub debug: bool,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_velocity: 4.0,
            acceleration: 16.0,
            corner_factor: 0.001,
            time_step: 0.02,
            threshold: 0.001,
            debug: false,
        }
    }
}

impl PlannerConfig {
    pub fn new_from_config(config: &Config) -> Self {
        Self {
            max_velocity: config.planner.max_velocity,
            acceleration: config.planner.acceleration,
            corner_factor: config.planner.corner_factor,
            time_step: config.throttle.time_step,
            threshold: config.throttle.threshold,
            debug: false,
        }
    }

    pub fn validate(&self) -> Result<(), MotionError> {
        let fields = [
            ("max_velocity", self.max_velocity),
            ("acceleration", self.acceleration),
            ("corner_factor", self.corner_factor),
            ("time_step", self.time_step),
            ("threshold", self.threshold),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(MotionError::Input(format!("{} must be finite, got {}", name, value)));
            }
        }
        if self.acceleration <= 0.0 {
            return Err(MotionError::Input(format!(
                "acceleration must be > 0, got {}",
                self.acceleration
            )));
        }
        if self.max_velocity <= 0.0 {
            return Err(MotionError::Input(format!(
                "max_velocity must be > 0, got {}",
                self.max_velocity
            )));
        }
        if self.corner_factor < 0.0 {
            return Err(MotionError::Input(format!(
                "corner_factor must be >= 0, got {}",
                self.corner_factor
            )));
        }
        if self.time_step <= 0.0 {
            return Err(MotionError::Input(format!(
                "time_step must be > 0, got {}",
                self.time_step
            )));
        }
        if self.threshold < 0.0 {
            return Err(MotionError::Input(format!(
                "threshold must be >= 0, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Directed edge between two consecutive waypoints
#[derive(Debug, Clone)]
pub struct Segment {
    pub p1: Vec2d,
    pub p2: Vec2d,
    /// Upper bound on the entry velocity from curvature and cornering
    pub max_entry_velocity: f64,
    /// Entry velocity the planner resolved
    pub entry_velocity: f64,
    pub blocks: Vec<Block>,
}

impl Segment {
    pub fn new(p1: Vec2d, p2: Vec2d) -> Self {
        Self {
            p1,
            p2,
            max_entry_velocity: 0.0,
            entry_velocity: 0.0,
            blocks: Vec::new(),
        }
    }

    pub fn length(&self) -> f64 {
        self.p1.distance(&self.p2)
    }

    pub fn direction(&self) -> Result<Vec2d, MotionError> {
        (self.p2 - self.p1).normalize()
    }
}

/// Ordered blocks for one path plus totals
#[derive(Debug, Clone, Default, Serialize)]
pub struct Plan {
    pub blocks: Vec<Block>,
    /// Seconds
    pub total_time: f64,
    pub total_length: f64,
}

impl Plan {
    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        let total_time = blocks.iter().map(|b| b.duration).sum();
        let total_length = blocks.iter().map(|b| b.distance()).sum();
        Self {
            blocks,
            total_time,
            total_length,
        }
    }

    /// Sample position and velocity `t` seconds into the plan.
    ///
    /// `t` is clamped to the plan's duration; `None` for an empty plan.
    pub fn instant(&self, t: f64) -> Option<MotionState> {
        self.cursor().sample(t)
    }

    /// Sampler for non-decreasing times that resumes from the last block.
    pub fn cursor(&self) -> PlanCursor<'_> {
        PlanCursor {
            blocks: &self.blocks,
            total_time: self.total_time,
            index: 0,
            elapsed: 0.0,
        }
    }
}

/// Walks a plan's blocks forward while sampling at increasing times
#[derive(Debug, Clone)]
pub struct PlanCursor<'a> {
    blocks: &'a [Block],
    total_time: f64,
    index: usize,
    /// Start time of `blocks[index]`
    elapsed: f64,
}

impl PlanCursor<'_> {
    /// Sample at `t`, clamped to the plan's duration.
    ///
    /// Times earlier than a previous sample resolve within the current
    /// block, so callers sample in non-decreasing order.
    pub fn sample(&mut self, t: f64) -> Option<MotionState> {
        let t = t.clamp(0.0, self.total_time);
        while self.index + 1 < self.blocks.len()
            && t > self.elapsed + self.blocks[self.index].duration
        {
            self.elapsed += self.blocks[self.index].duration;
            self.index += 1;
        }
        let block = self.blocks.get(self.index)?;
        let local = (t - self.elapsed).clamp(0.0, block.duration);
        Some(MotionState {
            time: t,
            position: block.position_at(local),
            velocity: block.start_velocity + block.acceleration * local,
            acceleration: block.acceleration,
        })
    }
}

/// Cursor state of the segment loop.
///
/// A `Forward` to `Backtrack` transition starts a new backtrack run; runs
/// are counted and logged per plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlannerState {
    Forward,
    Backtrack,
}

/// Turns a waypoint list into a `Plan`.
///
/// Holds no per-path state; each `plan` call owns its segment storage.
#[derive(Debug, Clone)]
pub struct MotionPlanner {
    config: PlannerConfig,
    junction_deviation: JunctionDeviation,
    trajectory: TrajectoryGenerator,
}

impl MotionPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self, MotionError> {
        config.validate()?;
        Ok(Self {
            junction_deviation: JunctionDeviation::new(config.corner_factor),
            trajectory: TrajectoryGenerator::new(config.max_velocity, config.acceleration),
            config,
        })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Build one segment per consecutive waypoint pair plus the zero-length
    /// terminal segment, with junction entry limits applied.
    pub fn build_segments(&self, points: &[Vec2d]) -> Result<Vec<Segment>, MotionError> {
        validate_points(points)?;

        let mut segments: Vec<Segment> = points
            .windows(2)
            .map(|pair| Segment::new(pair[0], pair[1]))
            .collect();
        let directions = segments
            .iter()
            .enumerate()
            .map(|(i, s)| {
                s.direction().map_err(|_| {
                    MotionError::Geometry(format!(
                        "segment {} from {} to {} has zero length",
                        i, s.p1, s.p2
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let throttler = CurveThrottler::new(
            points,
            self.config.time_step,
            self.config.threshold,
            self.config.max_velocity,
        );
        let curve_caps = throttler.compute_max_velocities();

        for k in 1..segments.len() {
            let corner = self.junction_deviation.calculate_junction_speed(
                &directions[k - 1],
                &directions[k],
                self.config.max_velocity,
                self.config.acceleration,
            );
            segments[k].max_entry_velocity = curve_caps[k].min(corner);
        }

        let last = points[points.len() - 1];
        segments.push(Segment::new(last, last));
        Ok(segments)
    }

    /// Build and resolve the segments for `points`; every segment except the
    /// terminal one carries its blocks.
    pub fn plan_segments(&self, points: &[Vec2d]) -> Result<Vec<Segment>, MotionError> {
        let mut segments = self.build_segments(points)?;
        let backtracks = self.resolve(&mut segments)?;
        tracing::debug!("Resolved {} segments with {} backtrack runs", segments.len(), backtracks);
        Ok(segments)
    }

    pub fn plan(&self, points: &[Vec2d]) -> Result<Plan, MotionError> {
        let segments = self.plan_segments(points)?;

        let blocks: Vec<Block> = segments
            .into_iter()
            .flat_map(|s| s.blocks)
            .collect();
        let plan = Plan::from_blocks(blocks);
        tracing::debug!(
            "Planned {} waypoints into {} blocks, {:.3}s over {:.3} units",
            points.len(),
            plan.blocks.len(),
            plan.total_time,
            plan.total_length
        );
        Ok(plan)
    }

    /// Walk the segments, building profiles and backing up one segment
    /// whenever the exit velocity cannot be honored. Returns the number of
    /// backtrack runs.
    fn resolve(&self, segments: &mut [Segment]) -> Result<usize, MotionError> {
        let max_iterations = 2 * (segments.len() + 1) * (segments.len() + 1);
        self.resolve_bounded(segments, max_iterations)
    }

    fn resolve_bounded(
        &self,
        segments: &mut [Segment],
        max_iterations: usize,
    ) -> Result<usize, MotionError> {
        let Some(last) = segments.len().checked_sub(1) else {
            return Ok(0);
        };
        let debug = self.config.debug;

        let mut state = PlannerState::Forward;
        let mut i = 0usize;
        let mut iterations = 0usize;
        let mut backtracks = 0usize;

        while i < last {
            iterations += 1;
            if iterations > max_iterations {
                return Err(MotionError::InfeasibleConstraint(format!(
                    "no stable profile after {} iterations over {} segments",
                    max_iterations,
                    segments.len()
                )));
            }

            let v_exit = segments[i + 1].max_entry_velocity;
            let segment = &segments[i];
            let profile = self.trajectory.generate(
                segment.entry_velocity,
                v_exit,
                segment.p1,
                segment.p2,
            );

            let next_state = match profile {
                Profile::Backtrack { max_entry_velocity } => {
                    if debug {
                        tracing::debug!(
                            "Segment {}: entry {:.4} too fast for exit {:.4}, limiting to {:.4}",
                            i,
                            segments[i].entry_velocity,
                            v_exit,
                            max_entry_velocity
                        );
                    }
                    let segment = &mut segments[i];
                    segment.max_entry_velocity = segment.max_entry_velocity.min(max_entry_velocity);
                    if i == 0 {
                        return Err(MotionError::InfeasibleConstraint(format!(
                            "first segment cannot reach exit velocity {:.4} from rest",
                            v_exit
                        )));
                    }
                    i -= 1;
                    PlannerState::Backtrack
                }
                Profile::Ramp { block, exit_velocity } => {
                    if debug {
                        tracing::debug!(
                            "Segment {}: single ramp, exit {:.4} instead of {:.4}",
                            i,
                            exit_velocity,
                            v_exit
                        );
                    }
                    segments[i].blocks = vec![block];
                    segments[i + 1].entry_velocity = exit_velocity;
                    i += 1;
                    PlannerState::Forward
                }
                Profile::Trapezoid(_) | Profile::Triangle(_) => {
                    if debug {
                        let kind = if matches!(profile, Profile::Trapezoid(_)) {
                            "trapezoid"
                        } else {
                            "triangle"
                        };
                        tracing::debug!("Segment {}: {} profile, exit {:.4}", i, kind, v_exit);
                    }
                    segments[i].blocks = profile.blocks();
                    segments[i + 1].entry_velocity = v_exit;
                    i += 1;
                    PlannerState::Forward
                }
            };

            match (state, next_state) {
                (PlannerState::Forward, PlannerState::Backtrack) => backtracks += 1,
                (PlannerState::Backtrack, PlannerState::Forward) if debug => {
                    tracing::debug!("Resuming forward pass at segment {}", i);
                }
                _ => {}
            }
            state = next_state;
        }
        Ok(backtracks)
    }
}

fn validate_points(points: &[Vec2d]) -> Result<(), MotionError> {
    if points.is_empty() {
        return Err(MotionError::Input("empty waypoint list".to_string()));
    }
    if let Some(p) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
        return Err(MotionError::Input(format!("non-finite waypoint {:?}", p)));
    }
    if points.len() == 1 || points.iter().all(|p| *p == points[0]) {
        return Err(MotionError::Input(format!(
            "path of {} point(s) has no extent",
            points.len()
        )));
    }
    Ok(())
}

/// Plan one path with the given limits.
pub fn plan(points: &[Vec2d], config: &PlannerConfig) -> Result<Plan, MotionError> {
    MotionPlanner::new(config.clone())?.plan(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<Vec2d> {
        raw.iter().map(|&(x, y)| Vec2d::new(x, y)).collect()
    }

    #[test]
    fn test_input_errors() {
        let config = PlannerConfig::default();
        assert!(matches!(plan(&[], &config), Err(MotionError::Input(_))));
        assert!(matches!(plan(&pts(&[(1.0, 1.0)]), &config), Err(MotionError::Input(_))));
        assert!(matches!(
            plan(&pts(&[(1.0, 1.0), (1.0, 1.0)]), &config),
            Err(MotionError::Input(_))
        ));
        assert!(matches!(
            plan(&pts(&[(0.0, 0.0), (f64::NAN, 1.0)]), &config),
            Err(MotionError::Input(_))
        ));
        let bad = PlannerConfig {
            acceleration: 0.0,
            ..PlannerConfig::default()
        };
        assert!(matches!(plan(&pts(&[(0.0, 0.0), (1.0, 0.0)]), &bad), Err(MotionError::Input(_))));
        let bad = PlannerConfig {
            corner_factor: -1.0,
            ..PlannerConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_duplicate_waypoint_is_geometry_error() {
        let config = PlannerConfig::default();
        let result = plan(&pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.0), (2.0, 0.0)]), &config);
        assert!(matches!(result, Err(MotionError::Geometry(_))));
    }

    #[test]
    fn test_segment_count_matches_waypoints() {
        let planner = MotionPlanner::new(PlannerConfig::default()).unwrap();
        let points = pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let segments = planner.build_segments(&points).unwrap();
        assert_eq!(segments.len(), points.len());
        let terminal = segments.last().unwrap();
        assert_eq!(terminal.p1, terminal.p2);
        assert_eq!(terminal.max_entry_velocity, 0.0);
        assert_eq!(segments[0].max_entry_velocity, 0.0);
        // right-angle corners are limited well below the cap
        assert!(segments[1].max_entry_velocity > 0.0);
        assert!(segments[1].max_entry_velocity < 4.0);
    }

    #[test]
    fn test_straight_junction_uses_full_velocity() {
        let planner = MotionPlanner::new(PlannerConfig::default()).unwrap();
        let segments = planner
            .build_segments(&pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]))
            .unwrap();
        assert!((segments[1].max_entry_velocity - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_reversal_junction_stops() {
        let planner = MotionPlanner::new(PlannerConfig::default()).unwrap();
        let segments = planner
            .build_segments(&pts(&[(0.0, 0.0), (1.0, 0.0), (0.0, 0.0)]))
            .unwrap();
        assert_eq!(segments[1].max_entry_velocity, 0.0);
    }

    #[test]
    fn test_single_triangle_total_time() {
        let config = PlannerConfig::default();
        let l = 0.5;
        let plan = plan(&pts(&[(0.0, 0.0), (l, 0.0)]), &config).unwrap();
        assert_eq!(plan.blocks.len(), 2);
        assert!((plan.total_time - 2.0 * (l / config.acceleration).sqrt()).abs() < 1e-9);
        assert!((plan.total_length - l).abs() < 1e-9);
    }

    #[test]
    fn test_backtracking_through_short_segments() {
        // long run into a tight hairpin made of short segments forces backtracking
        let config = PlannerConfig {
            corner_factor: 0.5,
            debug: true,
            ..PlannerConfig::default()
        };
        let points = pts(&[(0.0, 0.0), (5.0, 0.0), (5.01, 0.0), (5.02, 0.0), (5.03, 0.001), (0.0, 0.002)]);
        let planner = MotionPlanner::new(config).unwrap();
        let segments = planner.plan_segments(&points).unwrap();
        for pair in segments.windows(2) {
            if pair[1].blocks.is_empty() {
                continue;
            }
            let exit = pair[0].blocks.last().unwrap().exit_velocity();
            assert!((exit - pair[1].entry_velocity).abs() < 1e-6);
            assert!(pair[1].entry_velocity <= pair[1].max_entry_velocity + 1e-9);
        }
    }

    #[test]
    fn test_resolve_rejects_backtrack_before_first_segment() {
        let planner = MotionPlanner::new(PlannerConfig::default()).unwrap();
        let mut segments = planner
            .build_segments(&pts(&[(0.0, 0.0), (0.01, 0.0)]))
            .unwrap();
        // too fast to stop within 0.01 units
        segments[0].entry_velocity = 4.0;
        let result = planner.resolve(&mut segments);
        assert!(matches!(result, Err(MotionError::InfeasibleConstraint(_))));
        assert!(segments[0].max_entry_velocity <= (2.0f64 * 16.0 * 0.01).sqrt() + 1e-12);
        assert!(segments[0].blocks.is_empty());
    }

    #[test]
    fn test_resolve_iteration_bound() {
        let planner = MotionPlanner::new(PlannerConfig::default()).unwrap();
        let mut segments = planner
            .build_segments(&pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]))
            .unwrap();
        let result = planner.resolve_bounded(&mut segments, 1);
        assert!(matches!(result, Err(MotionError::InfeasibleConstraint(_))));

        let mut segments = planner
            .build_segments(&pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]))
            .unwrap();
        assert_eq!(planner.resolve_bounded(&mut segments, 2).unwrap(), 0);
    }

    #[test]
    fn test_backtrack_runs_are_counted() {
        // full speed into two short segments before the final stop
        let planner = MotionPlanner::new(PlannerConfig::default()).unwrap();
        let points = pts(&[(0.0, 0.0), (5.0, 0.0), (5.01, 0.0), (5.02, 0.0)]);
        let mut segments = planner.build_segments(&points).unwrap();
        assert_eq!(planner.resolve(&mut segments).unwrap(), 1);
        assert!((segments[1].max_entry_velocity - (2.0f64 * 16.0 * 0.02).sqrt()).abs() < 1e-9);
        assert!((segments[2].entry_velocity - (2.0f64 * 16.0 * 0.01).sqrt()).abs() < 1e-9);

        let mut straight = planner
            .build_segments(&pts(&[(0.0, 0.0), (0.5, 0.0)]))
            .unwrap();
        assert_eq!(planner.resolve(&mut straight).unwrap(), 0);
    }

    #[test]
    fn test_cursor_matches_instant() {
        let config = PlannerConfig::default();
        let points = pts(&[(0.0, 0.0), (3.0, 0.0), (3.0, 0.2), (2.9, 0.4), (0.0, 0.4)]);
        let plan = plan(&points, &config).unwrap();
        assert!(plan.blocks.len() > 4);
        let mut cursor = plan.cursor();
        let samples = 500;
        for k in 0..=samples + 10 {
            let t = k as f64 * plan.total_time / samples as f64;
            assert_eq!(cursor.sample(t), plan.instant(t), "mismatch at t={}", t);
        }
        assert!(Plan::default().cursor().sample(0.0).is_none());
    }

    #[test]
    fn test_instant_sampling() {
        let config = PlannerConfig::default();
        let plan = plan(&pts(&[(0.0, 0.0), (0.5, 0.0)]), &config).unwrap();
        let start = plan.instant(-1.0).unwrap();
        assert_eq!(start.position, Vec2d::new(0.0, 0.0));
        assert_eq!(start.velocity, 0.0);
        let mid = plan.instant(plan.total_time / 2.0).unwrap();
        assert!((mid.position.x - 0.25).abs() < 1e-9);
        assert!((mid.velocity - (16.0f64 * 0.5).sqrt()).abs() < 1e-9);
        let end = plan.instant(plan.total_time + 1.0).unwrap();
        assert!((end.position.x - 0.5).abs() < 1e-9);
        assert!(end.velocity.abs() < 1e-9);
        assert!(Plan::default().instant(0.0).is_none());
    }
}
