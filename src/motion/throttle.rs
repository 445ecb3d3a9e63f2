// src/motion/throttle.rs - Curve-following speed limiter
use super::vector::Vec2d;

/// Bisection steps used when searching for the largest feasible velocity.
const SEARCH_ITERATIONS: usize = 16;

/// Limits the velocity at each waypoint so that one time step of travel
/// does not cut across the polyline by more than `threshold`.
#[derive(Debug, Clone)]
pub struct CurveThrottler<'a> {
    /// Look-ahead time step (seconds)
    time_step: f64,

    /// Waypoints of the path
    points: &'a [Vec2d],

    /// Maximum allowed deviation from the polyline (units)
    threshold: f64,

    /// Velocity cap (units/s)
    max_velocity: f64,

    /// Cumulative arc length at each waypoint
    distances: Vec<f64>,
}

impl<'a> CurveThrottler<'a> {
    pub fn new(points: &'a [Vec2d], time_step: f64, threshold: f64, max_velocity: f64) -> Self {
        let mut distances = Vec::with_capacity(points.len());
        let mut total = 0.0;
        let mut prev = points.first().copied().unwrap_or_default();
        for p in points {
            total += p.distance(&prev);
            distances.push(total);
            prev = *p;
        }
        Self {
            time_step,
            points,
            threshold,
            max_velocity,
            distances,
        }
    }

    /// Cumulative arc length from the start of the path to each waypoint.
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Index of the waypoint that starts the segment containing `distance`.
    fn lookup(&self, distance: f64) -> usize {
        self.distances
            .partition_point(|&d| d < distance)
            .saturating_sub(1)
    }

    /// Returns true if travelling from waypoint `index` at `velocity` for one
    /// time step stays within `threshold` of every waypoint passed over.
    pub fn is_feasible(&self, index: usize, velocity: f64) -> bool {
        let target_distance = self.distances[index] + velocity * self.time_step;
        let target_index = self.lookup(target_distance);
        if target_index <= index {
            return true;
        }

        let start = self.points[index];
        let segment_start = self.points[target_index];
        // Past the end of the path the plotter stops at the last waypoint.
        let target = match self.points.get(target_index + 1) {
            Some(segment_end) => segment_start
                .linear_interpolate(segment_end, target_distance - self.distances[target_index]),
            None => segment_start,
        };

        self.points[index + 1..target_index]
            .iter()
            .all(|p| p.segment_distance(&start, &target) <= self.threshold)
    }

    /// Largest feasible velocity at waypoint `index`, to within `max_velocity / 2^16`.
    pub fn compute_max_velocity(&self, index: usize) -> f64 {
        if self.is_feasible(index, self.max_velocity) {
            return self.max_velocity;
        }
        let mut low = 0.0;
        let mut high = self.max_velocity;
        for _ in 0..SEARCH_ITERATIONS {
            let velocity = (low + high) / 2.0;
            if self.is_feasible(index, velocity) {
                low = velocity;
            } else {
                high = velocity;
            }
        }
        low
    }

    pub fn compute_max_velocities(&self) -> Vec<f64> {
        (0..self.points.len())
            .map(|i| self.compute_max_velocity(i))
            .collect()
    }
}
