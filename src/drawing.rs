// src/drawing.rs - Pen strokes, travel moves and per-path planning
use serde::Serialize;

use crate::motion::{plan, MotionError, Plan, PlannerConfig, Vec2d};

/// One path the plotter follows with the pen either raised or lowered
#[derive(Debug, Clone, PartialEq)]
pub struct PenPath {
    pub points: Vec<Vec2d>,
    pub pen_up: bool,
}

impl PenPath {
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(&w[1])).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DrawingStats {
    /// Travel distance with the pen raised (excluding the move from the origin)
    pub up_length: f64,
    /// Drawing distance with the pen lowered
    pub down_length: f64,
}

/// Planning outcome for one pen path
#[derive(Debug)]
pub struct PathPlan {
    pub index: usize,
    pub pen_up: bool,
    pub result: Result<Plan, MotionError>,
}

/// Strokes to draw, interleaved with pen-up travel moves
#[derive(Debug, Clone, Default)]
pub struct Drawing {
    paths: Vec<PenPath>,
}

impl Drawing {
    /// Build a drawing from pen-down strokes, starting at the origin.
    pub fn new(strokes: Vec<Vec<Vec2d>>) -> Self {
        let mut paths = Vec::with_capacity(strokes.len() * 2);
        let mut position = Vec2d::new(0.0, 0.0);
        for stroke in strokes {
            let (Some(&first), Some(&last)) = (stroke.first(), stroke.last()) else {
                continue;
            };
            paths.push(PenPath {
                points: vec![position, first],
                pen_up: true,
            });
            paths.push(PenPath {
                points: stroke,
                pen_up: false,
            });
            position = last;
        }
        Self { paths }
    }

    pub fn paths(&self) -> &[PenPath] {
        &self.paths
    }

    pub fn stats(&self) -> DrawingStats {
        let mut stats = DrawingStats::default();
        for (i, path) in self.paths.iter().enumerate() {
            if path.pen_up {
                if i > 0 {
                    stats.up_length += path.length();
                }
            } else {
                stats.down_length += path.length();
            }
        }
        stats
    }

    /// Lower-left and upper-right corners over every point, travel included.
    pub fn bounds(&self) -> Option<(Vec2d, Vec2d)> {
        let mut points = self.paths.iter().flat_map(|p| p.points.iter());
        let first = *points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| {
            (
                Vec2d::new(lo.x.min(p.x), lo.y.min(p.y)),
                Vec2d::new(hi.x.max(p.x), hi.y.max(p.y)),
            )
        }))
    }

    /// Plan every path independently; a failing path does not stop the rest.
    pub fn plan_all(&self, config: &PlannerConfig) -> Vec<PathPlan> {
        let mut plans = Vec::with_capacity(self.paths.len());
        for (index, path) in self.paths.iter().enumerate() {
            if path.pen_up && path.length() == 0.0 {
                tracing::debug!("Skipping zero-length travel move {}", index);
                continue;
            }
            let result = plan(&path.points, config);
            if let Err(e) = &result {
                tracing::warn!("Failed to plan path {}: {}", index, e);
            }
            plans.push(PathPlan {
                index,
                pen_up: path.pen_up,
                result,
            });
        }
        plans
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke(raw: &[(f64, f64)]) -> Vec<Vec2d> {
        raw.iter().map(|&(x, y)| Vec2d::new(x, y)).collect()
    }

    #[test]
    fn test_travel_moves_are_inserted() {
        let drawing = Drawing::new(vec![
            stroke(&[(1.0, 0.0), (2.0, 0.0)]),
            vec![],
            stroke(&[(2.0, 3.0), (2.0, 4.0)]),
        ]);
        let paths = drawing.paths();
        assert_eq!(paths.len(), 4);
        assert!(paths[0].pen_up);
        assert_eq!(paths[0].points, stroke(&[(0.0, 0.0), (1.0, 0.0)]));
        assert!(!paths[1].pen_up);
        assert_eq!(paths[2].points, stroke(&[(2.0, 0.0), (2.0, 3.0)]));
    }

    #[test]
    fn test_stats_skip_initial_travel() {
        let drawing = Drawing::new(vec![
            stroke(&[(3.0, 4.0), (3.0, 5.0)]),
            stroke(&[(3.0, 7.0), (6.0, 11.0)]),
        ]);
        let stats = drawing.stats();
        assert_eq!(stats.up_length, 2.0);
        assert_eq!(stats.down_length, 1.0 + 5.0);
    }

    #[test]
    fn test_bounds() {
        let drawing = Drawing::new(vec![stroke(&[(-1.0, 2.0), (3.0, -4.0)])]);
        let (lo, hi) = drawing.bounds().unwrap();
        assert_eq!(lo, Vec2d::new(-1.0, -4.0));
        assert_eq!(hi, Vec2d::new(3.0, 2.0));
        assert!(Drawing::default().bounds().is_none());
    }
}
