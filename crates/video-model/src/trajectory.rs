//! Motion vectors and camera trajectories.

use serde::{Deserialize, Serialize};

/// A 2-D displacement between two consecutive frames, in pixels.
///
/// Zero-valued when estimation was infeasible for a transition (missing
/// frame, too few channels, no trackable features, no survivors).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionVector {
    pub dx: f64,
    pub dy: f64,
}

impl MotionVector {
    pub const ZERO: MotionVector = MotionVector { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(&self) -> bool {
        self.dx == 0.0 && self.dy == 0.0
    }
}

/// A cumulative camera position at one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrajPoint {
    pub x: f64,
    pub y: f64,
}

impl TrajPoint {
    pub const ORIGIN: TrajPoint = TrajPoint { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Advance this position by a motion vector.
    pub fn advance(&self, vec: MotionVector) -> TrajPoint {
        TrajPoint {
            x: self.x + vec.dx,
            y: self.y + vec.dy,
        }
    }
}

impl std::ops::Sub for TrajPoint {
    type Output = TrajPoint;

    fn sub(self, rhs: TrajPoint) -> TrajPoint {
        TrajPoint {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

/// An ordered sequence of camera positions, one per frame.
pub type Trajectory = Vec<TrajPoint>;

/// Split a trajectory into its x and y channels.
pub fn split_axes(traj: &[TrajPoint]) -> (Vec<f64>, Vec<f64>) {
    let xs = traj.iter().map(|p| p.x).collect();
    let ys = traj.iter().map(|p| p.y).collect();
    (xs, ys)
}

/// Rebuild a trajectory from per-axis channels.
///
/// The channels must have equal length; this is an internal invariant of
/// the per-axis smoothing step.
pub fn join_axes(xs: &[f64], ys: &[f64]) -> Trajectory {
    debug_assert_eq!(xs.len(), ys.len());
    xs.iter()
        .zip(ys.iter())
        .map(|(&x, &y)| TrajPoint::new(x, y))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_advance_accumulates() {
        let p = TrajPoint::ORIGIN
            .advance(MotionVector::new(1.5, -2.0))
            .advance(MotionVector::new(0.5, 1.0));
        assert!((p.x - 2.0).abs() < 1e-12);
        assert!((p.y + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_split_join_round_trip() {
        let traj = vec![
            TrajPoint::new(0.0, 0.0),
            TrajPoint::new(1.0, -1.0),
            TrajPoint::new(2.5, 3.5),
        ];
        let (xs, ys) = split_axes(&traj);
        assert_eq!(join_axes(&xs, &ys), traj);
    }

    proptest! {
        #[test]
        fn prop_split_join_round_trip(
            points in prop::collection::vec((-1e6f64..1e6, -1e6f64..1e6), 0..200),
        ) {
            let traj: Trajectory = points
                .iter()
                .map(|&(x, y)| TrajPoint::new(x, y))
                .collect();
            let (xs, ys) = split_axes(&traj);
            prop_assert_eq!(join_axes(&xs, &ys), traj);
        }

        #[test]
        fn prop_advance_then_sub_recovers_motion(
            x in -1e6f64..1e6,
            y in -1e6f64..1e6,
            dx in -1e3f64..1e3,
            dy in -1e3f64..1e3,
        ) {
            let start = TrajPoint::new(x, y);
            let moved = start.advance(MotionVector::new(dx, dy));
            let delta = moved - start;
            prop_assert!((delta.x - dx).abs() < 1e-9);
            prop_assert!((delta.y - dy).abs() < 1e-9);
        }
    }
}
