//! Trajectory accumulation, smoothing, and subsampling.
//!
//! The camera trajectory is built once in a forward pass, then shaped
//! in three steps:
//!
//! ```text
//! Trajectory ──savgol──> Smoothed ──stride k──> SubsampledSmoothed
//!     │                                              │
//!     └────────stride k──> Subsampled            savgol (again)
//!                              │                     │
//!                              └──── minus ────> CumulativeMotion
//!                                     │
//!                                     ▼
//!                             TransformTrajectory
//! ```
//!
//! The second smoothing pass exists because subsampling reintroduces
//! high-frequency jitter relative to the coarser timebase.

use hyperlapse_common::{HyperlapseError, HyperlapseResult};
use hyperlapse_video_model::{join_axes, split_axes, MotionVector, TrajPoint, Trajectory};

use crate::savgol::{savgol_filter, window_length};

/// Accumulates per-frame motion vectors into an absolute camera
/// trajectory. Built incrementally during the single forward pass.
#[derive(Debug)]
pub struct TrajectoryBuilder {
    position: TrajPoint,
    points: Trajectory,
}

impl TrajectoryBuilder {
    /// A builder whose trajectory starts at the origin.
    pub fn new() -> Self {
        Self {
            position: TrajPoint::ORIGIN,
            points: vec![TrajPoint::ORIGIN],
        }
    }

    /// Record the motion vector for the next frame transition.
    pub fn push_motion(&mut self, vec: MotionVector) {
        self.position = self.position.advance(vec);
        self.points.push(self.position);
    }

    /// Number of positions recorded so far (one per frame).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consume the builder, yielding the immutable trajectory.
    pub fn finish(self) -> Trajectory {
        self.points
    }
}

impl Default for TrajectoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Smooth a trajectory per axis with a Savitzky-Golay filter.
pub fn smooth_trajectory(traj: &[TrajPoint], window: usize, poly_order: usize) -> Trajectory {
    let (xs, ys) = split_axes(traj);
    let sx = savgol_filter(&xs, window, poly_order);
    let sy = savgol_filter(&ys, window, poly_order);
    join_axes(&sx, &sy)
}

/// Every k-th element starting at index 0 (a stride-k slice).
pub fn subsample<T: Clone>(series: &[T], k: usize) -> Vec<T> {
    series.iter().step_by(k.max(1)).cloned().collect()
}

/// Stride-k slices of the raw and smoothed trajectories.
///
/// A length mismatch means frames and corrective transforms would
/// silently misalign downstream; refuse to continue.
fn paired_subsample(
    raw: &[TrajPoint],
    smoothed: &[TrajPoint],
    k: usize,
) -> HyperlapseResult<(Trajectory, Trajectory)> {
    let sub_raw = subsample(raw, k);
    let sub_smoothed = subsample(smoothed, k);
    if sub_raw.len() != sub_smoothed.len() {
        return Err(HyperlapseError::consistency(format!(
            "subsampled trajectory lengths diverge: raw={} smoothed={}",
            sub_raw.len(),
            sub_smoothed.len()
        )));
    }
    Ok((sub_raw, sub_smoothed))
}

/// Everything derived from the raw trajectory in the smoothing stage.
#[derive(Debug, Clone)]
pub struct MotionPlan {
    /// Stride-k slice of the raw trajectory.
    pub subsampled: Trajectory,
    /// Stride-k slice of the smoothed trajectory.
    pub subsampled_smoothed: Trajectory,
    /// The subsampled smoothed trajectory, re-smoothed on the coarser
    /// timebase.
    pub cumulative_motion: Trajectory,
    /// Per-retained-frame corrective translation: subsampled minus
    /// cumulative motion. The only series the renderer consumes.
    pub transform: Trajectory,
    /// The smoothing window actually used.
    pub window: usize,
}

/// Run the dual-stage smoothing over a complete trajectory.
///
/// The same fps-derived window is used for both passes, matching the
/// established filter tuning even though the subsampled sequence has a
/// coarser timebase.
pub fn compute_motion_plan(
    trajectory: &[TrajPoint],
    fps: f64,
    speed_up: usize,
    smoothing_secs: f64,
    poly_order: usize,
) -> HyperlapseResult<MotionPlan> {
    let window = window_length(smoothing_secs, fps);
    tracing::debug!(window, fps, "Smoothing trajectory");

    let smoothed = smooth_trajectory(trajectory, window, poly_order);

    let (subsampled, subsampled_smoothed) = paired_subsample(trajectory, &smoothed, speed_up)?;

    tracing::debug!(window, samples = subsampled.len(), "Re-smoothing subsampled motion");
    let cumulative_motion = smooth_trajectory(&subsampled_smoothed, window, poly_order);

    let transform: Trajectory = subsampled
        .iter()
        .zip(cumulative_motion.iter())
        .map(|(&raw, &cum)| raw - cum)
        .collect();

    Ok(MotionPlan {
        subsampled,
        subsampled_smoothed,
        cumulative_motion,
        transform,
        window,
    })
}
