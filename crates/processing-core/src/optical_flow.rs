//! Pyramidal sparse Lucas-Kanade optical flow.
//!
//! Tracks feature points from one grayscale frame into the next using
//! an iterative translation-only Lucas-Kanade solve at each level of a
//! coarse-to-fine image pyramid. Iteration at a level stops after a
//! fixed count or when the incremental update drops below epsilon.

use hyperlapse_common::FlowConfig;
use hyperlapse_video_model::GrayImage;

use crate::features::FeaturePoint;

/// Tracking outcome for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackStatus {
    /// Successfully tracked to a new position.
    Tracked,
    /// The solver diverged, hit a singular system, or the position left
    /// the image bounds.
    Lost,
}

/// A feature position after one frame-to-frame tracking pass.
#[derive(Debug, Clone, Copy)]
pub struct TrackedPoint {
    pub x: f32,
    pub y: f32,
    pub status: TrackStatus,
}

/// Capability seam for sparse flow tracking.
pub trait FlowTracker: Send + Sync {
    /// Track each feature from `prev` into `next`. The output has one
    /// entry per input feature, in order.
    fn track(&self, prev: &GrayImage, next: &GrayImage, features: &[FeaturePoint])
        -> Vec<TrackedPoint>;
}

/// An image pyramid: level 0 is the full-resolution image, each level
/// above halves both dimensions by 2x2 averaging.
pub struct Pyramid {
    levels: Vec<GrayImage>,
}

impl Pyramid {
    /// Build a pyramid with up to `max_level` reductions. Construction
    /// stops early once a level would fall under 16 pixels a side.
    pub fn build(base: &GrayImage, max_level: usize) -> Self {
        let mut levels = vec![base.clone()];
        for _ in 0..max_level {
            let Some(prev) = levels.last() else { break };
            let w = prev.width() / 2;
            let h = prev.height() / 2;
            if w < 16 || h < 16 {
                break;
            }
            let mut data = Vec::with_capacity(w * h);
            for y in 0..h {
                for x in 0..w {
                    let sum = prev.get(2 * x, 2 * y)
                        + prev.get(2 * x + 1, 2 * y)
                        + prev.get(2 * x, 2 * y + 1)
                        + prev.get(2 * x + 1, 2 * y + 1);
                    data.push(sum * 0.25);
                }
            }
            match GrayImage::new(w, h, data) {
                Ok(level) => levels.push(level),
                Err(_) => break,
            }
        }
        Self { levels }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, i: usize) -> &GrayImage {
        &self.levels[i]
    }
}

/// Pyramidal iterative Lucas-Kanade tracker.
pub struct PyramidalLk {
    config: FlowConfig,
}

impl PyramidalLk {
    pub fn new(config: FlowConfig) -> Self {
        Self { config }
    }

    /// Patch half-size derived from the configured window side length.
    fn half_window(&self) -> isize {
        (self.config.window_size / 2).max(1) as isize
    }

    /// One iterative LK solve at a single pyramid level, starting from
    /// displacement `(dx, dy)`. Gradients are evaluated at the warped
    /// position in the current frame each iteration.
    fn solve_level(
        &self,
        prev: &GrayImage,
        next: &GrayImage,
        feat_x: f32,
        feat_y: f32,
        mut dx: f32,
        mut dy: f32,
    ) -> Option<(f32, f32)> {
        let half = self.half_window();
        let eps2 = (self.config.epsilon * self.config.epsilon) as f32;

        for _ in 0..self.config.max_iterations {
            let mut h00 = 0.0f32;
            let mut h01 = 0.0f32;
            let mut h11 = 0.0f32;
            let mut b0 = 0.0f32;
            let mut b1 = 0.0f32;

            for py in -half..=half {
                for px in -half..=half {
                    let tx = feat_x + px as f32;
                    let ty = feat_y + py as f32;
                    let wx = tx + dx;
                    let wy = ty + dy;

                    let t_val = prev.sample_bilinear(tx, ty);
                    let i_val = next.sample_bilinear(wx, wy);
                    let e = t_val - i_val;

                    let gx = 0.5
                        * (next.sample_bilinear(wx + 1.0, wy)
                            - next.sample_bilinear(wx - 1.0, wy));
                    let gy = 0.5
                        * (next.sample_bilinear(wx, wy + 1.0)
                            - next.sample_bilinear(wx, wy - 1.0));

                    h00 += gx * gx;
                    h01 += gx * gy;
                    h11 += gy * gy;
                    b0 += gx * e;
                    b1 += gy * e;
                }
            }

            let det = h00 * h11 - h01 * h01;
            if det.abs() < 1e-6 {
                return None;
            }
            let inv_det = 1.0 / det;
            let delta_x = inv_det * (h11 * b0 - h01 * b1);
            let delta_y = inv_det * (h00 * b1 - h01 * b0);

            dx += delta_x;
            dy += delta_y;

            if delta_x * delta_x + delta_y * delta_y < eps2 {
                break;
            }
        }

        Some((dx, dy))
    }

    fn track_single(
        &self,
        prev_pyr: &Pyramid,
        next_pyr: &Pyramid,
        feature: &FeaturePoint,
    ) -> TrackedPoint {
        let num_levels = prev_pyr.num_levels().min(next_pyr.num_levels());

        let mut dx = 0.0f32;
        let mut dy = 0.0f32;

        for level in (0..num_levels).rev() {
            let scale = 1.0 / (1u32 << level) as f32;
            let feat_x = feature.x * scale;
            let feat_y = feature.y * scale;

            match self.solve_level(
                prev_pyr.level(level),
                next_pyr.level(level),
                feat_x,
                feat_y,
                dx,
                dy,
            ) {
                Some((new_dx, new_dy)) => {
                    dx = new_dx;
                    dy = new_dy;
                }
                None => {
                    return TrackedPoint {
                        x: feature.x + dx / scale,
                        y: feature.y + dy / scale,
                        status: TrackStatus::Lost,
                    };
                }
            }

            // Propagate displacement to the next finer level.
            if level > 0 {
                dx *= 2.0;
                dy *= 2.0;
            }
        }

        let new_x = feature.x + dx;
        let new_y = feature.y + dy;

        let w = prev_pyr.level(0).width() as f32;
        let h = prev_pyr.level(0).height() as f32;
        let status = if new_x >= 0.0 && new_x < w && new_y >= 0.0 && new_y < h {
            TrackStatus::Tracked
        } else {
            TrackStatus::Lost
        };

        TrackedPoint {
            x: new_x,
            y: new_y,
            status,
        }
    }
}

impl FlowTracker for PyramidalLk {
    fn track(
        &self,
        prev: &GrayImage,
        next: &GrayImage,
        features: &[FeaturePoint],
    ) -> Vec<TrackedPoint> {
        if features.is_empty() {
            return vec![];
        }

        let prev_pyr = Pyramid::build(prev, self.config.max_level);
        let next_pyr = Pyramid::build(next, self.config.max_level);

        features
            .iter()
            .map(|f| self.track_single(&prev_pyr, &next_pyr, f))
            .collect()
    }
}
