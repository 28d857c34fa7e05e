//! Inter-frame motion estimation.
//!
//! Wraps a corner detector and a sparse flow tracker into a single
//! `estimate` call that returns the average backward displacement of
//! surviving correspondences, interpreted as the camera's motion
//! vector for that frame transition.
//!
//! Estimation degrades gracefully: any condition that makes tracking
//! infeasible (missing frame, too few channels, no corners, no
//! survivors) resolves to a zero vector instead of an error, so the
//! trajectory simply records "no detected motion" for that transition.

use hyperlapse_common::HyperlapseConfig;
use hyperlapse_video_model::{Frame, MotionVector};

use crate::features::{FeatureDetector, ShiTomasiDetector};
use crate::optical_flow::{FlowTracker, PyramidalLk, TrackStatus};

/// Estimates the 2-D camera displacement between consecutive frames.
pub struct MotionEstimator {
    detector: Box<dyn FeatureDetector>,
    tracker: Box<dyn FlowTracker>,
}

impl MotionEstimator {
    /// Create an estimator from explicit capability implementations.
    pub fn new(detector: Box<dyn FeatureDetector>, tracker: Box<dyn FlowTracker>) -> Self {
        Self { detector, tracker }
    }

    /// Create an estimator with the built-in Shi-Tomasi detector and
    /// pyramidal Lucas-Kanade tracker.
    pub fn from_config(config: &HyperlapseConfig) -> Self {
        Self::new(
            Box::new(ShiTomasiDetector::new(config.detector.clone())),
            Box::new(PyramidalLk::new(config.flow.clone())),
        )
    }

    /// Motion vector between two contiguous frames in a stream.
    pub fn estimate(&self, frame_a: Option<&Frame>, frame_b: Option<&Frame>) -> MotionVector {
        let (a, b) = match (frame_a, frame_b) {
            (Some(a), Some(b)) => (a, b),
            _ => return MotionVector::ZERO,
        };
        if a.channels() < 3 || b.channels() < 3 {
            return MotionVector::ZERO;
        }

        let gray_a = a.to_gray();
        let features = self.detector.detect(&gray_a);
        if features.is_empty() {
            return MotionVector::ZERO;
        }

        let gray_b = b.to_gray();
        let tracked = self.tracker.track(&gray_a, &gray_b, &features);

        // Backward displacement (A minus B) averaged over survivors.
        let mut sum_dx = 0.0f64;
        let mut sum_dy = 0.0f64;
        let mut survivors = 0usize;
        for (feat, hit) in features.iter().zip(tracked.iter()) {
            if hit.status != TrackStatus::Tracked {
                continue;
            }
            sum_dx += (feat.x - hit.x) as f64;
            sum_dy += (feat.y - hit.y) as f64;
            survivors += 1;
        }

        if survivors == 0 {
            return MotionVector::ZERO;
        }

        tracing::trace!(
            survivors,
            detected = features.len(),
            "Averaged backward displacement"
        );

        MotionVector::new(sum_dx / survivors as f64, sum_dy / survivors as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeaturePoint;
    use crate::optical_flow::TrackedPoint;
    use hyperlapse_video_model::GrayImage;

    /// Detector that reports a fixed set of points.
    struct FixedDetector(Vec<FeaturePoint>);

    impl FeatureDetector for FixedDetector {
        fn detect(&self, _image: &GrayImage) -> Vec<FeaturePoint> {
            self.0.clone()
        }
    }

    /// Tracker that shifts every point by a constant and marks a subset lost.
    struct ShiftTracker {
        dx: f32,
        dy: f32,
        lose_every: usize,
    }

    impl FlowTracker for ShiftTracker {
        fn track(
            &self,
            _prev: &GrayImage,
            _next: &GrayImage,
            features: &[FeaturePoint],
        ) -> Vec<TrackedPoint> {
            features
                .iter()
                .enumerate()
                .map(|(i, f)| TrackedPoint {
                    x: f.x + self.dx,
                    y: f.y + self.dy,
                    status: if self.lose_every > 0 && i % self.lose_every == 0 {
                        TrackStatus::Lost
                    } else {
                        TrackStatus::Tracked
                    },
                })
                .collect()
        }
    }

    fn rgb_frame(w: usize, h: usize) -> Frame {
        Frame::black(w, h, 3)
    }

    fn points(n: usize) -> Vec<FeaturePoint> {
        (0..n)
            .map(|i| FeaturePoint {
                x: 10.0 + i as f32 * 5.0,
                y: 20.0 + i as f32 * 3.0,
                score: 1.0,
            })
            .collect()
    }

    #[test]
    fn test_missing_frames_give_zero() {
        let est = MotionEstimator::from_config(&HyperlapseConfig::default());
        let frame = rgb_frame(64, 64);
        assert_eq!(est.estimate(None, Some(&frame)), MotionVector::ZERO);
        assert_eq!(est.estimate(Some(&frame), None), MotionVector::ZERO);
        assert_eq!(est.estimate(None, None), MotionVector::ZERO);
    }

    #[test]
    fn test_too_few_channels_give_zero() {
        let est = MotionEstimator::from_config(&HyperlapseConfig::default());
        let gray_frame = Frame::black(64, 64, 1);
        let rgb = rgb_frame(64, 64);
        assert_eq!(est.estimate(Some(&gray_frame), Some(&rgb)), MotionVector::ZERO);
        assert_eq!(est.estimate(Some(&rgb), Some(&gray_frame)), MotionVector::ZERO);
    }

    #[test]
    fn test_no_features_gives_zero() {
        let est = MotionEstimator::new(
            Box::new(FixedDetector(vec![])),
            Box::new(ShiftTracker {
                dx: 3.0,
                dy: 1.0,
                lose_every: 0,
            }),
        );
        let a = rgb_frame(64, 64);
        let b = rgb_frame(64, 64);
        assert_eq!(est.estimate(Some(&a), Some(&b)), MotionVector::ZERO);
    }

    #[test]
    fn test_all_lost_gives_zero() {
        let est = MotionEstimator::new(
            Box::new(FixedDetector(points(4))),
            Box::new(ShiftTracker {
                dx: 3.0,
                dy: 1.0,
                lose_every: 1, // every point lost
            }),
        );
        let a = rgb_frame(64, 64);
        let b = rgb_frame(64, 64);
        assert_eq!(est.estimate(Some(&a), Some(&b)), MotionVector::ZERO);
    }

    #[test]
    fn test_mean_backward_displacement() {
        // Tracker shifts features by (+3, -2): the camera moved the
        // opposite way, so the reported vector is (-3, +2).
        let est = MotionEstimator::new(
            Box::new(FixedDetector(points(6))),
            Box::new(ShiftTracker {
                dx: 3.0,
                dy: -2.0,
                lose_every: 0,
            }),
        );
        let a = rgb_frame(64, 64);
        let b = rgb_frame(64, 64);
        let vec = est.estimate(Some(&a), Some(&b));
        assert!((vec.dx + 3.0).abs() < 1e-6);
        assert!((vec.dy - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_lost_points_excluded_from_mean() {
        let est = MotionEstimator::new(
            Box::new(FixedDetector(points(6))),
            Box::new(ShiftTracker {
                dx: 2.0,
                dy: 0.0,
                lose_every: 2, // half the points lost
            }),
        );
        let a = rgb_frame(64, 64);
        let b = rgb_frame(64, 64);
        let vec = est.estimate(Some(&a), Some(&b));
        // Survivors all moved the same way, so the mean is unchanged.
        assert!((vec.dx + 2.0).abs() < 1e-6);
        assert!(vec.dy.abs() < 1e-6);
    }
}
