//! Stabilization planning: the crop-vs-overlay decision.
//!
//! Cancelling the smoothed trajectory translates every frame, which
//! costs border pixels. Up to a threshold the border is simply cropped
//! away; beyond it the planner trades the clean rectangular frame for
//! an overlay composite that keeps full resolution at the cost of
//! visible seams at the frame edges.

use hyperlapse_video_model::{RenderStrategy, StabilizationPlan, TrajPoint};

/// Derives a [`StabilizationPlan`] from a transform trajectory and the
/// source frame geometry. Deterministic: no randomness, no state.
pub struct StabilizationPlanner {
    crop_threshold: f64,
}

impl StabilizationPlanner {
    /// `crop_threshold` is the crop-ratio limit per axis, as a fraction
    /// of the frame dimension.
    pub fn new(crop_threshold: f64) -> Self {
        Self { crop_threshold }
    }

    /// Plan the render for the given transform trajectory.
    pub fn plan(&self, transform: &[TrajPoint], width: u32, height: u32) -> StabilizationPlan {
        let (x_crop, y_crop) = crop_extents(transform);

        let x_ratio = x_crop / width as f64;
        let y_ratio = y_crop / height as f64;

        let overlay = x_ratio > self.crop_threshold || y_ratio > self.crop_threshold;

        let (strategy, output_width, output_height) = if overlay {
            (RenderStrategy::Overlay, width, height)
        } else {
            // Truncate like the established integer conversion; floor at
            // 2x2 so a pathological trajectory cannot produce an empty frame.
            let out_w = ((width as f64 - 2.0 * x_crop) as u32).max(2);
            let out_h = ((height as f64 - 2.0 * y_crop) as u32).max(2);
            (RenderStrategy::Crop, out_w, out_h)
        };

        tracing::info!(
            x_crop,
            y_crop,
            x_pct = x_ratio * 100.0,
            y_pct = y_ratio * 100.0,
            strategy = ?strategy,
            output_width,
            output_height,
            "Stabilization plan"
        );

        StabilizationPlan {
            x_crop,
            y_crop,
            x_ratio,
            y_ratio,
            strategy,
            input_width: width,
            input_height: height,
            output_width,
            output_height,
        }
    }
}

/// Per-axis crop margin: the largest absolute excursion of the
/// transform trajectory. An empty trajectory needs no crop.
fn crop_extents(transform: &[TrajPoint]) -> (f64, f64) {
    let mut x_max = f64::NEG_INFINITY;
    let mut x_min = f64::INFINITY;
    let mut y_max = f64::NEG_INFINITY;
    let mut y_min = f64::INFINITY;

    for p in transform {
        x_max = x_max.max(p.x);
        x_min = x_min.min(p.x);
        y_max = y_max.max(p.y);
        y_min = y_min.min(p.y);
    }

    if transform.is_empty() {
        return (0.0, 0.0);
    }

    (x_max.abs().max(x_min.abs()), y_max.abs().max(y_min.abs()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_static_camera_selects_crop_with_full_frame() {
        let transform = vec![TrajPoint::ORIGIN; 20];
        let plan = StabilizationPlanner::new(0.215).plan(&transform, 1920, 1080);
        assert_eq!(plan.strategy, RenderStrategy::Crop);
        assert_eq!(plan.x_crop, 0.0);
        assert_eq!(plan.y_crop, 0.0);
        assert_eq!(plan.output_width, 1920);
        assert_eq!(plan.output_height, 1080);
        assert!(!plan.shrinks_frame());
    }

    #[test]
    fn test_excessive_x_crop_selects_overlay() {
        // x_crop = 500 > 0.215 * 1920 = 412.8, regardless of y.
        let transform = vec![
            TrajPoint::new(500.0, 0.0),
            TrajPoint::new(-120.0, 10.0),
            TrajPoint::new(30.0, -5.0),
        ];
        let plan = StabilizationPlanner::new(0.215).plan(&transform, 1920, 1080);
        assert_eq!(plan.strategy, RenderStrategy::Overlay);
        assert_eq!(plan.output_width, 1920);
        assert_eq!(plan.output_height, 1080);
    }

    #[test]
    fn test_crop_uses_largest_excursion_of_either_sign() {
        let transform = vec![TrajPoint::new(10.0, -40.0), TrajPoint::new(-25.0, 12.0)];
        let plan = StabilizationPlanner::new(0.215).plan(&transform, 1920, 1080);
        assert_eq!(plan.strategy, RenderStrategy::Crop);
        assert!((plan.x_crop - 25.0).abs() < 1e-12);
        assert!((plan.y_crop - 40.0).abs() < 1e-12);
        assert_eq!(plan.output_width, 1920 - 50);
        assert_eq!(plan.output_height, 1080 - 80);
    }

    #[test]
    fn test_y_axis_alone_can_select_overlay() {
        let transform = vec![TrajPoint::new(0.0, 300.0)];
        // 300 / 1080 = 0.278 > 0.215.
        let plan = StabilizationPlanner::new(0.215).plan(&transform, 1920, 1080);
        assert_eq!(plan.strategy, RenderStrategy::Overlay);
    }

    #[test]
    fn test_empty_transform_is_full_frame_crop() {
        let plan = StabilizationPlanner::new(0.215).plan(&[], 640, 480);
        assert_eq!(plan.strategy, RenderStrategy::Crop);
        assert_eq!(plan.output_width, 640);
        assert_eq!(plan.output_height, 480);
    }

    proptest! {
        #[test]
        fn prop_decision_monotonic_in_crop(
            base in 0.0f64..200.0,
            extra in 0.0f64..600.0,
        ) {
            // Growing the excursion can flip Crop -> Overlay, never back.
            let planner = StabilizationPlanner::new(0.215);
            let small = vec![TrajPoint::new(base, 0.0)];
            let large = vec![TrajPoint::new(base + extra, 0.0)];

            let p_small = planner.plan(&small, 1920, 1080);
            let p_large = planner.plan(&large, 1920, 1080);

            if p_small.strategy == RenderStrategy::Overlay {
                prop_assert_eq!(p_large.strategy, RenderStrategy::Overlay);
            }
        }

        #[test]
        fn prop_crop_output_never_exceeds_input(
            x in 0.0f64..400.0,
            y in 0.0f64..220.0,
        ) {
            let planner = StabilizationPlanner::new(0.215);
            let plan = planner.plan(&[TrajPoint::new(x, y)], 1920, 1080);
            if plan.strategy == RenderStrategy::Crop {
                prop_assert!(plan.output_width <= 1920);
                prop_assert!(plan.output_height <= 1080);
            }
        }
    }
}
