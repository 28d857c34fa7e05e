use clap::Args;

use hyperlapse_common::HyperlapseConfig;

pub mod analyze;
pub mod check;
pub mod probe;
pub mod stabilize;

/// Pipeline tuning flags shared by `stabilize` and `analyze`. Every
/// flag layers over the loaded config; unset flags leave it alone.
#[derive(Args, Debug)]
pub struct TuningArgs {
    /// Keep every k-th frame [default: 15]
    #[arg(long)]
    pub speed_up: Option<u32>,

    /// Crop-ratio limit before switching to overlay rendering [default: 0.215]
    #[arg(long)]
    pub crop_threshold: Option<f64>,

    /// Smoothing window duration in seconds [default: 6.0]
    #[arg(long)]
    pub smoothing_secs: Option<f64>,

    /// Savitzky-Golay polynomial order [default: 3]
    #[arg(long)]
    pub poly_order: Option<usize>,

    /// Maximum corners tracked per frame [default: 100]
    #[arg(long)]
    pub max_corners: Option<usize>,

    /// Corner quality threshold relative to the strongest response [default: 0.3]
    #[arg(long)]
    pub quality_level: Option<f64>,

    /// Minimum distance between corners in pixels [default: 7.0]
    #[arg(long)]
    pub min_distance: Option<f64>,

    /// Corner response neighborhood side length [default: 7]
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Optical-flow tracking window side length [default: 30]
    #[arg(long)]
    pub flow_window: Option<usize>,

    /// Optical-flow pyramid levels above the base image [default: 4]
    #[arg(long)]
    pub pyramid_levels: Option<usize>,

    /// Optical-flow solver iterations per pyramid level [default: 30]
    #[arg(long)]
    pub flow_iterations: Option<usize>,

    /// Optical-flow convergence threshold in pixels [default: 0.001]
    #[arg(long)]
    pub flow_epsilon: Option<f64>,
}

impl TuningArgs {
    /// Fold the set flags into a loaded configuration.
    pub fn apply(&self, config: &mut HyperlapseConfig) {
        if let Some(v) = self.speed_up {
            config.speed_up = v;
        }
        if let Some(v) = self.crop_threshold {
            config.crop_threshold = v;
        }
        if let Some(v) = self.smoothing_secs {
            config.smoothing_secs = v;
        }
        if let Some(v) = self.poly_order {
            config.poly_order = v;
        }
        if let Some(v) = self.max_corners {
            config.detector.max_corners = v;
        }
        if let Some(v) = self.quality_level {
            config.detector.quality_level = v;
        }
        if let Some(v) = self.min_distance {
            config.detector.min_distance = v;
        }
        if let Some(v) = self.block_size {
            config.detector.block_size = v;
        }
        if let Some(v) = self.flow_window {
            config.flow.window_size = v;
        }
        if let Some(v) = self.pyramid_levels {
            config.flow.max_level = v;
        }
        if let Some(v) = self.flow_iterations {
            config.flow.max_iterations = v;
        }
        if let Some(v) = self.flow_epsilon {
            config.flow.epsilon = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unset() -> TuningArgs {
        TuningArgs {
            speed_up: None,
            crop_threshold: None,
            smoothing_secs: None,
            poly_order: None,
            max_corners: None,
            quality_level: None,
            min_distance: None,
            block_size: None,
            flow_window: None,
            pyramid_levels: None,
            flow_iterations: None,
            flow_epsilon: None,
        }
    }

    #[test]
    fn test_unset_flags_leave_config_untouched() {
        let mut config = HyperlapseConfig::default();
        unset().apply(&mut config);
        assert_eq!(config.speed_up, 15);
        assert_eq!(config.detector.max_corners, 100);
        assert_eq!(config.flow.window_size, 30);
    }

    #[test]
    fn test_detector_and_flow_flags_layer_over_config() {
        let mut config = HyperlapseConfig::default();
        let args = TuningArgs {
            speed_up: Some(10),
            max_corners: Some(250),
            quality_level: Some(0.1),
            flow_window: Some(21),
            pyramid_levels: Some(2),
            flow_epsilon: Some(0.01),
            ..unset()
        };
        args.apply(&mut config);

        assert_eq!(config.speed_up, 10);
        assert_eq!(config.detector.max_corners, 250);
        assert!((config.detector.quality_level - 0.1).abs() < 1e-12);
        assert_eq!(config.flow.window_size, 21);
        assert_eq!(config.flow.max_level, 2);
        assert!((config.flow.epsilon - 0.01).abs() < 1e-12);
        // Untouched fields keep their configured values.
        assert!((config.crop_threshold - 0.215).abs() < 1e-12);
        assert_eq!(config.flow.max_iterations, 30);
    }
}
