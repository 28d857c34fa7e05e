//! Pipeline configuration.
//!
//! All tunables are plain data passed into components at construction.
//! There is no process-wide mutable state.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HyperlapseError, HyperlapseResult};

/// Full configuration for a hyperlapse run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HyperlapseConfig {
    /// Time-lapse speed-up factor: every k-th frame is retained.
    pub speed_up: u32,

    /// Fraction of a frame dimension beyond which cropping is abandoned
    /// in favor of overlay compositing.
    pub crop_threshold: f64,

    /// Smoothing window length expressed in seconds of source footage.
    pub smoothing_secs: f64,

    /// Polynomial order of the trajectory smoothing filter.
    pub poly_order: usize,

    /// Corner detector parameters.
    pub detector: DetectorConfig,

    /// Sparse optical-flow parameters.
    pub flow: FlowConfig,

    /// Output video codec (e.g. "h264", "mpeg4").
    pub codec: String,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Corner detector parameters (quality- and distance-filtered).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Maximum number of corners returned per frame.
    pub max_corners: usize,

    /// Minimum accepted corner response, as a fraction of the strongest
    /// response in the frame.
    pub quality_level: f64,

    /// Minimum Euclidean distance between returned corners, in pixels.
    pub min_distance: f64,

    /// Side length of the neighborhood used for the corner response.
    pub block_size: usize,
}

/// Pyramidal Lucas-Kanade parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Tracking window side length in pixels.
    pub window_size: usize,

    /// Number of pyramid levels above the base image.
    pub max_level: usize,

    /// Maximum solver iterations per pyramid level.
    pub max_iterations: usize,

    /// Convergence threshold in pixels.
    pub epsilon: f64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "hyperlapse=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,
}

impl Default for HyperlapseConfig {
    fn default() -> Self {
        Self {
            speed_up: 15,
            crop_threshold: 0.215,
            smoothing_secs: 6.0,
            poly_order: 3,
            detector: DetectorConfig::default(),
            flow: FlowConfig::default(),
            codec: "h264".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            max_corners: 100,
            quality_level: 0.3,
            min_distance: 7.0,
            block_size: 7,
        }
    }
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            window_size: 30,
            max_level: 4,
            max_iterations: 30,
            epsilon: 0.001,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl HyperlapseConfig {
    /// Check that the configuration describes a runnable pipeline.
    pub fn validate(&self) -> HyperlapseResult<()> {
        if self.speed_up < 1 {
            return Err(HyperlapseError::config("speed_up must be at least 1"));
        }
        if !(self.crop_threshold > 0.0 && self.crop_threshold < 1.0) {
            return Err(HyperlapseError::config(
                "crop_threshold must be in the open interval (0, 1)",
            ));
        }
        if self.smoothing_secs <= 0.0 {
            return Err(HyperlapseError::config("smoothing_secs must be positive"));
        }
        if self.poly_order == 0 {
            return Err(HyperlapseError::config("poly_order must be at least 1"));
        }
        if self.detector.max_corners == 0 {
            return Err(HyperlapseError::config(
                "detector.max_corners must be at least 1",
            ));
        }
        if !(self.detector.quality_level > 0.0 && self.detector.quality_level <= 1.0) {
            return Err(HyperlapseError::config(
                "detector.quality_level must be in (0, 1]",
            ));
        }
        if self.flow.window_size < 3 {
            return Err(HyperlapseError::config(
                "flow.window_size must be at least 3",
            ));
        }
        if self.flow.epsilon <= 0.0 {
            return Err(HyperlapseError::config("flow.epsilon must be positive"));
        }
        Ok(())
    }

    /// Load a config from a JSON file, falling back to defaults when the
    /// file is missing or unparsable.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", path, e);
                }
            }
        }
        Self::default()
    }

    /// Save the config as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("hyperlapse").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = HyperlapseConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.speed_up, 15);
        assert!((config.crop_threshold - 0.215).abs() < 1e-12);
    }

    #[test]
    fn test_zero_speed_up_rejected() {
        let config = HyperlapseConfig {
            speed_up: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_threshold_bounds() {
        let config = HyperlapseConfig {
            crop_threshold: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = HyperlapseConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: HyperlapseConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.speed_up, config.speed_up);
        assert_eq!(parsed.detector.max_corners, config.detector.max_corners);
    }
}
