//! Stabilization plan: the crop-vs-overlay decision and output geometry.

use serde::{Deserialize, Serialize};

/// Rendering strategy chosen once per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderStrategy {
    /// Translate each retained frame and crop to a smaller safe region.
    Crop,
    /// Translate at full resolution and composite onto a persistent canvas.
    Overlay,
}

/// Derived once from the transform trajectory's extreme values per axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilizationPlan {
    /// Required crop margin along x, in pixels.
    pub x_crop: f64,
    /// Required crop margin along y, in pixels.
    pub y_crop: f64,
    /// Crop margin as a fraction of frame width.
    pub x_ratio: f64,
    /// Crop margin as a fraction of frame height.
    pub y_ratio: f64,
    /// The chosen rendering strategy.
    pub strategy: RenderStrategy,
    /// Source frame width in pixels.
    pub input_width: u32,
    /// Source frame height in pixels.
    pub input_height: u32,
    /// Planned output width in pixels.
    pub output_width: u32,
    /// Planned output height in pixels.
    pub output_height: u32,
}

impl StabilizationPlan {
    /// Whether the plan changes the frame geometry.
    pub fn shrinks_frame(&self) -> bool {
        self.output_width != self.input_width || self.output_height != self.input_height
    }
}
