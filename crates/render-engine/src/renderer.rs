//! Frame renderers for the two stabilization strategies.
//!
//! Both renderers cancel camera motion by translating each selected
//! frame opposite to its transform offset. They differ in how the
//! border exposed by the translation is handled: [`CropRenderer`]
//! discards a fixed margin so every output frame is fully covered,
//! while [`OverlayRenderer`] keeps full resolution and fills exposed
//! regions with pixels persisted from earlier frames.

use hyperlapse_common::HyperlapseResult;
use hyperlapse_video_model::{Frame, RenderStrategy, StabilizationPlan, TrajPoint};

use crate::warp::{translation, warp_affine};

/// Stateful per-frame stabilizer. Frames must be presented in output
/// order with their matching transform offsets.
pub trait FrameRenderer: Send {
    /// Stabilize one frame.
    fn render(&mut self, frame: &Frame, offset: TrajPoint) -> HyperlapseResult<Frame>;

    /// Output frame geometry.
    fn output_size(&self) -> (u32, u32);
}

/// Build the renderer a plan calls for.
pub fn renderer_for_plan(plan: &StabilizationPlan) -> Box<dyn FrameRenderer> {
    match plan.strategy {
        RenderStrategy::Crop => Box::new(CropRenderer::new(plan)),
        RenderStrategy::Overlay => Box::new(OverlayRenderer::new(plan)),
    }
}

/// Translates each frame and crops a fixed margin off every edge, so
/// the exposed border never reaches the output.
pub struct CropRenderer {
    x_crop: f64,
    y_crop: f64,
    output_width: u32,
    output_height: u32,
}

impl CropRenderer {
    pub fn new(plan: &StabilizationPlan) -> Self {
        Self {
            x_crop: plan.x_crop,
            y_crop: plan.y_crop,
            output_width: plan.output_width,
            output_height: plan.output_height,
        }
    }
}

impl FrameRenderer for CropRenderer {
    fn render(&mut self, frame: &Frame, offset: TrajPoint) -> HyperlapseResult<Frame> {
        // Fold the crop origin into the stabilizing translation so the
        // warp writes straight into the cropped geometry.
        let m = translation(offset.x - self.x_crop, offset.y - self.y_crop);
        Ok(warp_affine(
            frame,
            &m,
            self.output_width as usize,
            self.output_height as usize,
        ))
    }

    fn output_size(&self) -> (u32, u32) {
        (self.output_width, self.output_height)
    }
}

/// Keeps full resolution by compositing each translated frame over a
/// persistent canvas. Warp fill is zero, so a zero byte marks "no
/// source data here" and the canvas shows through; any nonzero byte
/// overwrites the canvas. The matte is per channel, so a channel that
/// is genuinely zero in the source also lets the canvas through.
pub struct OverlayRenderer {
    canvas: Frame,
    width: u32,
    height: u32,
}

impl OverlayRenderer {
    pub fn new(plan: &StabilizationPlan) -> Self {
        Self {
            canvas: Frame::black(
                plan.output_width as usize,
                plan.output_height as usize,
                3,
            ),
            width: plan.output_width,
            height: plan.output_height,
        }
    }
}

impl FrameRenderer for OverlayRenderer {
    fn render(&mut self, frame: &Frame, offset: TrajPoint) -> HyperlapseResult<Frame> {
        let m = translation(offset.x, offset.y);
        let warped = warp_affine(frame, &m, self.width as usize, self.height as usize);

        for (canvas_byte, &warped_byte) in self
            .canvas
            .as_mut_slice()
            .iter_mut()
            .zip(warped.as_slice())
        {
            if warped_byte != 0 {
                *canvas_byte = warped_byte;
            }
        }

        Ok(self.canvas.clone())
    }

    fn output_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
