//! Frame buffers and video stream metadata.

use serde::{Deserialize, Serialize};

/// Errors produced when constructing frame buffers.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("buffer length {got} does not match {width}x{height}x{channels}")]
    BufferSizeMismatch {
        width: usize,
        height: usize,
        channels: usize,
        got: usize,
    },

    #[error("frame dimensions must be non-zero")]
    ZeroSized,
}

/// Metadata a frame source exposes up front.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoMeta {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Nominal frame rate.
    pub fps: f64,
    /// Total number of frames in the stream.
    pub total_frames: u64,
}

/// An owned video frame: interleaved 8-bit samples, row-major.
///
/// `channels` is carried explicitly because the motion estimator refuses
/// to work on anything with fewer than three channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Wrap an existing buffer. Fails when the buffer length does not
    /// match the stated geometry.
    pub fn new(
        width: usize,
        height: usize,
        channels: usize,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 || channels == 0 {
            return Err(FrameError::ZeroSized);
        }
        if data.len() != width * height * channels {
            return Err(FrameError::BufferSizeMismatch {
                width,
                height,
                channels,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// An all-black frame of the given geometry.
    pub fn black(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0u8; width * height * channels],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Sample of one pixel as a channel slice.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[u8] {
        let idx = (y * self.width + x) * self.channels;
        &self.data[idx..idx + self.channels]
    }

    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [u8] {
        let idx = (y * self.width + x) * self.channels;
        &mut self.data[idx..idx + self.channels]
    }

    /// Convert to a single-channel intensity image using ITU-R BT.601
    /// luma weights. Extra channels beyond the first three are ignored.
    pub fn to_gray(&self) -> GrayImage {
        let mut data = Vec::with_capacity(self.width * self.height);
        if self.channels >= 3 {
            for px in self.data.chunks_exact(self.channels) {
                let luma =
                    0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                data.push(luma);
            }
        } else {
            for px in self.data.chunks_exact(self.channels) {
                data.push(px[0] as f32);
            }
        }
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

/// A single-channel f32 intensity image, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayImage {
    width: usize,
    height: usize,
    data: Vec<f32>,
}

impl GrayImage {
    pub fn new(width: usize, height: usize, data: Vec<f32>) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::ZeroSized);
        }
        if data.len() != width * height {
            return Err(FrameError::BufferSizeMismatch {
                width,
                height,
                channels: 1,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_val(width: usize, height: usize, val: f32) -> Self {
        Self {
            width,
            height,
            data: vec![val; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> f32 {
        self.data[y * self.width + x]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, val: f32) {
        self.data[y * self.width + x] = val;
    }

    /// Bilinear sample at a sub-pixel position, clamped to the image
    /// borders so callers never index out of bounds.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let x = x.clamp(0.0, (self.width - 1) as f32);
        let y = y.clamp(0.0, (self.height - 1) as f32);

        let x0 = x.floor() as usize;
        let y0 = y.floor() as usize;
        let x1 = (x0 + 1).min(self.width - 1);
        let y1 = (y0 + 1).min(self.height - 1);

        let fx = x - x0 as f32;
        let fy = y - y0 as f32;

        let top = self.get(x0, y0) * (1.0 - fx) + self.get(x1, y0) * fx;
        let bottom = self.get(x0, y1) * (1.0 - fx) + self.get(x1, y1) * fx;
        top * (1.0 - fy) + bottom * fy
    }
}
