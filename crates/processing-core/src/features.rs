//! Corner detection for the motion estimator.
//!
//! Shi-Tomasi (minimum eigenvalue) corners with a quality threshold
//! relative to the strongest response, minimum inter-corner distance
//! suppression, and a hard cap on the number of returned corners.

use hyperlapse_common::DetectorConfig;
use hyperlapse_video_model::GrayImage;

/// A detected feature point with its corner response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeaturePoint {
    pub x: f32,
    pub y: f32,
    pub score: f32,
}

/// Capability seam for corner detection. The pipeline only assumes
/// "some bounded set of trackable points in frame A".
pub trait FeatureDetector: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Vec<FeaturePoint>;
}

/// Minimum-eigenvalue corner detector.
pub struct ShiTomasiDetector {
    config: DetectorConfig,
}

impl ShiTomasiDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }
}

impl FeatureDetector for ShiTomasiDetector {
    fn detect(&self, image: &GrayImage) -> Vec<FeaturePoint> {
        let width = image.width();
        let height = image.height();
        let block = self.config.block_size.max(3);
        let half = block / 2;
        // One pixel of margin for the gradient stencil on top of the
        // block neighborhood.
        let margin = half + 1;
        if width <= 2 * margin || height <= 2 * margin {
            return vec![];
        }

        // Gradient products, then box sums over the block neighborhood
        // via summed-area tables.
        let mut ix2 = vec![0.0f64; width * height];
        let mut iy2 = vec![0.0f64; width * height];
        let mut ixy = vec![0.0f64; width * height];

        for y in 1..height - 1 {
            for x in 1..width - 1 {
                let gx = 0.5 * (image.get(x + 1, y) - image.get(x - 1, y)) as f64;
                let gy = 0.5 * (image.get(x, y + 1) - image.get(x, y - 1)) as f64;
                let idx = y * width + x;
                ix2[idx] = gx * gx;
                iy2[idx] = gy * gy;
                ixy[idx] = gx * gy;
            }
        }

        let sat_ix2 = integral_image(&ix2, width, height);
        let sat_iy2 = integral_image(&iy2, width, height);
        let sat_ixy = integral_image(&ixy, width, height);

        // Minimum eigenvalue of the 2x2 structure tensor per pixel.
        let mut responses = vec![0.0f64; width * height];
        let mut max_response = 0.0f64;
        for y in margin..height - margin {
            for x in margin..width - margin {
                let sxx = box_sum(&sat_ix2, width, x - half, y - half, x + half, y + half);
                let syy = box_sum(&sat_iy2, width, x - half, y - half, x + half, y + half);
                let sxy = box_sum(&sat_ixy, width, x - half, y - half, x + half, y + half);

                let trace = sxx + syy;
                let diff = sxx - syy;
                let lambda_min = 0.5 * (trace - (diff * diff + 4.0 * sxy * sxy).sqrt());

                responses[y * width + x] = lambda_min;
                if lambda_min > max_response {
                    max_response = lambda_min;
                }
            }
        }

        if max_response <= 0.0 {
            return vec![];
        }

        // Quality filter plus 3x3 non-maximum suppression, then sort by
        // response so the distance filter keeps the strongest corners.
        let threshold = self.config.quality_level * max_response;
        let mut candidates = Vec::new();
        for y in margin..height - margin {
            for x in margin..width - margin {
                let r = responses[y * width + x];
                if r < threshold {
                    continue;
                }
                let mut is_local_max = true;
                'nms: for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = (x as i32 + dx) as usize;
                        let ny = (y as i32 + dy) as usize;
                        if responses[ny * width + nx] > r {
                            is_local_max = false;
                            break 'nms;
                        }
                    }
                }
                if is_local_max {
                    candidates.push(FeaturePoint {
                        x: x as f32,
                        y: y as f32,
                        score: r as f32,
                    });
                }
            }
        }

        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let min_dist2 = (self.config.min_distance * self.config.min_distance) as f32;
        let mut accepted: Vec<FeaturePoint> = Vec::with_capacity(self.config.max_corners);
        for cand in candidates {
            if accepted.len() >= self.config.max_corners {
                break;
            }
            let far_enough = accepted.iter().all(|a| {
                let dx = a.x - cand.x;
                let dy = a.y - cand.y;
                dx * dx + dy * dy >= min_dist2
            });
            if far_enough {
                accepted.push(cand);
            }
        }

        accepted
    }
}

/// Summed-area table with a one-cell zero border, so sums over
/// `[x0, x1] x [y0, y1]` are four lookups.
fn integral_image(data: &[f64], width: usize, height: usize) -> Vec<f64> {
    let sw = width + 1;
    let mut sat = vec![0.0f64; sw * (height + 1)];
    for y in 0..height {
        let mut row_sum = 0.0;
        for x in 0..width {
            row_sum += data[y * width + x];
            sat[(y + 1) * sw + (x + 1)] = sat[y * sw + (x + 1)] + row_sum;
        }
    }
    sat
}

#[inline]
fn box_sum(sat: &[f64], width: usize, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
    let sw = width + 1;
    sat[(y1 + 1) * sw + (x1 + 1)] + sat[y0 * sw + x0]
        - sat[y0 * sw + (x1 + 1)]
        - sat[(y1 + 1) * sw + x0]
}
