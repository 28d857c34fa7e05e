//! Affine warping of frame buffers.
//!
//! Applies a 2x3 affine matrix by inverse mapping: for every output
//! pixel the matrix inverse gives the source position, which is
//! bilinearly sampled. Positions outside the source are filled with
//! zero, matching the warp fill convention the overlay matte relies on.

use hyperlapse_video_model::Frame;

/// Row-major 2x3 affine matrix `[a, b, tx, c, d, ty]` mapping source
/// coordinates to destination coordinates.
pub type AffineMatrix = [f64; 6];

/// A pure-translation matrix.
pub fn translation(tx: f64, ty: f64) -> AffineMatrix {
    [1.0, 0.0, tx, 0.0, 1.0, ty]
}

/// Invert a 2x3 affine matrix. Returns `None` for a singular linear
/// part (never the case for translations).
pub fn invert_affine(m: &AffineMatrix) -> Option<AffineMatrix> {
    let det = m[0] * m[4] - m[1] * m[3];
    if det.abs() < 1e-12 {
        return None;
    }
    let inv_det = 1.0 / det;

    let a = m[4] * inv_det;
    let b = -m[1] * inv_det;
    let c = -m[3] * inv_det;
    let d = m[0] * inv_det;

    Some([
        a,
        b,
        -(a * m[2] + b * m[5]),
        c,
        d,
        -(c * m[2] + d * m[5]),
    ])
}

/// Warp a frame by an affine matrix into an output of the given size.
/// Out-of-bounds regions are filled with zero.
pub fn warp_affine(src: &Frame, m: &AffineMatrix, out_width: usize, out_height: usize) -> Frame {
    let channels = src.channels();
    let mut dst = Frame::black(out_width, out_height, channels);

    let Some(m_inv) = invert_affine(m) else {
        return dst;
    };

    let src_w = src.width();
    let src_h = src.height();

    for dy in 0..out_height {
        for dx in 0..out_width {
            let sx = m_inv[0] * dx as f64 + m_inv[1] * dy as f64 + m_inv[2];
            let sy = m_inv[3] * dx as f64 + m_inv[4] * dy as f64 + m_inv[5];

            if sx < 0.0 || sy < 0.0 || sx > (src_w - 1) as f64 || sy > (src_h - 1) as f64 {
                continue;
            }

            let x0 = sx.floor() as usize;
            let y0 = sy.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let y1 = (y0 + 1).min(src_h - 1);
            let fx = sx - x0 as f64;
            let fy = sy - y0 as f64;

            let p00 = src.pixel(x0, y0);
            let p10 = src.pixel(x1, y0);
            let p01 = src.pixel(x0, y1);
            let p11 = src.pixel(x1, y1);

            let out = dst.pixel_mut(dx, dy);
            for ch in 0..channels {
                let top = p00[ch] as f64 * (1.0 - fx) + p10[ch] as f64 * fx;
                let bottom = p01[ch] as f64 * (1.0 - fx) + p11[ch] as f64 * fx;
                let val = top * (1.0 - fy) + bottom * fy;
                out[ch] = val.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    dst
}
