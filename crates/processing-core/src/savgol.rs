//! Savitzky-Golay smoothing.
//!
//! Local polynomial least-squares smoothing over a sliding window. The
//! interior of the series is smoothed by convolution with precomputed
//! least-squares coefficients; the two half-window edges are handled by
//! fitting the same-order polynomial to the nearest full window and
//! evaluating it at the edge positions (the conventional edge policy).

/// Window length for a given footage span: `round(secs * fps)`, forced
/// odd because the filter needs a symmetric window.
pub fn window_length(secs: f64, fps: f64) -> usize {
    let mut window = (secs * fps).round() as usize;
    if window % 2 == 0 {
        window += 1;
    }
    window.max(3)
}

/// Smooth a series with a Savitzky-Golay filter.
///
/// `window` must be odd; it is shrunk (keeping parity) when it exceeds
/// the series length. Series too short to fit the polynomial are
/// returned unchanged.
pub fn savgol_filter(series: &[f64], window: usize, poly_order: usize) -> Vec<f64> {
    let n = series.len();
    if n < poly_order + 2 {
        return series.to_vec();
    }

    let mut window = window;
    if window % 2 == 0 {
        window += 1;
    }
    if window > n {
        // Largest odd window that fits.
        window = if n % 2 == 0 { n - 1 } else { n };
    }
    if window <= poly_order {
        return series.to_vec();
    }

    let half = window / 2;
    let weights = central_weights(window, poly_order);

    let mut out = vec![0.0; n];

    // Interior: plain convolution with the least-squares weights.
    for i in half..n - half {
        let mut acc = 0.0;
        for (j, w) in weights.iter().enumerate() {
            acc += w * series[i - half + j];
        }
        out[i] = acc;
    }

    // Edges: fit the same-order polynomial over the nearest full window
    // and evaluate it at each edge position.
    let head = polyfit(&series[..window], poly_order);
    for (i, slot) in out.iter_mut().take(half).enumerate() {
        *slot = polyval(&head, i as f64);
    }
    let tail_start = n - window;
    let tail = polyfit(&series[tail_start..], poly_order);
    for i in n - half..n {
        out[i] = polyval(&tail, (i - tail_start) as f64);
    }

    out
}

/// Convolution weights for the window center: the row of the
/// least-squares projection that evaluates the fitted polynomial at
/// offset zero.
fn central_weights(window: usize, poly_order: usize) -> Vec<f64> {
    let half = window as isize / 2;
    let terms = poly_order + 1;

    // Gram matrix G[a][b] = sum over offsets t of t^(a+b).
    let mut gram = vec![vec![0.0; terms]; terms];
    for t in -half..=half {
        let t = t as f64;
        let mut powers = vec![1.0; 2 * terms - 1];
        for p in 1..powers.len() {
            powers[p] = powers[p - 1] * t;
        }
        for (a, row) in gram.iter_mut().enumerate() {
            for (b, cell) in row.iter_mut().enumerate() {
                *cell += powers[a + b];
            }
        }
    }

    // Solve G z = e0; the weight for offset t is then sum_j z[j] * t^j.
    let mut rhs = vec![0.0; terms];
    rhs[0] = 1.0;
    let z = solve_linear(gram, rhs);

    (-half..=half)
        .map(|t| {
            let t = t as f64;
            let mut tp = 1.0;
            let mut acc = 0.0;
            for &zj in &z {
                acc += zj * tp;
                tp *= t;
            }
            acc
        })
        .collect()
}

/// Least-squares polynomial fit over positions `0..ys.len()`.
///
/// Positions are centered before solving to keep the normal equations
/// well conditioned for wide windows, then the shift is folded back in
/// at evaluation time by `polyval` taking uncentered positions.
fn polyfit(ys: &[f64], poly_order: usize) -> PolyFit {
    let n = ys.len();
    let terms = poly_order + 1;
    let center = (n as f64 - 1.0) / 2.0;

    let mut gram = vec![vec![0.0; terms]; terms];
    let mut rhs = vec![0.0; terms];

    for (i, &y) in ys.iter().enumerate() {
        let t = i as f64 - center;
        let mut powers = vec![1.0; 2 * terms - 1];
        for p in 1..powers.len() {
            powers[p] = powers[p - 1] * t;
        }
        for (a, row) in gram.iter_mut().enumerate() {
            rhs[a] += powers[a] * y;
            for (b, cell) in row.iter_mut().enumerate() {
                *cell += powers[a + b];
            }
        }
    }

    PolyFit {
        coeffs: solve_linear(gram, rhs),
        center,
    }
}

struct PolyFit {
    /// Coefficients in centered coordinates, constant term first.
    coeffs: Vec<f64>,
    center: f64,
}

fn polyval(fit: &PolyFit, pos: f64) -> f64 {
    let t = pos - fit.center;
    let mut tp = 1.0;
    let mut acc = 0.0;
    for &c in &fit.coeffs {
        acc += c * tp;
        tp *= t;
    }
    acc
}

/// Gaussian elimination with partial pivoting. The systems here are
/// tiny (poly_order + 1 unknowns) and built from full-rank windows, so
/// a singular pivot can only come from a degenerate call; fall back to
/// the zero solution rather than panicking.
fn solve_linear(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Vec<f64> {
    let n = b.len();

    for col in 0..n {
        let mut pivot = col;
        for row in col + 1..n {
            if a[row][col].abs() > a[pivot][col].abs() {
                pivot = row;
            }
        }
        if a[pivot][col].abs() < 1e-12 {
            return vec![0.0; n];
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for col in (0..n).rev() {
        let mut acc = b[col];
        for k in col + 1..n {
            acc -= a[col][k] * x[k];
        }
        x[col] = acc / a[col][col];
    }
    x
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: &[f64], b: &[f64], tol: f64) {
        assert_eq!(a.len(), b.len());
        for (i, (&x, &y)) in a.iter().zip(b.iter()).enumerate() {
            assert!(
                (x - y).abs() < tol,
                "index {i}: {x} vs {y} (tol {tol})"
            );
        }
    }

    #[test]
    fn test_window_length_forced_odd() {
        // 6 * 25 fps = 150, even, bumped to 151.
        assert_eq!(window_length(6.0, 25.0), 151);
        // 6 * 29.97 rounds to 180, even, bumped to 181.
        assert_eq!(window_length(6.0, 29.97), 181);
        // Already odd stays.
        assert_eq!(window_length(6.0, 24.5), 147);
    }

    #[test]
    fn test_constant_series_unchanged() {
        let series = vec![4.2; 50];
        let out = savgol_filter(&series, 11, 3);
        assert_close(&out, &series, 1e-9);
    }

    #[test]
    fn test_polynomials_reproduced_exactly() {
        // An order-3 filter reproduces cubics, including at the edges.
        let series: Vec<f64> = (0..60)
            .map(|i| {
                let t = i as f64;
                0.01 * t * t * t - 0.3 * t * t + 2.0 * t - 5.0
            })
            .collect();
        let out = savgol_filter(&series, 15, 3);
        assert_close(&out, &series, 1e-6);
    }

    #[test]
    fn test_noise_is_attenuated() {
        // Alternating noise around a linear ramp: the smoothed series
        // must sit closer to the ramp than the input does.
        let clean: Vec<f64> = (0..100).map(|i| i as f64 * 0.5).collect();
        let noisy: Vec<f64> = clean
            .iter()
            .enumerate()
            .map(|(i, &v)| v + if i % 2 == 0 { 1.0 } else { -1.0 })
            .collect();

        let out = savgol_filter(&noisy, 11, 3);

        let err_in: f64 = noisy
            .iter()
            .zip(&clean)
            .skip(10)
            .take(80)
            .map(|(a, b)| (a - b).abs())
            .sum();
        let err_out: f64 = out
            .iter()
            .zip(&clean)
            .skip(10)
            .take(80)
            .map(|(a, b)| (a - b).abs())
            .sum();
        assert!(err_out < err_in * 0.5, "err_out={err_out}, err_in={err_in}");
    }

    #[test]
    fn test_window_larger_than_series_shrinks() {
        let series: Vec<f64> = (0..20).map(|i| (i as f64).sin()).collect();
        let out = savgol_filter(&series, 359, 3);
        assert_eq!(out.len(), series.len());
        assert!(out.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_short_series_passes_through() {
        let series = vec![1.0, 2.0, 3.0];
        let out = savgol_filter(&series, 11, 3);
        assert_eq!(out, series);
    }

    #[test]
    fn test_output_length_matches_input() {
        for n in [6usize, 7, 20, 151] {
            let series: Vec<f64> = (0..n).map(|i| i as f64 * 0.3).collect();
            assert_eq!(savgol_filter(&series, 11, 3).len(), n);
        }
    }
}
