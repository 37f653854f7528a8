//! Gradient cleanup: first-sample extrapolation, rolling z-score outlier suppression, LOWESS.
//!
//! The stages are order-dependent: suppression runs before smoothing, and the final scale
//! compensates for the magnitude both of them shave off.

/// Tunable constants of the gradient cleanup.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SmoothingParams {
    /// Rolling window length for outlier suppression.
    pub outlier_window: usize,
    /// Absolute z-score above which a sample is replaced by its window mean.
    pub z_threshold: f64,
    /// Fraction of the series used as each LOWESS neighbourhood.
    pub lowess_fraction: f64,
    /// LOWESS passes; passes after the first use robustness weights.
    pub lowess_iterations: u32,
    /// Empirical scale applied after smoothing.
    pub scale: f64,
}

impl Default for SmoothingParams {
    fn default() -> Self {
        Self {
            outlier_window: 7,
            z_threshold: 2.0,
            lowess_fraction: 0.0005,
            lowess_iterations: 1,
            scale: 1.747,
        }
    }
}

/// Run the full cleanup on a raw gradient series whose index 0 is a placeholder.
#[tracing::instrument(skip(raw), fields(len = raw.len()))]
pub fn smooth_gradients(raw: &[f64], params: &SmoothingParams) -> Vec<f64> {
    let g = extrapolate_first(raw);
    let g = suppress_outliers(&g, params.outlier_window, params.z_threshold);
    let g = lowess(&g, params.lowess_fraction, params.lowess_iterations);
    g.into_iter().map(|v| v * params.scale).collect()
}

/// Replace index 0 with a linear extrapolation of the next two samples.
pub fn extrapolate_first(raw: &[f64]) -> Vec<f64> {
    let mut g = raw.to_vec();
    match raw.len() {
        0 | 1 => {}
        2 => g[0] = raw[1],
        _ => g[0] = 2.0 * raw[1] - raw[2],
    }
    g
}

/// Slide a window over `series`; samples with `|z| > z_threshold` get the window mean.
///
/// Windows always read the input, so a replacement never feeds later windows.
pub fn suppress_outliers(series: &[f64], window: usize, z_threshold: f64) -> Vec<f64> {
    let mut out = series.to_vec();
    if window == 0 || series.len() < window {
        return out;
    }
    for start in 0..=series.len() - window {
        let w = &series[start..start + window];
        let mean = w.iter().sum::<f64>() / window as f64;
        let var = w.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / window as f64;
        let std = var.sqrt();
        if std == 0.0 || !std.is_finite() {
            continue;
        }
        for (j, v) in w.iter().enumerate() {
            if ((v - mean) / std).abs() > z_threshold {
                out[start + j] = mean;
            }
        }
    }
    out
}

/// Locally weighted linear regression over evenly spaced samples.
///
/// The neighbourhood reaches the `ceil(fraction * n)`-th nearest sample. When that leaves a
/// single weighted point the fit is degenerate and the sample passes through unchanged.
pub fn lowess(y: &[f64], fraction: f64, iterations: u32) -> Vec<f64> {
    let n = y.len();
    if n < 3 || iterations == 0 {
        return y.to_vec();
    }
    let r = ((fraction * n as f64).ceil() as usize).max(1).min(n - 1);
    let bandwidths: Vec<f64> = (0..n).map(|i| nth_distance(i, n, r) as f64).collect();

    let mut robust = vec![1.0; n];
    let mut fitted = y.to_vec();
    for it in 0..iterations {
        for i in 0..n {
            fitted[i] = local_fit(y, i, bandwidths[i], &robust);
        }
        if it + 1 == iterations {
            break;
        }
        let residuals: Vec<f64> = y.iter().zip(&fitted).map(|(a, b)| a - b).collect();
        let s = median(residuals.iter().map(|v| v.abs()).collect());
        if s == 0.0 {
            break;
        }
        for (w, res) in robust.iter_mut().zip(&residuals) {
            let d = (res / (6.0 * s)).clamp(-1.0, 1.0);
            *w = (1.0 - d * d).powi(2);
        }
    }
    fitted
}

/// Distance from index `i` to its `r`-th nearest sample (0-based, self included at rank 0).
fn nth_distance(i: usize, n: usize, r: usize) -> usize {
    let left = i;
    let right = n - 1 - i;
    let mut seen = 1;
    let mut d = 0;
    while seen <= r {
        d += 1;
        seen += usize::from(d <= left) + usize::from(d <= right);
    }
    d
}

fn local_fit(y: &[f64], i: usize, h: f64, robust: &[f64]) -> f64 {
    let reach = h.ceil() as usize;
    let lo = i.saturating_sub(reach);
    let hi = (i + reach).min(y.len() - 1);
    let xi = i as f64;

    let (mut sw, mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for j in lo..=hi {
        let x = j as f64;
        let u = ((x - xi) / h).abs().min(1.0);
        let w = (1.0 - u * u * u).powi(3) * robust[j];
        sw += w;
        sx += w * x;
        sy += w * y[j];
        sxx += w * x * x;
        sxy += w * x * y[j];
    }
    if sw <= 0.0 {
        return y[i];
    }
    let det = sw * sxx - sx * sx;
    if det.abs() <= 1e-12 * sw * sw {
        return sy / sw;
    }
    let slope = (sw * sxy - sx * sy) / det;
    let intercept = (sy - slope * sx) / sw;
    intercept + slope * xi
}

fn median(mut v: Vec<f64>) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    v.sort_by(f64::total_cmp);
    let mid = v.len() / 2;
    if v.len() % 2 == 0 {
        (v[mid - 1] + v[mid]) / 2.0
    } else {
        v[mid]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/activity/gradient.rs"]
mod tests;
