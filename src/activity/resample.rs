use crate::activity::attribute::{LatLon, Series};

/// Linearly resample `values` from `native_rate` to `fps` samples per second.
///
/// The series is first extended by one synthetic value (`2*last - second_last`) so the
/// interpolation covers the last native sample; the result has `len * fps / native_rate`
/// values.
pub fn resample_numeric(values: &[f64], native_rate: u32, fps: u32) -> Vec<f64> {
    let extended = extend_tail(values);
    let count = output_len(values.len(), native_rate, fps);
    let step = f64::from(native_rate) / f64::from(fps);
    (0..count)
        .map(|k| interpolate(&extended, k as f64 * step))
        .collect()
}

/// Resample a course, interpolating latitude and longitude independently.
pub fn resample_course(course: &[LatLon], native_rate: u32, fps: u32) -> Vec<LatLon> {
    let lat: Vec<f64> = course.iter().map(|p| p.lat).collect();
    let lon: Vec<f64> = course.iter().map(|p| p.lon).collect();
    resample_numeric(&lat, native_rate, fps)
        .into_iter()
        .zip(resample_numeric(&lon, native_rate, fps))
        .map(|(lat, lon)| LatLon { lat, lon })
        .collect()
}

/// Resample any interpolable series; timestamps pass through unchanged.
pub(crate) fn resample_series(series: &Series, native_rate: u32, fps: u32) -> Series {
    match series {
        Series::Numeric(v) => Series::Numeric(resample_numeric(v, native_rate, fps)),
        Series::Course(v) => Series::Course(resample_course(v, native_rate, fps)),
        Series::Time(v) => Series::Time(v.clone()),
    }
}

/// Append the synthetic trailing sample.
pub fn extend_tail(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    match values {
        [] => {}
        [only] => out.push(*only),
        [.., a, b] => out.push(2.0 * b - a),
    }
    out
}

fn output_len(native_len: usize, native_rate: u32, fps: u32) -> usize {
    (native_len as u64 * u64::from(fps) / u64::from(native_rate.max(1))) as usize
}

fn interpolate(xs: &[f64], at: f64) -> f64 {
    let Some(last) = xs.len().checked_sub(1) else {
        return 0.0;
    };
    let lo = (at.floor() as usize).min(last);
    let hi = (lo + 1).min(last);
    let t = at - lo as f64;
    xs[lo] + (xs[hi] - xs[lo]) * t
}

#[cfg(test)]
#[path = "../../tests/unit/activity/resample.rs"]
mod tests;
