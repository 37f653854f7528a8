use crate::foundation::core::{Affine, Point, Rect};

/// Maps data coordinates onto a chart's pixel box (y grows downward).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    data: Rect,
    to_px: Affine,
}

impl Projection {
    /// Fit the bounds of `xs`/`ys` into `width`×`height`, padded by `margin` of the data range
    /// on every side. With `equal_axis`, one data unit has the same pixel length on both axes
    /// and the data is centered.
    pub fn fit(
        xs: &[f64],
        ys: &[f64],
        width: f64,
        height: f64,
        margin: f64,
        equal_axis: bool,
    ) -> Self {
        let (x0, x1) = padded_range(xs, margin);
        let (y0, y1) = padded_range(ys, margin);
        let (dx, dy) = (x1 - x0, y1 - y0);

        let (mut sx, mut sy) = (width / dx, height / dy);
        if equal_axis {
            let s = sx.min(sy);
            sx = s;
            sy = s;
        }
        let pad_x = (width - dx * sx) / 2.0;
        let pad_y = (height - dy * sy) / 2.0;

        // x' = pad_x + (x - x0) * sx ; y' = pad_y + (y1 - y) * sy
        let to_px = Affine::new([sx, 0.0, 0.0, -sy, pad_x - x0 * sx, pad_y + y1 * sy]);
        Self {
            data: Rect::new(x0, y0, x1, y1),
            to_px,
        }
    }

    /// Padded data bounds.
    pub fn data_bounds(&self) -> Rect {
        self.data
    }

    /// Data-to-pixel transform.
    pub fn transform(&self) -> Affine {
        self.to_px
    }

    /// Pixel position of a data point.
    pub fn project(&self, x: f64, y: f64) -> Point {
        self.to_px * Point::new(x, y)
    }
}

/// Finite min/max of `values` widened by `margin` of their span; degenerate spans get ±0.5.
fn padded_range(values: &[f64], margin: f64) -> (f64, f64) {
    let (lo, hi) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let span = hi - lo;
    if span <= f64::EPSILON * hi.abs().max(1.0) {
        return (lo - 0.5, hi + 0.5);
    }
    (lo - span * margin, hi + span * margin)
}

#[cfg(test)]
#[path = "../../tests/unit/figure/projection.rs"]
mod tests;
