//! Glue between crate geometry and the `vello_cpu` rasterizer.

use crate::foundation::{
    core::{Affine, BezPath, Canvas},
    error::{OverlayError, OverlayResult},
};

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// `vello_cpu` surface dimensions for `canvas`.
pub(crate) fn pixmap_size(canvas: Canvas) -> OverlayResult<(u16, u16)> {
    let w: u16 = canvas
        .width
        .try_into()
        .map_err(|_| OverlayError::validation("canvas width exceeds 65535"))?;
    let h: u16 = canvas
        .height
        .try_into()
        .map_err(|_| OverlayError::validation("canvas height exceeds 65535"))?;
    if w == 0 || h == 0 {
        return Err(OverlayError::validation("canvas width/height must be > 0"));
    }
    Ok((w, h))
}

/// Image paint over a shared premultiplied pixmap.
pub(crate) fn pixmap_paint(pixmap: &std::sync::Arc<vello_cpu::Pixmap>) -> vello_cpu::Image {
    vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(std::sync::Arc::clone(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/raster.rs"]
mod tests;
