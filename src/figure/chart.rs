use std::sync::Arc;

use crate::{
    activity::{TrimmedActivity, attribute::AttributeKind},
    figure::projection::Projection,
    foundation::{
        core::{BezPath, Canvas, Point},
        error::{OverlayError, OverlayResult},
        raster::{bezpath_to_cpu, pixmap_size},
    },
    template::model::PlotConfig,
};

/// Default stroke width in points.
pub const DEFAULT_LINE_WIDTH: f64 = 1.75;

/// A chart background rendered once, plus the projection markers are placed with.
#[derive(Clone, Debug)]
pub struct ChartFigure {
    kind: AttributeKind,
    size: Canvas,
    projection: Projection,
    background: Arc<vello_cpu::Pixmap>,
}

impl ChartFigure {
    /// Charted attribute.
    pub fn kind(&self) -> AttributeKind {
        self.kind
    }

    /// Pixel size of the chart box.
    pub fn size(&self) -> Canvas {
        self.size
    }

    /// Data-to-pixel mapping of the chart box.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Premultiplied background pixels.
    pub fn background(&self) -> &Arc<vello_cpu::Pixmap> {
        &self.background
    }
}

/// Series a chart of `kind` plots: course as `(lon, lat)`, elevation against seconds.
pub(crate) fn chart_data(
    kind: AttributeKind,
    activity: &TrimmedActivity,
) -> OverlayResult<(Vec<f64>, Vec<f64>)> {
    let missing = || OverlayError::validation(format!("activity has no {kind} data to plot"));
    match kind {
        AttributeKind::Course => {
            let course = activity
                .series(kind)
                .and_then(|s| s.as_course())
                .ok_or_else(missing)?;
            Ok(course.iter().map(|p| (p.lon, p.lat)).unzip())
        }
        AttributeKind::Elevation => {
            let ele = activity
                .series(kind)
                .and_then(|s| s.as_numeric())
                .ok_or_else(missing)?;
            let rate = f64::from(activity.native_rate());
            let xs = (0..ele.len()).map(|i| i as f64 / rate).collect();
            Ok((xs, ele.to_vec()))
        }
        other => Err(OverlayError::validation(format!(
            "plots support course and elevation, got {other}"
        ))),
    }
}

/// Build the background for `config` from full native-rate data.
#[tracing::instrument(skip_all, fields(kind = %config.value))]
pub fn build_figure(
    config: &PlotConfig,
    scene: Canvas,
    activity: &TrimmedActivity,
) -> OverlayResult<ChartFigure> {
    let (xs, ys) = chart_data(config.value, activity)?;
    let size = config.size(scene);
    let (w, h) = pixmap_size(size)?;

    let equal = config.axis.as_deref() == Some("equal");
    if let Some(axis) = config.axis.as_deref()
        && axis != "equal"
    {
        tracing::warn!(axis, "unsupported axis mode, using auto scaling");
    }
    let projection = Projection::fit(
        &xs,
        &ys,
        f64::from(size.width),
        f64::from(size.height),
        config.margin,
        equal,
    );

    let line_color = config.line.color.unwrap_or(config.color);
    let line_width = config.line.width.unwrap_or(DEFAULT_LINE_WIDTH) * config.dpi / 72.0;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    if let Some(fill) = config.fill
        && config.value == AttributeKind::Elevation
    {
        let floor = ys.iter().copied().fold(f64::INFINITY, f64::min) * 0.99;
        let area = area_path(&projection, &xs, &ys, floor);
        ctx.set_paint(config.color.with_opacity(fill.opacity).to_cpu());
        ctx.fill_path(&bezpath_to_cpu(&area));
    }

    let line = line_path(&projection, &xs, &ys);
    ctx.set_stroke(
        vello_cpu::kurbo::Stroke::new(line_width)
            .with_join(vello_cpu::kurbo::Join::Round)
            .with_caps(vello_cpu::kurbo::Cap::Round),
    );
    ctx.set_paint(line_color.to_cpu());
    ctx.stroke_path(&bezpath_to_cpu(&line));

    let mut background = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut background);

    tracing::debug!(points = xs.len(), width = w, height = h, "figure built");
    Ok(ChartFigure {
        kind: config.value,
        size,
        projection,
        background: Arc::new(background),
    })
}

fn line_path(projection: &Projection, xs: &[f64], ys: &[f64]) -> BezPath {
    let mut path = BezPath::new();
    for (i, (x, y)) in xs.iter().zip(ys).enumerate() {
        let p = projection.project(*x, *y);
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path
}

fn area_path(projection: &Projection, xs: &[f64], ys: &[f64], floor: f64) -> BezPath {
    let mut path = BezPath::new();
    let (Some(first), Some(last)) = (xs.first(), xs.last()) else {
        return path;
    };
    path.move_to(projection.project(*first, floor));
    for (x, y) in xs.iter().zip(ys) {
        path.line_to(projection.project(*x, y.max(floor)));
    }
    path.line_to(projection.project(*last, floor));
    path.close_path();
    path
}

/// Marker disc radius in pixels for a marker `weight` (points squared) at `dpi`.
pub fn marker_radius(weight: f64, dpi: f64) -> f64 {
    weight.max(0.0).sqrt() / 2.0 * dpi / 72.0
}

/// Outline width in pixels drawn around markers with an edge color.
pub fn marker_edge_width(dpi: f64) -> f64 {
    dpi / 72.0
}

/// Pixel-space marker center for a course position.
pub fn course_marker(figure: &ChartFigure, lat: f64, lon: f64) -> Point {
    figure.projection.project(lon, lat)
}

/// Pixel-space marker center for an elevation at `seconds` into the window.
pub fn elevation_marker(figure: &ChartFigure, seconds: f64, elevation: f64) -> Point {
    figure.projection.project(seconds, elevation)
}

#[cfg(test)]
#[path = "../../tests/unit/figure/chart.rs"]
mod tests;
