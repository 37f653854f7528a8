use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use kurbo::Shape as _;

use crate::{
    activity::{
        AttributeSnapshot,
        attribute::{AttributeKind, AttributeValue, Capabilities},
    },
    compose::{
        format::{elevation_label, format_value},
        plan::{DynamicElement, ElementPlan, StaticElement},
        text::{TextEngine, draw_text},
    },
    figure::chart::{
        ChartFigure, course_marker, elevation_marker, marker_edge_width, marker_radius,
    },
    foundation::{
        core::{Affine, Canvas, FrameStamp, Point, Vec2},
        error::{OverlayError, OverlayResult},
        math::src_over_premul,
        raster::{affine_to_cpu, bezpath_to_cpu, pixmap_paint, pixmap_size},
    },
    template::model::{PlotConfig, Template, TextStyle},
};

/// Layout cache entries are dropped every this many frames.
pub const RECLAIM_INTERVAL: u64 = 30;

/// Draws overlay frames: a base canvas built once plus the per-frame elements on top.
///
/// Output pixels are premultiplied RGBA8 at the even-rounded scene size.
pub struct Compositor {
    template: Arc<Template>,
    canvas: Canvas,
    plan: ElementPlan,
    figures: BTreeMap<usize, ChartFigure>,
    text: TextEngine,
    ctx: vello_cpu::RenderContext,
    base: Vec<u8>,
    scratch: vello_cpu::Pixmap,
}

impl std::fmt::Debug for Compositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("canvas", &self.canvas)
            .field("plan", &self.plan)
            .field("figures", &self.figures.len())
            .finish_non_exhaustive()
    }
}

impl Compositor {
    /// Plan `template` against `capabilities` and draw the base canvas.
    ///
    /// `figures` maps plot indices to their prebuilt backgrounds; every planned plot must have one.
    #[tracing::instrument(skip_all)]
    pub fn new(
        template: Arc<Template>,
        capabilities: Capabilities,
        figures: BTreeMap<usize, ChartFigure>,
        fonts_dir: Option<PathBuf>,
    ) -> OverlayResult<Self> {
        let canvas = template.scene.canvas().even();
        let (w, h) = pixmap_size(canvas)?;
        let plan = ElementPlan::new(&template, capabilities);
        for plot in plan.plots() {
            figure_for(&figures, plot)?;
        }

        let mut this = Self {
            template,
            canvas,
            plan,
            figures,
            text: TextEngine::new(fonts_dir),
            ctx: vello_cpu::RenderContext::new(w, h),
            base: Vec::new(),
            scratch: vello_cpu::Pixmap::new(w, h),
        };
        this.build_base()?;
        tracing::debug!(
            statics = this.plan.statics.len(),
            dynamics = this.plan.dynamics.len(),
            "base canvas ready"
        );
        Ok(this)
    }

    /// Even-rounded output size.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Static/dynamic element partition.
    pub fn plan(&self) -> &ElementPlan {
        &self.plan
    }

    /// Premultiplied base canvas shared by every frame.
    pub fn base(&self) -> &[u8] {
        &self.base
    }

    /// Number of text layouts currently cached.
    pub fn cached_layouts(&self) -> usize {
        self.text.cached_layouts()
    }

    fn build_base(&mut self) -> OverlayResult<()> {
        self.ctx.reset();
        let template = Arc::clone(&self.template);
        let statics = self.plan.statics.clone();
        for element in statics {
            match element {
                StaticElement::Label(i) => {
                    let label = &template.labels[i];
                    self.draw_styled(&label.text, &label.style)?;
                }
                StaticElement::PlotBackground(i) => self.draw_background(i)?,
            }
        }
        self.rasterize();
        self.base = self.scratch.data_as_u8_slice().to_vec();
        // Shaped labels are not needed again.
        self.text.clear_layouts();
        Ok(())
    }

    /// Write frame `stamp` with `values` into `out` as premultiplied RGBA8.
    pub fn compose(
        &mut self,
        stamp: FrameStamp,
        values: &AttributeSnapshot,
        out: &mut Vec<u8>,
    ) -> OverlayResult<()> {
        out.clear();
        out.extend_from_slice(&self.base);
        if self.plan.is_static() {
            return Ok(());
        }

        self.ctx.reset();
        let template = Arc::clone(&self.template);
        let dynamics = self.plan.dynamics.clone();
        for element in dynamics {
            match element {
                DynamicElement::Value(i) => {
                    let config = &template.values[i];
                    let value = values.get(config.value).ok_or_else(|| {
                        OverlayError::evaluation(format!("frame has no {} value", config.value))
                    })?;
                    let text = format_value(config, value)?;
                    self.draw_styled(&text, &config.style)?;
                }
                DynamicElement::PlotMarkers(i) => self.draw_markers(i, stamp, values)?,
                DynamicElement::PointLabel(i) => self.draw_point_label(i, stamp, values)?,
            }
        }
        self.rasterize();
        src_over_premul(out, self.scratch.data_as_u8_slice());
        Ok(())
    }

    /// Release per-frame caches; called periodically during long exports.
    pub fn reclaim(&mut self) {
        let dropped = self.text.cached_layouts();
        self.text.clear_layouts();
        tracing::trace!(dropped, "layout cache cleared");
    }

    fn rasterize(&mut self) {
        self.scratch.data_as_u8_slice_mut().fill(0);
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.scratch);
    }

    fn draw_styled(&mut self, text: &str, style: &TextStyle) -> OverlayResult<()> {
        let prepared = self
            .text
            .layout(text, &style.font, style.font_size, style.fill())?;
        draw_text(&mut self.ctx, &prepared, Point::new(style.x, style.y));
        Ok(())
    }

    fn draw_background(&mut self, plot: usize) -> OverlayResult<()> {
        let config = &self.template.plots[plot];
        let figure = figure_for(&self.figures, plot)?;
        let size = figure.size();
        self.ctx.set_transform(affine_to_cpu(Affine::translate((config.x, config.y))));
        self.ctx.set_paint(pixmap_paint(figure.background()));
        self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(size.width),
            f64::from(size.height),
        ));
        Ok(())
    }

    fn draw_markers(
        &mut self,
        plot: usize,
        stamp: FrameStamp,
        values: &AttributeSnapshot,
    ) -> OverlayResult<()> {
        let config = &self.template.plots[plot];
        let figure = figure_for(&self.figures, plot)?;
        let fps = self.template.scene.fps.as_f64();
        let center = marker_center(config, figure, stamp, fps, values)?;

        let size = figure.size();
        let box_center = Point::new(f64::from(size.width) / 2.0, f64::from(size.height) / 2.0);
        let transform = Affine::translate((config.x, config.y))
            * Affine::rotate_about(-config.rotation.to_radians(), box_center);
        self.ctx.set_transform(affine_to_cpu(transform));

        // Reverse so the first configured layer ends up on top.
        for point in config.points.iter().rev() {
            let r = marker_radius(point.weight, config.dpi);
            let disc = bezpath_to_cpu(&kurbo::Circle::new(center, r).to_path(0.1));
            self.ctx
                .set_paint(point.color.with_opacity(point.opacity).to_cpu());
            self.ctx.fill_path(&disc);
            if let Some(edge) = point.edge_color
                && !point.remove_edge_color
            {
                self.ctx
                    .set_stroke(vello_cpu::kurbo::Stroke::new(marker_edge_width(config.dpi)));
                self.ctx.set_paint(edge.with_opacity(point.opacity).to_cpu());
                self.ctx.stroke_path(&disc);
            }
        }
        Ok(())
    }

    fn draw_point_label(
        &mut self,
        plot: usize,
        stamp: FrameStamp,
        values: &AttributeSnapshot,
    ) -> OverlayResult<()> {
        let config = &self.template.plots[plot];
        let Some(label) = config.point_label.as_ref() else {
            return Ok(());
        };
        let figure = figure_for(&self.figures, plot)?;
        let elevation = values.number(AttributeKind::Elevation).ok_or_else(|| {
            OverlayError::evaluation("frame has no elevation value for point label")
        })?;
        let seconds = frame_seconds(stamp, self.template.scene.fps.as_f64());
        let anchor = elevation_marker(
            figure,
            seconds + label.x_offset,
            elevation + label.y_offset,
        ) + Vec2::new(config.x, config.y);

        let text = elevation_label(elevation, label);
        let prepared = self
            .text
            .layout(&text, &label.font, label.font_size, label.color)?;
        draw_text(&mut self.ctx, &prepared, anchor);
        Ok(())
    }
}

fn figure_for(figures: &BTreeMap<usize, ChartFigure>, plot: usize) -> OverlayResult<&ChartFigure> {
    figures
        .get(&plot)
        .ok_or_else(|| OverlayError::evaluation(format!("plot {plot} has no prebuilt figure")))
}

/// Seconds into the window at `stamp`, including the sub-second step.
fn frame_seconds(stamp: FrameStamp, fps: f64) -> f64 {
    f64::from(stamp.second) + f64::from(stamp.sub) / fps
}

/// Marker position in the plot box for the current frame.
fn marker_center(
    config: &PlotConfig,
    figure: &ChartFigure,
    stamp: FrameStamp,
    fps: f64,
    values: &AttributeSnapshot,
) -> OverlayResult<Point> {
    match (config.value, values.get(config.value)) {
        (AttributeKind::Course, Some(AttributeValue::Course(p))) => {
            Ok(course_marker(figure, p.lat, p.lon))
        }
        (AttributeKind::Elevation, Some(AttributeValue::Number(ele))) => {
            Ok(elevation_marker(figure, frame_seconds(stamp, fps), ele))
        }
        (kind, _) => Err(OverlayError::evaluation(format!(
            "frame has no {kind} value for plot marker"
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/compositor.rs"]
mod tests;
