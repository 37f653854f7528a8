use crate::{activity::attribute::Capabilities, template::model::Template};

/// Element drawn once onto the shared base canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StaticElement {
    /// Index into `template.labels`.
    Label(usize),
    /// Background of `template.plots[i]`.
    PlotBackground(usize),
}

/// Element redrawn on every frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DynamicElement {
    /// Index into `template.values`.
    Value(usize),
    /// Marker layers of `template.plots[i]`.
    PlotMarkers(usize),
    /// Elevation readout of `template.plots[i]`.
    PointLabel(usize),
}

/// Static/dynamic partition of a template, in draw order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ElementPlan {
    /// Base-canvas elements: labels, then chart backgrounds.
    pub statics: Vec<StaticElement>,
    /// Per-frame elements: values, then chart markers and readouts.
    pub dynamics: Vec<DynamicElement>,
}

impl ElementPlan {
    /// Partition `template`, skipping elements whose attribute the activity cannot supply.
    pub fn new(template: &Template, capabilities: Capabilities) -> Self {
        let mut plan = Self::default();

        plan.statics
            .extend((0..template.labels.len()).map(StaticElement::Label));

        for (i, v) in template.values.iter().enumerate() {
            if capabilities.contains(v.value) {
                plan.dynamics.push(DynamicElement::Value(i));
            } else {
                tracing::warn!(attribute = %v.value, "value skipped, attribute not in activity");
            }
        }

        for (i, p) in template.plots.iter().enumerate() {
            if !capabilities.contains(p.value) {
                tracing::warn!(attribute = %p.value, "plot skipped, attribute not in activity");
                continue;
            }
            plan.statics.push(StaticElement::PlotBackground(i));
            if p.has_markers() {
                plan.dynamics.push(DynamicElement::PlotMarkers(i));
            }
            if p.has_point_label() {
                plan.dynamics.push(DynamicElement::PointLabel(i));
            }
        }
        plan
    }

    /// Plot indices whose background must be built.
    pub fn plots(&self) -> impl Iterator<Item = usize> + '_ {
        self.statics.iter().filter_map(|e| match e {
            StaticElement::PlotBackground(i) => Some(*i),
            StaticElement::Label(_) => None,
        })
    }

    /// `true` when nothing changes between frames.
    pub fn is_static(&self) -> bool {
        self.dynamics.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/plan.rs"]
mod tests;
