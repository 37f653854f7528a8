use std::path::Path;

use anyhow::Context as _;
use serde_json::{Map, Value};

use crate::{
    activity::attribute::AttributeKind,
    foundation::{
        core::Canvas,
        error::{OverlayError, OverlayResult},
    },
    template::model::Template,
};

/// Scene keys an element inherits when it does not set them itself.
const INHERITED_KEYS: [&str; 7] = [
    "font",
    "color",
    "opacity",
    "font_size",
    "unit",
    "decimal_rounding",
    "suffix",
];

impl Template {
    /// Read, resolve and validate a template file.
    pub fn from_path(path: impl AsRef<Path>) -> OverlayResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read template '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Resolve and validate template JSON.
    pub fn from_json_str(text: &str) -> OverlayResult<Self> {
        let raw: Value = serde_json::from_str(text)
            .map_err(|e| OverlayError::validation(format!("template is not valid json: {e}")))?;
        Self::from_value(raw)
    }

    /// Merge scene defaults into every element, deserialize, then validate.
    pub fn from_value(mut raw: Value) -> OverlayResult<Self> {
        resolve(&mut raw)?;
        let template: Template = serde_json::from_value(raw)
            .map_err(|e| OverlayError::validation(format!("invalid template: {e}")))?;
        template.validate()?;
        Ok(template)
    }

    /// Check invariants serde cannot express.
    pub fn validate(&self) -> OverlayResult<()> {
        let scene = &self.scene;
        if scene.width == 0 || scene.height == 0 {
            return Err(OverlayError::validation("scene width/height must be > 0"));
        }
        check_dimensions(scene.width, scene.height, "scene")?;
        if let (Some(start), Some(end)) = (scene.start, scene.end)
            && start >= end
        {
            return Err(OverlayError::validation(format!(
                "scene start ({start}) must be less than end ({end})"
            )));
        }
        if scene.overlay_filename.trim().is_empty() {
            return Err(OverlayError::validation("overlay_filename must not be empty"));
        }

        for v in &self.values {
            check_font_size(v.style.font_size, v.value.name())?;
            if v.value == AttributeKind::Time {
                check_time_format(&v.time_format)?;
            }
        }
        for l in &self.labels {
            check_font_size(l.style.font_size, "label")?;
        }
        for p in &self.plots {
            if !matches!(p.value, AttributeKind::Course | AttributeKind::Elevation) {
                return Err(OverlayError::validation(format!(
                    "plots support course and elevation, got {}",
                    p.value
                )));
            }
            if p.width == Some(0) || p.height == Some(0) {
                return Err(OverlayError::validation("plot width/height must be > 0"));
            }
            let size = p.size(scene.canvas());
            check_dimensions(size.width, size.height, "plot")?;
            if !(p.dpi.is_finite() && p.dpi > 0.0) {
                return Err(OverlayError::validation("plot dpi must be finite and > 0"));
            }
            if !(p.margin.is_finite() && p.margin >= 0.0) {
                return Err(OverlayError::validation("plot margin must be finite and >= 0"));
            }
            if let Some(pl) = &p.point_label {
                check_font_size(pl.font_size, "point_label")?;
            }
        }
        Ok(())
    }
}

/// Fill element entries with the scene keys they lack; `point_label` inherits from its plot.
fn resolve(raw: &mut Value) -> OverlayResult<()> {
    let root = raw
        .as_object_mut()
        .ok_or_else(|| OverlayError::validation("template must be a json object"))?;
    let scene = root
        .get("scene")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| OverlayError::validation("template is missing the scene section"))?;

    for section in ["values", "labels", "plots"] {
        let Some(entries) = root.get_mut(section) else {
            continue;
        };
        let entries = entries.as_array_mut().ok_or_else(|| {
            OverlayError::validation(format!("template section '{section}' must be a list"))
        })?;
        for entry in entries {
            let obj = entry.as_object_mut().ok_or_else(|| {
                OverlayError::validation(format!("entries of '{section}' must be objects"))
            })?;
            inherit(obj, &scene);
            if let Some(Value::Object(label)) = obj.get("point_label").cloned() {
                let mut label = label;
                inherit(&mut label, obj);
                obj.insert("point_label".to_owned(), Value::Object(label));
            }
        }
    }
    Ok(())
}

fn inherit(child: &mut Map<String, Value>, parent: &Map<String, Value>) {
    for key in INHERITED_KEYS {
        if !child.contains_key(key)
            && let Some(v) = parent.get(key)
        {
            child.insert(key.to_owned(), v.clone());
        }
    }
}

fn check_dimensions(width: u32, height: u32, what: &str) -> OverlayResult<()> {
    let max = Canvas::MAX_DIMENSION;
    if width > max || height > max {
        return Err(OverlayError::validation(format!(
            "{what} width/height must be at most {max}, got {width}x{height}"
        )));
    }
    Ok(())
}

fn check_font_size(size: f32, what: &str) -> OverlayResult<()> {
    if size.is_finite() && size > 0.0 {
        Ok(())
    } else {
        Err(OverlayError::validation(format!(
            "{what} font_size must be finite and > 0"
        )))
    }
}

fn check_time_format(format: &str) -> OverlayResult<()> {
    use chrono::format::{Item, StrftimeItems};
    if StrftimeItems::new(format).any(|i| matches!(i, Item::Error)) {
        return Err(OverlayError::validation(format!(
            "invalid time_format {format:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/template/resolve.rs"]
mod tests;
