use crate::{
    activity::attribute::AttributeKind,
    foundation::core::{Canvas, Fps, Rgba8},
};

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Resolved overlay template: scene settings plus the element lists drawn on every frame.
///
/// Build one with [`Template::from_json_str`](crate::Template::from_json_str) so element entries
/// inherit scene defaults before deserialization.
pub struct Template {
    /// Scene-wide settings.
    pub scene: SceneConfig,
    /// Attribute readouts.
    #[serde(default)]
    pub values: Vec<ValueConfig>,
    /// Fixed text.
    #[serde(default)]
    pub labels: Vec<LabelConfig>,
    /// Chart elements.
    #[serde(default)]
    pub plots: Vec<PlotConfig>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// The required `scene` section.
pub struct SceneConfig {
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    /// Output frame rate.
    #[serde(default)]
    pub fps: Fps,
    /// First rendered second of the activity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,
    /// End second (exclusive) of the rendered window.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
    /// Default font file name.
    #[serde(default = "default_font")]
    pub font: String,
    /// Default element color.
    #[serde(default = "default_color")]
    pub color: Rgba8,
    /// Output file name; relative names resolve against the working directory.
    #[serde(default = "default_overlay_filename")]
    pub overlay_filename: String,
}

impl SceneConfig {
    /// Canvas as configured.
    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }
}

/// Measurement system for unit conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// mph, ft, °F.
    Imperial,
    /// km/h, m, °C.
    Metric,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Position and look of a text element.
pub struct TextStyle {
    /// Left edge in pixels.
    pub x: f64,
    /// Top edge in pixels.
    pub y: f64,
    /// Font size in pixels.
    pub font_size: f32,
    /// Font file name or path.
    #[serde(default = "default_font")]
    pub font: String,
    /// Text color.
    #[serde(default = "default_color")]
    pub color: Rgba8,
    /// Opacity multiplier in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
}

impl TextStyle {
    /// Color with opacity applied.
    pub fn fill(&self) -> Rgba8 {
        match self.opacity {
            Some(o) => self.color.with_opacity(o),
            None => self.color,
        }
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A per-frame attribute readout.
pub struct ValueConfig {
    /// Attribute shown.
    pub value: AttributeKind,
    /// Text placement and look.
    #[serde(flatten)]
    pub style: TextStyle,
    /// Measurement system; no conversion when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,
    /// Decimals kept; `0` truncates toward zero.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_rounding: Option<u32>,
    /// Text appended after the value; defaults per attribute and unit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    /// Hours added to timestamps before formatting.
    #[serde(default)]
    pub hours_offset: f64,
    /// `strftime`-style timestamp format.
    #[serde(default = "default_time_format")]
    pub time_format: String,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Fixed text drawn identically on every frame.
pub struct LabelConfig {
    /// Text content.
    pub text: String,
    /// Text placement and look.
    #[serde(flatten)]
    pub style: TextStyle,
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
/// Chart line styling.
pub struct LineConfig {
    /// Stroke width in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Stroke color; falls back to the plot color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba8>,
}

#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
/// Area fill under the elevation profile.
pub struct FillConfig {
    /// Fill opacity.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// One marker layer drawn at the current position.
pub struct PointConfig {
    /// Fill color.
    #[serde(default = "default_color")]
    pub color: Rgba8,
    /// Marker area in points squared.
    #[serde(default = "default_point_weight")]
    pub weight: f64,
    /// Marker opacity.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Outline color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_color: Option<Rgba8>,
    /// Suppress the outline even when `edge_color` is set.
    #[serde(default)]
    pub remove_edge_color: bool,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Text following the elevation marker.
pub struct PointLabelConfig {
    /// Horizontal offset in data units (seconds).
    #[serde(default)]
    pub x_offset: f64,
    /// Vertical offset in data units (metres).
    #[serde(default)]
    pub y_offset: f64,
    /// Font size in pixels.
    pub font_size: f32,
    /// Text color.
    #[serde(default = "default_color")]
    pub color: Rgba8,
    /// Font file name or path.
    #[serde(default = "default_font")]
    pub font: String,
    /// One line per unit.
    #[serde(default = "default_label_units")]
    pub units: Vec<Unit>,
    /// Decimals kept; `0` truncates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_rounding: Option<u32>,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// A chart element: static background plus optional per-frame markers.
pub struct PlotConfig {
    /// `course` or `elevation`.
    pub value: AttributeKind,
    /// Left edge in pixels.
    pub x: f64,
    /// Top edge in pixels.
    pub y: f64,
    /// Chart width in pixels; defaults to the scene width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Chart height in pixels; defaults to the scene height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Base color for line and fill.
    #[serde(default = "default_color")]
    pub color: Rgba8,
    /// Scale of point-based sizes (line width, marker weight).
    #[serde(default = "default_dpi")]
    pub dpi: f64,
    /// Line styling.
    #[serde(default)]
    pub line: LineConfig,
    /// Fraction of the data range added as padding on each side.
    #[serde(default = "default_margin")]
    pub margin: f64,
    /// Elevation area fill.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<FillConfig>,
    /// `"equal"` keeps one data unit the same length on both axes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<String>,
    /// Marker layers, drawn last-to-first so the first entry is on top.
    #[serde(default)]
    pub points: Vec<PointConfig>,
    /// Elevation readout next to the marker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_label: Option<PointLabelConfig>,
    /// Counter-clockwise marker-layer rotation in degrees.
    #[serde(default)]
    pub rotation: f64,
}

impl PlotConfig {
    /// Chart size, falling back to `scene`.
    pub fn size(&self, scene: Canvas) -> Canvas {
        Canvas {
            width: self.width.unwrap_or(scene.width),
            height: self.height.unwrap_or(scene.height),
        }
    }

    /// `true` when the plot draws marker layers.
    pub fn has_markers(&self) -> bool {
        !self.points.is_empty()
    }

    /// `true` when a point label is drawn; only elevation plots carry one.
    pub fn has_point_label(&self) -> bool {
        self.point_label.is_some() && self.value == AttributeKind::Elevation
    }

    /// `true` when the plot draws anything that changes per frame.
    pub fn is_dynamic(&self) -> bool {
        self.has_markers() || self.has_point_label()
    }
}

pub(crate) const DEFAULT_FONT: &str = "Arial.ttf";

fn default_font() -> String {
    DEFAULT_FONT.to_owned()
}

fn default_color() -> Rgba8 {
    Rgba8::WHITE
}

fn default_overlay_filename() -> String {
    "overlay.mov".to_owned()
}

fn default_time_format() -> String {
    "%H:%M:%S".to_owned()
}

fn default_opacity() -> f64 {
    1.0
}

fn default_point_weight() -> f64 {
    80.0
}

fn default_dpi() -> f64 {
    300.0
}

fn default_margin() -> f64 {
    0.1
}

fn default_label_units() -> Vec<Unit> {
    vec![Unit::Imperial]
}
