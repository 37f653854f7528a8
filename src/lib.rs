//! Telemetry overlays for action-camera footage.
//!
//! A recorded track (GPX) becomes a transparent video that shows speed, elevation, heart rate and
//! other readouts plus course and elevation charts with a moving marker:
//!
//! - Parse a [`Track`] and derive a [`RawActivity`] (attribute discovery, gradient smoothing)
//! - Resolve a [`Template`] describing the scene and its elements
//! - Build a [`Scene`], then export its frames into a [`FrameSink`] (by default `ffmpeg`
//!   writing ProRes 4444 with alpha), or call [`render_video`] for the whole job
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

pub(crate) mod activity;
pub(crate) mod compose;
pub(crate) mod encode;
pub(crate) mod figure;
pub(crate) mod scene;
pub(crate) mod template;
pub(crate) mod track;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, FrameStamp, Point, Rect, Rgba8, Vec2,
};
pub use crate::foundation::error::{OverlayError, OverlayResult};

pub use crate::activity::attribute::{
    AttributeKind, AttributeValue, Capabilities, ChannelPath, LatLon, Series,
};
pub use crate::activity::discover::{Discovery, discover};
pub use crate::activity::gradient::{
    SmoothingParams, extrapolate_first, lowess, smooth_gradients, suppress_outliers,
};
pub use crate::activity::resample::{extend_tail, resample_course, resample_numeric};
pub use crate::activity::{AttributeSnapshot, RawActivity, ResampledActivity, TrimmedActivity};

pub use crate::compose::compositor::{Compositor, RECLAIM_INTERVAL};
pub use crate::compose::format::{
    FT_PER_M, KMH_PER_MPS, MPH_PER_MPS, convert, default_suffix, elevation_label, format_time,
    format_value, round_value,
};
pub use crate::compose::plan::{DynamicElement, ElementPlan, StaticElement};
pub use crate::compose::text::{PreparedText, TextBrushRgba8, TextEngine};

pub use crate::encode::diagnostics::{
    DIAGNOSTIC_TAIL_LINES, Diagnostics, FfmpegProgress, ProgressSource, Severity,
};
pub use crate::encode::ffmpeg::{
    EncoderBackend, EncoderSink, FfmpegProRes, ensure_parent_dir, is_encoder_available,
};
pub use crate::encode::sink::{FrameRgba, FrameSink, InMemorySink, SinkConfig};

pub use crate::figure::chart::{
    ChartFigure, DEFAULT_LINE_WIDTH, build_figure, course_marker, elevation_marker,
    marker_edge_width, marker_radius,
};
pub use crate::figure::projection::Projection;

pub use crate::scene::export::{ExportStats, Scene};
pub use crate::scene::frames::{Frame, build_frames};
pub use crate::scene::job::{ExportOpts, render_video};
pub use crate::scene::progress::{
    CANCELLED_MESSAGE, CancelFlag, ETA_WINDOW, ProgressSnapshot, RenderProgress, RenderStatus,
};

pub use crate::template::model::{
    FillConfig, LabelConfig, LineConfig, PlotConfig, PointConfig, PointLabelConfig, SceneConfig,
    Template, TextStyle, Unit, ValueConfig,
};

pub use crate::track::model::{
    EARTH_RADIUS_M, Extension, ONE_DEGREE_M, Segment, Track, TrackPoint, distance_m,
};
