use crate::foundation::error::{OverlayError, OverlayResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Absolute 0-based frame index in export order.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Position of a frame on the activity timeline: whole second plus sub-second step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameStamp {
    /// Seconds since the start of the rendered window.
    pub second: u32,
    /// Step within the second, `0..fps`.
    pub sub: u32,
}

impl FrameStamp {
    /// Flatten into an absolute frame index for `fps`.
    pub fn index(self, fps: Fps) -> FrameIndex {
        FrameIndex(u64::from(self.second) * u64::from(fps.get()) + u64::from(self.sub))
    }
}

/// Integer frames-per-second, always > 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Fps(u32);

impl Fps {
    /// Create a validated FPS value.
    pub fn new(fps: u32) -> OverlayResult<Self> {
        if fps == 0 {
            return Err(OverlayError::validation("fps must be > 0"));
        }
        Ok(Self(fps))
    }

    /// Frames per second.
    pub fn get(self) -> u32 {
        self.0
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }

    /// Total frames in `seconds` whole seconds.
    pub fn frames_in(self, seconds: u32) -> u64 {
        u64::from(seconds) * u64::from(self.0)
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self(30)
    }
}

impl TryFrom<u32> for Fps {
    type Error = OverlayError;

    fn try_from(v: u32) -> Result<Self, Self::Error> {
        Self::new(v)
    }
}

impl From<Fps> for u32 {
    fn from(f: Fps) -> u32 {
        f.0
    }
}

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Largest width or height the rasterizer accepts once rounded to even.
    pub const MAX_DIMENSION: u32 = u16::MAX as u32 - 1;

    /// Round both dimensions up to the next even value (required by 4:4:4 ProRes muxing).
    ///
    /// Saturates at the largest even `u32`.
    pub fn even(self) -> Self {
        let up = |v: u32| v.checked_add(v & 1).unwrap_or(u32::MAX - 1);
        Self {
            width: up(self.width),
            height: up(self.height),
        }
    }

    /// Byte length of one tightly packed RGBA8 frame.
    pub fn rgba_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);

    /// Construct from channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Scale alpha by `opacity` in `[0, 1]`.
    pub fn with_opacity(self, opacity: f64) -> Self {
        let a = (f64::from(self.a) * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (leading `#` optional, case-insensitive).
    pub fn parse_hex(s: &str) -> OverlayResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> OverlayResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| OverlayError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if !s.is_ascii() {
            return Err(OverlayError::validation("hex color must be ASCII"));
        }
        match s.len() {
            6 => Ok(Self::new(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                255,
            )),
            8 => Ok(Self::new(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                hex_byte(&s[6..8])?,
            )),
            _ => Err(OverlayError::validation(
                "hex color must be #RRGGBB or #RRGGBBAA",
            )),
        }
    }

    pub(crate) fn to_cpu(self) -> vello_cpu::peniko::Color {
        vello_cpu::peniko::Color::from_rgba8(self.r, self.g, self.b, self.a)
    }
}

impl std::fmt::Display for Rgba8 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl serde::Serialize for Rgba8 {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
