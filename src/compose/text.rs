use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;

use crate::foundation::{
    core::{Point, Rgba8},
    error::{OverlayError, OverlayResult},
    raster::affine_to_cpu,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Shaped text plus the font data its glyph ids refer to.
pub struct PreparedText {
    /// Parley layout, origin at the top-left of the first line box.
    pub layout: parley::Layout<TextBrushRgba8>,
    /// Font used for every run of the layout.
    pub font: vello_cpu::peniko::FontData,
}

#[derive(Clone)]
struct LoadedFont {
    family: String,
    data: vello_cpu::peniko::FontData,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct LayoutKey {
    font: String,
    size_bits: u32,
    brush: TextBrushRgba8,
    text: String,
}

/// Font registry and text shaper with a layout cache.
///
/// Fonts are named by file; a name that is not an existing path is looked up in the fonts
/// directory. Each font file is registered with Parley once.
pub struct TextEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    fonts_dir: Option<PathBuf>,
    fonts: HashMap<String, LoadedFont>,
    layouts: HashMap<LayoutKey, Arc<PreparedText>>,
}

impl TextEngine {
    /// Engine resolving bare font names against `fonts_dir`.
    pub fn new(fonts_dir: Option<PathBuf>) -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            fonts_dir,
            fonts: HashMap::new(),
            layouts: HashMap::new(),
        }
    }

    /// Path a font name resolves to, if the file exists.
    pub fn resolve_font_path(&self, font: &str) -> Option<PathBuf> {
        let direct = Path::new(font);
        if direct.is_file() {
            return Some(direct.to_path_buf());
        }
        let joined = self.fonts_dir.as_ref()?.join(font);
        joined.is_file().then_some(joined)
    }

    fn load_font(&mut self, font: &str) -> OverlayResult<LoadedFont> {
        if let Some(f) = self.fonts.get(font) {
            return Ok(f.clone());
        }
        let path = self.resolve_font_path(font).ok_or_else(|| {
            OverlayError::validation(format!(
                "font '{font}' not found (fonts dir: {})",
                self.fonts_dir
                    .as_deref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_else(|| "<none>".to_owned())
            ))
        })?;
        let bytes =
            std::fs::read(&path).with_context(|| format!("read font '{}'", path.display()))?;

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(bytes.clone()), None);
        let family_id = families.first().map(|(id, _)| *id).ok_or_else(|| {
            OverlayError::validation(format!("no font families registered from '{font}'"))
        })?;
        let family = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| OverlayError::validation("registered font family has no name"))?
            .to_string();

        let loaded = LoadedFont {
            family,
            data: vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(bytes), 0),
        };
        tracing::debug!(font, family = %loaded.family, "font registered");
        self.fonts.insert(font.to_owned(), loaded.clone());
        Ok(loaded)
    }

    /// Shape `text` (newlines break lines), reusing a cached layout when possible.
    pub fn layout(
        &mut self,
        text: &str,
        font: &str,
        size_px: f32,
        color: Rgba8,
    ) -> OverlayResult<Arc<PreparedText>> {
        if !size_px.is_finite() || size_px <= 0.0 {
            return Err(OverlayError::validation(
                "text size_px must be finite and > 0",
            ));
        }
        let brush = TextBrushRgba8::from(color);
        let key = LayoutKey {
            font: font.to_owned(),
            size_bits: size_px.to_bits(),
            brush,
            text: text.to_owned(),
        };
        if let Some(hit) = self.layouts.get(&key) {
            return Ok(Arc::clone(hit));
        }

        let loaded = self.load_font(font)?;
        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(std::borrow::Cow::Owned(loaded.family)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(size_px));
        builder.push_default(parley::style::StyleProperty::Brush(brush));

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(None);

        let prepared = Arc::new(PreparedText {
            layout,
            font: loaded.data,
        });
        self.layouts.insert(key, Arc::clone(&prepared));
        Ok(prepared)
    }

    /// Drop cached layouts; registered fonts stay.
    pub fn clear_layouts(&mut self) {
        self.layouts.clear();
    }

    /// Number of cached layouts.
    pub fn cached_layouts(&self) -> usize {
        self.layouts.len()
    }
}

/// Fill `text` with its top-left corner at `origin`.
pub(crate) fn draw_text(ctx: &mut vello_cpu::RenderContext, text: &PreparedText, origin: Point) {
    ctx.set_transform(affine_to_cpu(crate::foundation::core::Affine::translate(
        origin.to_vec2(),
    )));
    for line in text.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&text.font)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/compose/text.rs"]
mod tests;
