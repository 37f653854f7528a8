use super::*;

const FONT_DIR: &str = "/usr/share/fonts/truetype/dejavu";
const FONT: &str = "DejaVuSans.ttf";

fn engine() -> Option<TextEngine> {
    let e = TextEngine::new(Some(PathBuf::from(FONT_DIR)));
    e.resolve_font_path(FONT).is_some().then_some(e)
}

#[test]
fn missing_font_is_a_validation_error() {
    let mut e = TextEngine::new(None);
    let err = e
        .layout("x", "NoSuchFont.ttf", 12.0, Rgba8::WHITE)
        .err()
        .unwrap();
    assert!(matches!(err, OverlayError::Validation(_)));
    assert!(err.to_string().contains("NoSuchFont.ttf"));
}

#[test]
fn rejects_bad_sizes() {
    let mut e = TextEngine::new(None);
    assert!(e.layout("x", FONT, 0.0, Rgba8::WHITE).is_err());
    assert!(e.layout("x", FONT, f32::NAN, Rgba8::WHITE).is_err());
}

#[test]
fn layouts_are_cached_until_cleared() {
    let Some(mut e) = engine() else {
        return;
    };
    let a = e.layout("12.3 mph", FONT, 24.0, Rgba8::WHITE).unwrap();
    let b = e.layout("12.3 mph", FONT, 24.0, Rgba8::WHITE).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    e.layout("12.4 mph", FONT, 24.0, Rgba8::WHITE).unwrap();
    assert_eq!(e.cached_layouts(), 2);
    e.clear_layouts();
    assert_eq!(e.cached_layouts(), 0);
}

#[test]
fn multi_line_text_breaks_on_newlines() {
    let Some(mut e) = engine() else {
        return;
    };
    let two = e.layout("100 ft\n30 m", FONT, 20.0, Rgba8::WHITE).unwrap();
    assert_eq!(two.layout.lines().count(), 2);
}

#[test]
fn draws_glyphs_into_a_pixmap() {
    let Some(mut e) = engine() else {
        return;
    };
    let t = e.layout("Hi", FONT, 32.0, Rgba8::WHITE).unwrap();
    let mut ctx = vello_cpu::RenderContext::new(64, 48);
    draw_text(&mut ctx, &t, Point::new(4.0, 4.0));
    let mut pm = vello_cpu::Pixmap::new(64, 48);
    ctx.flush();
    ctx.render_to_pixmap(&mut pm);
    assert!(pm.data_as_u8_slice().chunks_exact(4).any(|px| px[3] > 0));
}
