//! Compositor behaviour with deterministic fonts and a manual clock

use std::sync::{Arc, Mutex};
use std::time::Duration;

use danmaku_core::script::MAX_DURATION;
use danmaku_core::{Color, Comment, CommentSize, FontFace, Lane};
use danmaku_renderer::{
    BitmapSlot, CommentItem, FontMetrics, GlyphSource, ManualClock, MonospaceFonts, RenderError,
    Renderer, RendererOptions,
};
use pretty_assertions::assert_eq;
use tiny_skia::{Path, Pixmap};

fn build(comments: Vec<Comment>, options: RendererOptions) -> (Renderer, ManualClock) {
    build_with(comments, options, Arc::new(MonospaceFonts))
}

fn build_with(
    comments: Vec<Comment>,
    options: RendererOptions,
    glyphs: Arc<dyn GlyphSource>,
) -> (Renderer, ManualClock) {
    let _ = env_logger::builder().is_test(true).try_init();
    let clock = ManualClock::new();
    let surface = Pixmap::new(1920, 1080).unwrap();
    let renderer = Renderer::with_parts(surface, comments, options, glyphs, Box::new(clock.clone())).unwrap();
    (renderer, clock)
}

/// Leftmost and rightmost columns with any ink
fn ink_columns(surface: &Pixmap) -> Option<(u32, u32)> {
    let width = surface.width();
    let mut columns = surface
        .pixels()
        .iter()
        .enumerate()
        .filter(|(_, p)| p.alpha() > 0)
        .map(|(i, _)| i as u32 % width);
    let first = columns.next()?;
    Some(columns.fold((first, first), |(lo, hi), x| (lo.min(x), hi.max(x))))
}

fn has_ink(surface: &Pixmap) -> bool {
    ink_columns(surface).is_some()
}

#[test]
fn plain_comment_defaults_and_timeline() {
    let (renderer, _) = build(vec![Comment::new(0, 100, "hello")], RendererOptions::default());
    let styled = renderer.items()[0].styled();
    assert_eq!(styled.lane, Lane::Scrolling);
    assert_eq!(styled.color, Color::WHITE);
    assert_eq!(styled.size, CommentSize::Medium);
    assert_eq!(styled.long, 300);

    let timeline = renderer.timeline();
    assert!(timeline.get(99).is_empty());
    for vpos in 100..=399 {
        assert_eq!(timeline.get(vpos), &[0], "vpos {vpos}");
    }
    assert!(timeline.get(400).is_empty());
}

#[test]
fn ban_window_suppresses_painting() {
    let (mut renderer, _) = build(
        vec![
            Comment::new(1, 50, "@コメント禁止 @200").as_owner(),
            Comment::new(2, 100, "visible").with_mail(["ue"]),
        ],
        RendererOptions::default(),
    );
    assert!(matches!(renderer.items()[0], CommentItem::Directive(_)));

    assert!(renderer.paint(100, false));
    assert!(!has_ink(renderer.surface()));
    assert_eq!(renderer.cache_stats().misses, 0);

    assert!(renderer.paint(249, false));
    assert!(!has_ink(renderer.surface()));

    assert!(renderer.paint(250, false));
    assert!(has_ink(renderer.surface()));
}

#[test]
fn reverse_mirrors_scrolling_comments() {
    let comment = || Comment::new(2, 10, "hi");

    let (mut plain, _) = build(vec![comment()], RendererOptions::default());
    plain.paint(40, false);
    let (lo, _) = ink_columns(plain.surface()).unwrap();
    assert!(lo > 960);

    let (mut reversed, _) = build(
        vec![Comment::new(1, 0, "@逆 全").as_owner(), comment()],
        RendererOptions::default(),
    );
    reversed.paint(40, false);
    let (_, hi) = ink_columns(reversed.surface()).unwrap();
    assert!(hi < 960);
}

#[test]
fn owner_targeted_reverse_ignores_user_comments() {
    let (mut renderer, _) = build(
        vec![Comment::new(1, 0, "@逆 投コメ").as_owner(), Comment::new(2, 10, "hi")],
        RendererOptions::default(),
    );
    renderer.paint(40, false);
    let (lo, _) = ink_columns(renderer.surface()).unwrap();
    assert!(lo > 960);
}

#[test]
fn paint_is_memoized_per_vpos() {
    let (mut renderer, _) = build(vec![Comment::new(0, 0, "x")], RendererOptions::default());
    assert!(renderer.paint(5, false));
    assert!(!renderer.paint(5, false));
    assert!(renderer.paint(5, true));
    renderer.clear();
    assert!(!has_ink(renderer.surface()));
    assert!(renderer.paint(5, false));
}

#[test]
fn identical_comments_share_a_bitmap() {
    let (mut renderer, _) = build(
        vec![
            Comment::new(0, 0, "same").with_mail(["red", "ue"]),
            Comment::new(1, 10, "same").with_mail(["ue", "red"]),
            Comment::new(2, 10, "same").with_mail(["ue"]),
        ],
        RendererOptions::default(),
    );
    renderer.paint(20, false);
    let stats = renderer.cache_stats();
    assert_eq!(stats.misses, 2);
    assert_eq!(stats.hits, 1);
}

#[test]
fn evictions_release_bitmaps_after_lifetime() {
    let (mut renderer, clock) = build(
        vec![Comment::new(0, 0, "same"), Comment::new(1, 10, "same")],
        RendererOptions::default(),
    );
    renderer.paint(20, false);
    assert_eq!(renderer.pending_evictions(), 2);

    // 300 ticks * 10ms + 2000ms cache age
    clock.advance(Duration::from_millis(4999));
    renderer.paint(21, false);
    assert_eq!(renderer.cache_stats().evictions, 0);

    clock.advance(Duration::from_millis(1));
    renderer.paint(22, false);
    let stats = renderer.cache_stats();
    assert_eq!(stats.stale, 1);
    assert_eq!(stats.evictions, 1);
    // both comments are still on screen and get rasterized again
    assert_eq!(stats.misses, 2);
    assert_eq!(renderer.pending_evictions(), 2);
}

#[test]
fn eager_mode_rasterizes_up_front_without_evictions() {
    let options = RendererOptions {
        eager_rasterize_all: true,
        ..RendererOptions::default()
    };
    let (mut renderer, _) = build(
        vec![
            Comment::new(0, 0, "a"),
            Comment::new(1, 5, "b").with_mail(["invisible"]),
            Comment::new(2, 5, "@デフォルト").as_owner(),
        ],
        options,
    );
    let ready: Vec<bool> = renderer
        .items()
        .iter()
        .map(|item| item.as_bitmap().is_some_and(|c| matches!(c.slot, BitmapSlot::Ready(_))))
        .collect();
    assert_eq!(ready, vec![true, false, false]);

    renderer.paint(10, false);
    assert_eq!(renderer.pending_evictions(), 0);
}

struct FragileFonts;

impl FontMetrics for FragileFonts {
    fn text_width(&self, text: &str, font: FontFace, font_size: f32) -> f32 {
        MonospaceFonts.text_width(text, font, font_size)
    }
}

impl GlyphSource for FragileFonts {
    fn text_path(&self, text: &str, font: FontFace, font_size: f32) -> Result<Option<Path>, RenderError> {
        if text.contains('!') {
            return Err(RenderError::FontError("no glyph".to_string()));
        }
        MonospaceFonts.text_path(text, font, font_size)
    }
}

#[test]
fn failed_comments_are_skipped_for_good() {
    let (mut renderer, _) = build_with(
        vec![Comment::new(0, 0, "boom!").with_mail(["ue"]), Comment::new(1, 0, "fine")],
        RendererOptions::default(),
        Arc::new(FragileFonts),
    );
    renderer.paint(10, false);
    assert!(renderer.items()[0].invisible());
    assert!(has_ink(renderer.surface()));
    let misses = renderer.cache_stats().misses;

    renderer.paint(11, false);
    assert_eq!(renderer.cache_stats().misses, misses);
}

/// Remembers every line it is asked to outline
#[derive(Default)]
struct RecordingFonts {
    lines: Mutex<Vec<String>>,
}

impl FontMetrics for RecordingFonts {
    fn text_width(&self, text: &str, font: FontFace, font_size: f32) -> f32 {
        MonospaceFonts.text_width(text, font, font_size)
    }
}

impl GlyphSource for RecordingFonts {
    fn text_path(&self, text: &str, font: FontFace, font_size: f32) -> Result<Option<Path>, RenderError> {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(text.to_string());
        }
        MonospaceFonts.text_path(text, font, font_size)
    }
}

#[test]
fn comment_count_reports_active_comments_during_a_ban() {
    let fonts = Arc::new(RecordingFonts::default());
    let options = RendererOptions {
        show_comment_count: true,
        ..RendererOptions::default()
    };
    let (mut renderer, _) = build_with(
        vec![
            Comment::new(0, 0, "@コメント禁止").as_owner(),
            Comment::new(1, 0, "x").with_mail(["ue"]),
        ],
        options,
        fonts.clone(),
    );
    renderer.paint(10, false);

    // the banned comment is never outlined, only the caption is
    let lines = fonts.lines.lock().unwrap();
    assert_eq!(lines.as_slice(), ["Count:1"]);
}

#[test]
fn debug_overlays_draw_captions() {
    let options = RendererOptions {
        show_fps: true,
        show_comment_count: true,
        show_collision_boxes: true,
        ..RendererOptions::default()
    };
    let (mut renderer, clock) = build(vec![Comment::new(0, 0, "x").with_mail(["shita"])], options);
    renderer.paint(1, false);
    clock.advance(Duration::from_millis(16));
    renderer.paint(2, false);

    let surface = renderer.surface();
    let caption_ink = (100..160).any(|y| (100..400).any(|x| surface.pixel(x, y).is_some_and(|p| p.alpha() > 0)));
    assert!(caption_ink);
}

#[test]
fn oversized_durations_degrade_instead_of_panicking() {
    let (mut renderer, _) = build(
        vec![
            Comment::new(0, 0, "@コメント禁止 @9223372036854775807").as_owner(),
            Comment::new(1, 10, "slow").with_mail(["@99999999999999999999"]),
            Comment::new(2, i64::MAX - 2, "late").with_mail(["ue", "@100000"]),
        ],
        RendererOptions::default(),
    );
    assert_eq!(renderer.items()[1].styled().long, MAX_DURATION);
    assert_eq!(renderer.timeline().get(10 + MAX_DURATION - 1), &[1]);
    assert!(renderer.paint(20, false));
    assert!(!has_ink(renderer.surface()));
    assert!(renderer.paint(i64::MAX - 1, false));
}

#[test]
fn options_validation_fails_construction() {
    let options = RendererOptions {
        scale: -1.0,
        ..RendererOptions::default()
    };
    let result = Renderer::with_parts(
        Pixmap::new(10, 10).unwrap(),
        Vec::new(),
        options,
        Arc::new(MonospaceFonts),
        Box::new(ManualClock::new()),
    );
    assert!(matches!(result, Err(RenderError::InvalidOptions(_))));
}
