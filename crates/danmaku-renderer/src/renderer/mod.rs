//! Frame compositor
//!
//! [`Renderer`] runs the whole pipeline once at construction (interpret,
//! measure, lay out) and then paints frames on demand. Bitmaps are
//! rasterized lazily through the [`BitmapCache`] unless
//! `eager_rasterize_all` is set.

mod item;
mod overlay;
mod video;

pub use item::{BitmapComment, BitmapSlot, CommentItem};
pub use overlay::FpsCounter;
pub use video::{fit_video, VideoFit, VideoHandle, VideoSource};

use std::sync::Arc;
use std::time::{Duration, Instant};

use danmaku_core::script::MAX_DURATION;
use danmaku_core::{sort_comments, Comment, Interpreter, Lane, ScriptState};
use log::{debug, warn};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Rect, Transform};

use crate::cache::{BitmapCache, CacheKey, CacheStats, Clock, MonotonicClock};
use crate::config::RenderConfig;
use crate::fonts::{GlyphSource, SystemFonts};
use crate::layout::{LayoutBox, LayoutEngine, TickIndex};
use crate::measure::TextMeasurer;
use crate::options::RendererOptions;
use crate::raster::{bitmap_padding, rasterize};
use crate::utils::RenderError;

/// Map canvas coordinates onto a surface of another size
///
/// The canvas keeps its aspect ratio and is centred, like a contain-fit video.
pub fn canvas_transform(surface: (f32, f32), canvas: (f32, f32)) -> Transform {
    let fit = fit_video(surface, canvas, false);
    Transform::from_row(fit.scale, 0.0, 0.0, fit.scale, fit.offset_x, fit.offset_y)
}

/// Paints comment overlays for a video position
pub struct Renderer {
    surface: Pixmap,
    options: RendererOptions,
    glyphs: Arc<dyn GlyphSource>,
    clock: Box<dyn Clock>,
    script: ScriptState,
    items: Vec<CommentItem>,
    timeline: TickIndex,
    cache: BitmapCache,
    last_vpos: Option<i64>,
    fps: FpsCounter,
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("surface", &(self.surface.width(), self.surface.height()))
            .field("items", &self.items.len())
            .field("last_vpos", &self.last_vpos)
            .field("cache", self.cache.stats())
            .finish()
    }
}

impl Renderer {
    /// Renderer using system fonts and the wall clock
    ///
    /// # Errors
    ///
    /// Returns an error when the options fail validation.
    pub fn new(surface: Pixmap, comments: Vec<Comment>, options: RendererOptions) -> Result<Self, RenderError> {
        options.validate()?;
        let glyphs = Arc::new(SystemFonts::new(&options.config.fonts));
        Self::with_parts(surface, comments, options, glyphs, Box::new(MonotonicClock::new()))
    }

    /// Renderer with explicit font and time sources
    ///
    /// # Errors
    ///
    /// Returns an error when the options fail validation.
    pub fn with_parts(
        surface: Pixmap,
        mut comments: Vec<Comment>,
        options: RendererOptions,
        glyphs: Arc<dyn GlyphSource>,
        clock: Box<dyn Clock>,
    ) -> Result<Self, RenderError> {
        options.validate()?;
        let config = &options.config;
        sort_comments(&mut comments);

        let started = Instant::now();
        let interpreter = Interpreter::new(&config.style);
        let mut script = ScriptState::new();
        let styled: Vec<_> = comments
            .iter()
            .map(|comment| interpreter.apply(&mut script, comment))
            .collect();
        debug!("interpreted {} comments in {:?}", styled.len(), started.elapsed());

        let started = Instant::now();
        let measurer = TextMeasurer::new(config, glyphs.as_ref(), options.scale);
        let measured: Vec<_> = styled
            .into_iter()
            .map(|styled| {
                if styled.directive {
                    Err(styled)
                } else {
                    Ok(measurer.measure(styled))
                }
            })
            .collect();
        debug!("measured {} comments in {:?}", measured.len(), started.elapsed());

        let boxes: Vec<LayoutBox> = measured
            .iter()
            .map(|item| match item {
                Ok(measured) => LayoutBox::from(measured),
                Err(directive) => LayoutBox {
                    vpos: directive.vpos,
                    long: directive.long,
                    lane: directive.lane,
                    owner: directive.owner,
                    layer: directive.layer,
                    width: 0.0,
                    height: 0.0,
                    invisible: true,
                },
            })
            .collect();
        let engine = LayoutEngine::new(
            config.canvas_width as f32,
            config.canvas_height as f32,
            config.collision_range,
        );
        let layout = engine.layout(&boxes);

        let items = measured
            .into_iter()
            .zip(boxes)
            .zip(layout.positions)
            .map(|((item, layout), position)| match item {
                Ok(measured) => CommentItem::Bitmap(BitmapComment {
                    measured,
                    layout,
                    position,
                    slot: BitmapSlot::Empty,
                }),
                Err(directive) => CommentItem::Directive(directive),
            })
            .collect();

        let mut renderer = Self {
            surface,
            options,
            glyphs,
            clock,
            script,
            items,
            timeline: layout.timeline,
            cache: BitmapCache::new(),
            last_vpos: None,
            fps: FpsCounter::default(),
        };
        if renderer.options.eager_rasterize_all {
            renderer.rasterize_all();
        }
        Ok(renderer)
    }

    fn rasterize_all(&mut self) {
        let started = Instant::now();
        for index in 0..self.items.len() {
            if self.items[index].invisible() {
                continue;
            }
            if let Err(err) = self.materialize(index, None) {
                warn!("comment {index} cannot be rasterized: {err}");
            }
        }
        debug!("rasterized {} comments in {:?}", self.items.len(), started.elapsed());
    }

    /// Bitmap for item `index`, from its slot, the cache, or a fresh raster
    ///
    /// A failure marks the item permanently failed. With `expiry` set, an
    /// eviction is queued for newly materialized bitmaps.
    fn materialize(&mut self, index: usize, expiry: Option<Duration>) -> Result<Arc<Pixmap>, RenderError> {
        let Some(comment) = self.items.get_mut(index).and_then(CommentItem::as_bitmap_mut) else {
            return Err(RenderError::DrawingError(format!("comment {index} is not drawable")));
        };
        match &comment.slot {
            BitmapSlot::Ready(bitmap) => return Ok(Arc::clone(bitmap)),
            BitmapSlot::Failed => {
                return Err(RenderError::DrawingError(format!("comment {index} failed earlier")))
            }
            BitmapSlot::Empty => {}
        }

        let config = &self.options.config;
        let styled = &comment.measured.styled;
        let result = CacheKey::new(&styled.segments, &styled.mail).and_then(|key| {
            let bitmap = match self.cache.claim(&key, index) {
                Some(bitmap) => bitmap,
                None => {
                    let bitmap = Arc::new(rasterize(config, self.glyphs.as_ref(), &comment.measured)?);
                    self.cache.insert(key.clone(), Arc::clone(&bitmap), index);
                    bitmap
                }
            };
            if let Some(delay) = expiry {
                let lifetime = Duration::from_millis(styled.long.clamp(0, MAX_DURATION) as u64 * 10);
                self.cache.schedule(key, index, delay.saturating_add(lifetime));
            }
            Ok(bitmap)
        });

        match result {
            Ok(bitmap) => {
                comment.slot = BitmapSlot::Ready(Arc::clone(&bitmap));
                Ok(bitmap)
            }
            Err(err) => {
                comment.slot = BitmapSlot::Failed;
                Err(err)
            }
        }
    }

    /// Canvas to surface mapping, uniformly scaled and centred
    fn canvas_transform(&self) -> Transform {
        let config = &self.options.config;
        canvas_transform(
            (self.surface.width() as f32, self.surface.height() as f32),
            (config.canvas_width as f32, config.canvas_height as f32),
        )
    }

    fn draw_video(&mut self) {
        let Some(frame) = self.options.video.as_ref().and_then(VideoHandle::frame) else {
            return;
        };
        let fit = fit_video(
            (self.surface.width() as f32, self.surface.height() as f32),
            (frame.width() as f32, frame.height() as f32),
            self.options.legacy_pip_aspect_mode,
        );
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        let transform = Transform::from_row(fit.scale, 0.0, 0.0, fit.scale, fit.offset_x, fit.offset_y);
        self.surface.draw_pixmap(0, 0, Pixmap::as_ref(&frame), &paint, transform, None);
    }

    /// Draw item `index` at `vpos`, returning whether anything was drawn
    fn draw_comment(&mut self, index: usize, vpos: i64, expiry: Duration, transform: Transform) -> bool {
        let Some(comment) = self.items.get(index).and_then(CommentItem::as_bitmap) else {
            return false;
        };
        if comment.measured.styled.invisible || matches!(comment.slot, BitmapSlot::Failed) {
            return false;
        }
        let Some(position) = comment.position else {
            return false;
        };

        let canvas_width = self.options.config.canvas_width as f32;
        let layout = comment.layout;
        let mut x = layout.x_at(vpos, canvas_width);
        if layout.lane == Lane::Scrolling && self.script.is_reversed(vpos, layout.owner) {
            x = canvas_width - layout.width - x;
        }
        let y = position.pos_y;
        let scale = comment.measured.scale;
        let pad = bitmap_padding(&self.options.config, scale);
        let line_height = comment.measured.line_height * scale;
        let line_widths = if self.options.show_collision_boxes {
            comment.measured.line_widths.clone()
        } else {
            Vec::new()
        };

        let bitmap = match self.materialize(index, Some(expiry)) {
            Ok(bitmap) => bitmap,
            Err(err) => {
                warn!("comment {index} marked unrenderable: {err}");
                return false;
            }
        };
        self.surface.draw_pixmap(
            0,
            0,
            Pixmap::as_ref(&bitmap),
            &PixmapPaint::default(),
            transform.pre_translate(x - pad, y - pad),
            None,
        );

        if self.options.show_collision_boxes {
            let lines: Vec<Rect> = line_widths
                .iter()
                .enumerate()
                .filter_map(|(n, width)| {
                    Rect::from_xywh(x, y + n as f32 * line_height, (width * scale).max(1.0), line_height)
                })
                .collect();
            if let Some(bounds) = Rect::from_xywh(x, y, layout.width.max(1.0), layout.height.max(1.0)) {
                overlay::collision_boxes(&mut self.surface, bounds, &lines, transform);
            }
        }
        true
    }

    /// Paint the frame for `vpos`
    ///
    /// Does nothing when `vpos` was painted last, unless `force` is set.
    /// Returns whether the surface was repainted.
    pub fn paint(&mut self, vpos: i64, force: bool) -> bool {
        if !force && self.last_vpos == Some(vpos) {
            return false;
        }
        self.last_vpos = Some(vpos);
        let started = Instant::now();

        let now = self.clock.now();
        for index in self.cache.drain_expired(now) {
            if let Some(comment) = self.items.get_mut(index).and_then(CommentItem::as_bitmap_mut) {
                if matches!(comment.slot, BitmapSlot::Ready(_)) {
                    comment.slot = BitmapSlot::Empty;
                }
            }
        }

        self.surface.fill(tiny_skia::Color::TRANSPARENT);
        self.draw_video();

        let transform = self.canvas_transform();
        let expiry = now.saturating_add(Duration::from_millis(self.options.config.cache_age_ms));
        let active = self.timeline.get(vpos).to_vec();
        let mut drawn = 0;
        if self.script.is_banned(vpos) {
            debug!("vpos {vpos} is inside a ban window");
        } else {
            for &index in &active {
                if self.draw_comment(index, vpos, expiry, transform) {
                    drawn += 1;
                }
            }
        }

        if self.options.show_fps {
            self.fps.tick(now);
            let label = self.fps.label();
            overlay::caption(&mut self.surface, self.glyphs.as_ref(), &label, 100.0, 100.0, transform);
        }
        if self.options.show_comment_count {
            let label = format!("Count:{}", active.len());
            overlay::caption(&mut self.surface, self.glyphs.as_ref(), &label, 100.0, 200.0, transform);
        }
        debug!("painted {drawn} comments at {vpos} in {:?}", started.elapsed());
        true
    }

    /// Clear the surface; the next paint redraws even at the same vpos
    pub fn clear(&mut self) {
        self.surface.fill(tiny_skia::Color::TRANSPARENT);
        self.last_vpos = None;
    }

    /// Painted surface
    pub fn surface(&self) -> &Pixmap {
        &self.surface
    }

    /// Give back the surface
    pub fn into_surface(self) -> Pixmap {
        self.surface
    }

    /// Comments active per tick
    pub fn timeline(&self) -> &TickIndex {
        &self.timeline
    }

    /// Comments in paint order
    pub fn items(&self) -> &[CommentItem] {
        &self.items
    }

    /// Rules collected by the interpreter
    pub fn script(&self) -> &ScriptState {
        &self.script
    }

    /// Rendering constants in use
    pub fn config(&self) -> &RenderConfig {
        &self.options.config
    }

    /// Bitmap cache counters
    pub fn cache_stats(&self) -> CacheStats {
        *self.cache.stats()
    }

    /// Queued bitmap evictions
    pub fn pending_evictions(&self) -> usize {
        self.cache.pending()
    }
}
