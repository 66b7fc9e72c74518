//! System font provider using fontdb for lookup and rustybuzz for shaping

use std::sync::Arc;

use ahash::AHashMap;
use danmaku_core::FontFace;
use fontdb::{Database as FontDatabase, Family, Query, Stretch, Style, Weight, ID as FontId};
use log::{debug, warn};
use rustybuzz::UnicodeBuffer;
use tiny_skia::{Path, PathBuilder};

use super::{FontMetrics, GlyphSource, MonospaceFonts};
use crate::config::{FontSpec, FontTable};
use crate::utils::RenderError;

const ALL_FACES: [FontFace; 5] = [
    FontFace::Defont,
    FontFace::Mincho,
    FontFace::Gothic,
    FontFace::Simsun,
    FontFace::Gulim,
];

type FontData = Arc<dyn AsRef<[u8]> + Send + Sync>;

struct LoadedFace {
    id: FontId,
    data: FontData,
    index: u32,
}

/// Fonts resolved from the platform font database
///
/// Each [`FontFace`] is resolved once at construction. Faces with no match
/// reuse the default face; with no fonts at all, metrics fall back to
/// [`MonospaceFonts`].
pub struct SystemFonts {
    faces: AHashMap<FontFace, Arc<LoadedFace>>,
}

impl std::fmt::Debug for SystemFonts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut resolved: Vec<_> = self.faces.iter().map(|(face, loaded)| (face.name(), loaded.id)).collect();
        resolved.sort_by_key(|(name, _)| *name);
        f.debug_struct("SystemFonts").field("faces", &resolved).finish()
    }
}

impl SystemFonts {
    /// Load system fonts and resolve every face
    pub fn new(table: &FontTable) -> Self {
        let mut database = FontDatabase::new();
        database.load_system_fonts();
        Self::with_database(&database, table)
    }

    /// Resolve faces from an existing database
    pub fn with_database(database: &FontDatabase, table: &FontTable) -> Self {
        let mut faces = AHashMap::new();
        for face in ALL_FACES {
            match find_font(database, table.get(face)).and_then(|id| load_face(database, id)) {
                Ok(loaded) => {
                    debug!("font {} resolved to {:?}", face.name(), loaded.id);
                    faces.insert(face, Arc::new(loaded));
                }
                Err(err) => debug!("font {} unresolved: {err}", face.name()),
            }
        }

        if let Some(default) = faces.get(&FontFace::Defont).cloned() {
            for face in ALL_FACES {
                faces.entry(face).or_insert_with(|| Arc::clone(&default));
            }
        } else if faces.is_empty() {
            warn!("no usable system fonts, falling back to box glyphs");
        }

        Self { faces }
    }

    /// Whether at least one real font was found
    pub fn has_fonts(&self) -> bool {
        !self.faces.is_empty()
    }

    fn face(&self, font: FontFace) -> Option<&LoadedFace> {
        self.faces.get(&font).map(Arc::as_ref)
    }
}

fn query_for<'a>(families: &'a [Family<'a>], spec: &FontSpec) -> Query<'a> {
    Query {
        families,
        weight: Weight(spec.weight),
        stretch: Stretch::Normal,
        style: Style::Normal,
    }
}

/// Find the first family of `spec` present, then the generic fallback
fn find_font(database: &FontDatabase, spec: &FontSpec) -> Result<FontId, RenderError> {
    for name in &spec.families {
        let families = [Family::Name(name)];
        if let Some(id) = database.query(&query_for(&families, spec)) {
            return Ok(id);
        }
    }

    let generic = if spec.serif {
        [Family::Serif, Family::SansSerif]
    } else {
        [Family::SansSerif, Family::Serif]
    };
    database
        .query(&query_for(&generic, spec))
        .ok_or_else(|| RenderError::FontError(format!("none of {:?} available", spec.families)))
}

fn load_face(database: &FontDatabase, id: FontId) -> Result<LoadedFace, RenderError> {
    let (source, index) = database
        .face_source(id)
        .ok_or_else(|| RenderError::FontError("Failed to load font data".to_string()))?;

    let data: FontData = match source {
        fontdb::Source::Binary(data) => data,
        fontdb::Source::File(path) => Arc::new(
            std::fs::read(&path)
                .map_err(|e| RenderError::FontError(format!("Failed to read font file: {e}")))?,
        ),
        fontdb::Source::SharedFile(_, data) => data,
    };

    ttf_parser::Face::parse(data.as_ref().as_ref(), index)
        .map_err(|e| RenderError::FontError(format!("Failed to parse font: {e}")))?;

    Ok(LoadedFace { id, data, index })
}

/// A shaped glyph in font units
struct Placed {
    glyph_id: u16,
    x: i32,
    y: i32,
}

fn shape(face: &LoadedFace, text: &str) -> Result<(Vec<Placed>, i32, u16), RenderError> {
    let rb_face = rustybuzz::Face::from_slice(face.data.as_ref().as_ref(), face.index)
        .ok_or_else(|| RenderError::ShapingError("Failed to create font face".to_string()))?;
    let units_per_em = rb_face.units_per_em().max(1) as u16;

    let mut buffer = UnicodeBuffer::new();
    buffer.push_str(text);
    let output = rustybuzz::shape(&rb_face, &[], buffer);

    let mut pen = 0;
    let mut placed = Vec::with_capacity(output.len());
    for (info, pos) in output.glyph_infos().iter().zip(output.glyph_positions()) {
        placed.push(Placed {
            glyph_id: info.glyph_id as u16,
            x: pen + pos.x_offset,
            y: pos.y_offset,
        });
        pen += pos.x_advance;
    }
    Ok((placed, pen, units_per_em))
}

impl FontMetrics for SystemFonts {
    fn text_width(&self, text: &str, font: FontFace, font_size: f32) -> f32 {
        let Some(face) = self.face(font) else {
            return MonospaceFonts.text_width(text, font, font_size);
        };
        match shape(face, text) {
            Ok((_, advance, upem)) => advance as f32 * font_size / upem as f32,
            Err(err) => {
                debug!("shaping failed, estimating width: {err}");
                MonospaceFonts.text_width(text, font, font_size)
            }
        }
    }
}

/// Converts ttf-parser outlines into a tiny-skia path, flipping y
struct OutlineBuilder {
    builder: PathBuilder,
    scale: f32,
    dx: f32,
    dy: f32,
}

impl OutlineBuilder {
    fn point(&self, x: f32, y: f32) -> (f32, f32) {
        (self.dx + x * self.scale, self.dy - y * self.scale)
    }
}

impl ttf_parser::OutlineBuilder for OutlineBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.point(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x, y) = self.point(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.point(x1, y1);
        let (x2, y2) = self.point(x2, y2);
        let (x, y) = self.point(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

impl GlyphSource for SystemFonts {
    fn text_path(&self, text: &str, font: FontFace, font_size: f32) -> Result<Option<Path>, RenderError> {
        let Some(face) = self.face(font) else {
            return MonospaceFonts.text_path(text, font, font_size);
        };
        let (placed, _, upem) = shape(face, text)?;
        let ttf_face = ttf_parser::Face::parse(face.data.as_ref().as_ref(), face.index)
            .map_err(|e| RenderError::FontError(format!("Failed to parse font: {e}")))?;

        let scale = font_size / upem as f32;
        let mut outline = OutlineBuilder {
            builder: PathBuilder::new(),
            scale,
            dx: 0.0,
            dy: 0.0,
        };
        for glyph in placed {
            outline.dx = glyph.x as f32 * scale;
            outline.dy = -(glyph.y as f32) * scale;
            ttf_face.outline_glyph(ttf_parser::GlyphId(glyph.glyph_id), &mut outline);
        }
        Ok(outline.builder.finish())
    }
}
