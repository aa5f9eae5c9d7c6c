use std::fmt;
use std::path::Path;

use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};

use super::{SurfaceError, SurfaceResult};

/// Single-channel coverage for a run of text, positioned relative to the
/// start of its baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphMask {
    pub left: i32,
    pub top: i32,
    pub width: u32,
    pub height: u32,
    pub coverage: Vec<f32>,
}

impl GlyphMask {
    pub fn new(left: i32, top: i32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
            coverage: vec![0.0; width as usize * height as usize],
        }
    }

    pub fn coverage_at(&self, x: u32, y: u32) -> f32 {
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.coverage[y as usize * self.width as usize + x as usize]
    }

    fn accumulate(&mut self, x: i64, y: i64, value: f32) {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.coverage[index] = self.coverage[index].max(value);
    }
}

/// Turns a text run into bold coverage.
///
/// Implementations return `None` when the run has no visible glyphs.
pub trait GlyphRasterizer: Send + Sync + fmt::Debug {
    fn rasterize(&self, content: &str, font_size: f32) -> Option<GlyphMask>;
}

/// Outline rasterizer backed by a TrueType/OpenType font.
///
/// The font face is drawn emboldened by smearing coverage horizontally.
#[derive(Clone)]
pub struct FontRasterizer {
    font: FontArc,
}

impl fmt::Debug for FontRasterizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontRasterizer")
            .field("glyph_count", &self.font.glyph_count())
            .finish()
    }
}

impl FontRasterizer {
    pub fn from_bytes(bytes: Vec<u8>) -> SurfaceResult<Self> {
        let font = FontArc::try_from_vec(bytes).map_err(|_| SurfaceError::InvalidFont)?;
        Ok(Self { font })
    }

    pub fn from_path(path: &Path) -> SurfaceResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| SurfaceError::FontRead {
            path: path.to_path_buf(),
            source,
        })?;
        let rasterizer = Self::from_bytes(bytes)?;
        tracing::info!(?path, "loaded text font");
        Ok(rasterizer)
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn rasterize(&self, content: &str, font_size: f32) -> Option<GlyphMask> {
        let scaled = self.font.as_scaled(font_size);
        let mut caret = 0.0_f32;
        let mut previous: Option<GlyphId> = None;
        let mut outlines = Vec::new();

        for ch in content.chars().filter(|ch| !ch.is_control()) {
            let glyph_id = self.font.glyph_id(ch);
            if let Some(previous) = previous {
                caret += scaled.kern(previous, glyph_id);
            }
            let glyph = glyph_id.with_scale_and_position(font_size, point(caret, 0.0));
            caret += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);

            if let Some(outlined) = self.font.outline_glyph(glyph) {
                outlines.push(outlined);
            }
        }

        let first = outlines.first()?.px_bounds();
        let (mut min_x, mut min_y, mut max_x, mut max_y) =
            (first.min.x, first.min.y, first.max.x, first.max.y);
        for outlined in &outlines[1..] {
            let bounds = outlined.px_bounds();
            min_x = min_x.min(bounds.min.x);
            min_y = min_y.min(bounds.min.y);
            max_x = max_x.max(bounds.max.x);
            max_y = max_y.max(bounds.max.y);
        }

        let spread = bold_spread(font_size);
        let left = min_x.floor() as i32;
        let top = min_y.floor() as i32;
        let width = (max_x.ceil() as i32 - left).max(0) as u32 + spread;
        let height = (max_y.ceil() as i32 - top).max(0) as u32;
        let mut mask = GlyphMask::new(left, top, width, height);

        for outlined in &outlines {
            let bounds = outlined.px_bounds();
            let origin_x = i64::from(bounds.min.x as i32 - left);
            let origin_y = i64::from(bounds.min.y as i32 - top);
            outlined.draw(|x, y, value| {
                let mx = origin_x + i64::from(x);
                let my = origin_y + i64::from(y);
                for dx in 0..=i64::from(spread) {
                    mask.accumulate(mx + dx, my, value);
                }
            });
        }

        Some(mask)
    }
}

/// Extra horizontal pixels used to fake a bold weight.
fn bold_spread(font_size: f32) -> u32 {
    (font_size / 16.0).ceil().max(1.0) as u32
}
