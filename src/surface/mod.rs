//! Raster buffer owning every pixel the session draws.

mod stroke;
mod text;

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use image::{imageops, ImageError, ImageFormat, Rgba, RgbaImage};
use thiserror::Error;

use crate::geometry::{Color, FitRect, SurfacePoint};
use crate::tools::{BrushSpec, TextSpec};

pub use stroke::{LineCap, StrokeStyle};
pub use text::{FontRasterizer, GlyphMask, GlyphRasterizer};

const BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 0]);

#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("no font is configured for text rendering")]
    FontUnavailable,
    #[error("font data could not be parsed")]
    InvalidFont,
    #[error("failed to read font file {path}: {source}")]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode surface as png: {0}")]
    Encode(#[source] ImageError),
}

pub type SurfaceResult<T> = std::result::Result<T, SurfaceError>;

/// Immutable capture of the whole surface at one instant.
///
/// Clones share the same buffer; nothing ever writes through it.
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot {
    pixels: Arc<RgbaImage>,
}

impl Snapshot {
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            pixels: Arc::new(RgbaImage::new(width, height)),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|pixel| *pixel == BACKGROUND)
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

pub struct PixelSurface {
    pixels: RgbaImage,
    style: StrokeStyle,
    rasterizer: Option<Arc<dyn GlyphRasterizer>>,
}

impl fmt::Debug for PixelSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelSurface")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("style", &self.style)
            .field("rasterizer", &self.rasterizer)
            .finish()
    }
}

impl PixelSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
            style: StrokeStyle::default(),
            rasterizer: None,
        }
    }

    pub fn with_rasterizer(mut self, rasterizer: Arc<dyn GlyphRasterizer>) -> Self {
        self.rasterizer = Some(rasterizer);
        self
    }

    pub fn set_rasterizer(&mut self, rasterizer: Option<Arc<dyn GlyphRasterizer>>) {
        self.rasterizer = rasterizer;
    }

    pub fn has_rasterizer(&self) -> bool {
        self.rasterizer.is_some()
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba<u8>> {
        if x < self.width() && y < self.height() {
            Some(*self.pixels.get_pixel(x, y))
        } else {
            None
        }
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        self.style
    }

    pub fn set_stroke_style(&mut self, style: StrokeStyle) {
        self.style = style;
    }

    pub fn is_blank(&self) -> bool {
        self.pixels.pixels().all(|pixel| *pixel == BACKGROUND)
    }

    pub fn draw_segment(&mut self, from: SurfacePoint, to: SurfacePoint, brush: BrushSpec) {
        stroke::paint_segment(
            &mut self.pixels,
            from,
            to,
            f32::from(brush.stroke_width),
            self.style,
            Rgba(brush.color.to_rgba()),
        );
    }

    pub fn draw_text(&mut self, spec: &TextSpec) -> SurfaceResult<()> {
        let rasterizer = self
            .rasterizer
            .as_ref()
            .ok_or(SurfaceError::FontUnavailable)?;
        let Some(mask) = rasterizer.rasterize(&spec.content, f32::from(spec.font_size)) else {
            tracing::debug!(content = %spec.content, "text run has no visible glyphs");
            return Ok(());
        };

        let origin_x = spec.anchor.x.round() as i64 + i64::from(mask.left);
        let origin_y = spec.anchor.y.round() as i64 + i64::from(mask.top);
        for my in 0..mask.height {
            for mx in 0..mask.width {
                let coverage = mask.coverage_at(mx, my);
                if coverage <= 0.0 {
                    continue;
                }
                let x = origin_x + i64::from(mx);
                let y = origin_y + i64::from(my);
                if x < 0 || y < 0 || x >= i64::from(self.width()) || y >= i64::from(self.height())
                {
                    continue;
                }
                let pixel = self.pixels.get_pixel_mut(x as u32, y as u32);
                blend_over(pixel, spec.color, coverage);
            }
        }
        Ok(())
    }

    /// Clears, then draws `source` scaled to fit and centered.
    pub fn blit_image(&mut self, source: &RgbaImage) {
        self.clear();
        self.draw_fitted(source);
    }

    pub fn clear(&mut self) {
        for pixel in self.pixels.pixels_mut() {
            *pixel = BACKGROUND;
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pixels: Arc::new(self.pixels.clone()),
        }
    }

    pub fn restore(&mut self, snapshot: &Snapshot) {
        if snapshot.width() == self.width() && snapshot.height() == self.height() {
            self.pixels.copy_from_slice(snapshot.pixels.as_raw());
            return;
        }
        self.blit_image(&snapshot.pixels);
    }

    /// Replaces the buffer with a blank one and resets the stroke style.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = RgbaImage::new(width, height);
        self.style = StrokeStyle::default();
    }

    pub fn encode_png(&self) -> SurfaceResult<Vec<u8>> {
        let mut bytes = Vec::new();
        self.pixels
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(SurfaceError::Encode)?;
        Ok(bytes)
    }

    fn draw_fitted(&mut self, source: &RgbaImage) {
        let Some(rect) =
            FitRect::centered(source.width(), source.height(), self.width(), self.height())
        else {
            return;
        };

        if rect.width == source.width() && rect.height == source.height() {
            imageops::replace(&mut self.pixels, source, i64::from(rect.x), i64::from(rect.y));
        } else {
            let scaled = imageops::resize(
                source,
                rect.width,
                rect.height,
                imageops::FilterType::Triangle,
            );
            imageops::replace(&mut self.pixels, &scaled, i64::from(rect.x), i64::from(rect.y));
        }
    }
}

/// Straight-alpha source-over of `color` at `coverage` onto `pixel`.
fn blend_over(pixel: &mut Rgba<u8>, color: Color, coverage: f32) {
    let src_alpha = coverage.clamp(0.0, 1.0);
    let dst_alpha = f32::from(pixel.0[3]) / 255.0;
    let out_alpha = src_alpha + dst_alpha * (1.0 - src_alpha);
    if out_alpha <= 0.0 {
        return;
    }

    let (r, g, b) = color.rgb();
    let mix = |src: u8, dst: u8| {
        let value = (f32::from(src) * src_alpha + f32::from(dst) * dst_alpha * (1.0 - src_alpha))
            / out_alpha;
        value.round().clamp(0.0, 255.0) as u8
    };

    *pixel = Rgba([
        mix(r, pixel.0[0]),
        mix(g, pixel.0[1]),
        mix(b, pixel.0[2]),
        (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}
