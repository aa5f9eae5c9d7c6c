use image::{Rgba, RgbaImage};

use crate::geometry::SurfacePoint;

/// How a segment ends at its two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    /// Flat end exactly at the endpoint; a zero-length segment paints nothing.
    #[default]
    Butt,
    /// Half-disc past the endpoint, so consecutive segments join without gaps.
    Round,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StrokeStyle {
    pub cap: LineCap,
}

impl StrokeStyle {
    pub const ROUND: Self = Self {
        cap: LineCap::Round,
    };
}

/// Paints every pixel whose center lies within `width / 2` of the segment.
pub(super) fn paint_segment(
    pixels: &mut RgbaImage,
    from: SurfacePoint,
    to: SurfacePoint,
    width: f32,
    style: StrokeStyle,
    color: Rgba<u8>,
) {
    let radius = (width * 0.5).max(0.5);
    let Some((x0, y0, x1, y1)) = segment_bounds(pixels, from, to, radius) else {
        return;
    };

    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_sq = dx * dx + dy * dy;
    let radius_sq = radius * radius;

    for y in y0..y1 {
        for x in x0..x1 {
            let cx = x as f32 + 0.5;
            let cy = y as f32 + 0.5;

            let t = if length_sq > f32::EPSILON {
                ((cx - from.x) * dx + (cy - from.y) * dy) / length_sq
            } else {
                0.0
            };

            let t = match style.cap {
                LineCap::Butt => {
                    if length_sq <= f32::EPSILON || !(0.0..=1.0).contains(&t) {
                        continue;
                    }
                    t
                }
                LineCap::Round => t.clamp(0.0, 1.0),
            };

            let nearest_x = from.x + dx * t;
            let nearest_y = from.y + dy * t;
            let dist_sq = (cx - nearest_x).powi(2) + (cy - nearest_y).powi(2);
            if dist_sq <= radius_sq {
                pixels.put_pixel(x, y, color);
            }
        }
    }
}

fn segment_bounds(
    pixels: &RgbaImage,
    from: SurfacePoint,
    to: SurfacePoint,
    radius: f32,
) -> Option<(u32, u32, u32, u32)> {
    if !(from.x.is_finite() && from.y.is_finite() && to.x.is_finite() && to.y.is_finite()) {
        return None;
    }

    let clamp_x = |value: f32| value.clamp(0.0, pixels.width() as f32) as u32;
    let clamp_y = |value: f32| value.clamp(0.0, pixels.height() as f32) as u32;

    let x0 = clamp_x((from.x.min(to.x) - radius).floor());
    let y0 = clamp_y((from.y.min(to.y) - radius).floor());
    let x1 = clamp_x((from.x.max(to.x) + radius).ceil());
    let y1 = clamp_y((from.y.max(to.y) + radius).ceil());

    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some((x0, y0, x1, y1))
}
