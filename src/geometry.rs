//! Shared geometric and color primitives used by the surface, tools and session.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub x: f32,
    pub y: f32,
}

impl SurfacePoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Placement of a scaled image inside a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl FitRect {
    /// Largest aspect-preserving rect for `source` inside `target`, centered on both axes.
    ///
    /// Returns `None` when either size is empty.
    pub fn centered(
        source_width: u32,
        source_height: u32,
        target_width: u32,
        target_height: u32,
    ) -> Option<Self> {
        if source_width == 0 || source_height == 0 || target_width == 0 || target_height == 0 {
            return None;
        }

        let scale_x = f64::from(target_width) / f64::from(source_width);
        let scale_y = f64::from(target_height) / f64::from(source_height);
        let scale = scale_x.min(scale_y);

        let width = scale_dimension(source_width, scale).clamp(1, target_width);
        let height = scale_dimension(source_height, scale).clamp(1, target_height);

        Some(Self {
            x: (target_width - width) / 2,
            y: (target_height - height) / 2,
            width,
            height,
        })
    }

    pub const fn is_full(&self, width: u32, height: u32) -> bool {
        self.x == 0 && self.y == 0 && self.width == width && self.height == height
    }
}

fn scale_dimension(base: u32, scale: f64) -> u32 {
    let scaled = (f64::from(base) * scale).round();
    if scaled <= 0.0 {
        0
    } else if scaled >= f64::from(u32::MAX) {
        u32::MAX
    } else {
        scaled as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    pub const fn to_rgba(self) -> [u8; 4] {
        [self.r, self.g, self.b, u8::MAX]
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}
