//! Brush/text parameters and the input-mode state machine.

mod machine;

pub use crate::geometry::{Color, SurfacePoint};
pub use machine::{PointerAffordance, ToolEffect, ToolEvent, ToolMachine, ToolState};

use thiserror::Error;

pub const DEFAULT_STROKE_WIDTH: u8 = 3;
pub const DEFAULT_FONT_SIZE: u8 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("text placement requires non-empty content")]
    EmptyTextPlacement,
}

pub type ToolResult<T> = std::result::Result<T, ToolError>;

/// Stroke parameters copied into every segment at the moment it is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrushSpec {
    pub color: Color,
    pub stroke_width: u8,
}

impl BrushSpec {
    pub const fn new(color: Color, stroke_width: u8) -> Self {
        Self {
            color,
            stroke_width: clamp_u8_range(stroke_width, 1, u8::MAX),
        }
    }
}

impl Default for BrushSpec {
    fn default() -> Self {
        Self::new(Color::BLACK, DEFAULT_STROKE_WIDTH)
    }
}

/// A committed text placement, rendered once and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpec {
    pub content: String,
    pub font_size: u8,
    pub color: Color,
    pub anchor: SurfacePoint,
}

/// Parameters pushed in from the host's form controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolOptions {
    color: Color,
    stroke_width: u8,
    font_size: u8,
}

impl Default for ToolOptions {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            stroke_width: DEFAULT_STROKE_WIDTH,
            font_size: DEFAULT_FONT_SIZE,
        }
    }
}

impl ToolOptions {
    pub fn new(color: Color, stroke_width: u8, font_size: u8) -> Self {
        let mut options = Self::default();
        options.set_color(color);
        options.set_stroke_width(stroke_width);
        options.set_font_size(font_size);
        options
    }

    pub const fn color(&self) -> Color {
        self.color
    }

    pub const fn stroke_width(&self) -> u8 {
        self.stroke_width
    }

    pub const fn font_size(&self) -> u8 {
        self.font_size
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_stroke_width(&mut self, stroke_width: u8) {
        self.stroke_width = clamp_u8_range(stroke_width, 1, u8::MAX);
    }

    pub fn set_font_size(&mut self, font_size: u8) {
        self.font_size = clamp_u8_range(font_size, 1, u8::MAX);
    }

    pub const fn brush(&self) -> BrushSpec {
        BrushSpec::new(self.color, self.stroke_width)
    }

    pub fn text_spec(&self, content: String, font_size: u8, anchor: SurfacePoint) -> TextSpec {
        TextSpec {
            content,
            font_size,
            color: self.color,
            anchor,
        }
    }
}

const fn clamp_u8_range(value: u8, min: u8, max: u8) -> u8 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
