use super::{SurfacePoint, ToolError, ToolResult};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum ToolState {
    #[default]
    Idle,
    Drawing {
        last: SurfacePoint,
        segments: usize,
    },
    PendingText {
        content: String,
        font_size: u8,
    },
}

impl ToolState {
    pub const fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    pub const fn is_drawing(&self) -> bool {
        matches!(self, Self::Drawing { .. })
    }

    pub fn pending_text(&self) -> Option<&str> {
        match self {
            Self::PendingText { content, .. } => Some(content),
            _ => None,
        }
    }

    const fn drawn_segments(&self) -> usize {
        match self {
            Self::Drawing { segments, .. } => *segments,
            _ => 0,
        }
    }
}

/// Cursor the host should show over the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAffordance {
    Default,
    TextPlacement,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    Press(SurfacePoint),
    Move(SurfacePoint),
    Release,
    Leave,
    RequestText { content: String, font_size: u8 },
    CancelText,
}

/// Surface work produced by a single input event.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEffect {
    None,
    Segment {
        from: SurfacePoint,
        to: SurfacePoint,
    },
    CommitStroke,
    PlaceText {
        content: String,
        font_size: u8,
        anchor: SurfacePoint,
    },
}

#[derive(Debug, Default)]
pub struct ToolMachine {
    state: ToolState,
}

impl ToolMachine {
    pub fn new() -> Self {
        Self {
            state: ToolState::Idle,
        }
    }

    pub fn state(&self) -> &ToolState {
        &self.state
    }

    pub fn affordance(&self) -> PointerAffordance {
        match self.state {
            ToolState::PendingText { .. } => PointerAffordance::TextPlacement,
            ToolState::Idle | ToolState::Drawing { .. } => PointerAffordance::Default,
        }
    }

    /// Computes the state and effect `event` would produce without applying it.
    pub fn next(&self, event: &ToolEvent) -> ToolResult<(ToolState, ToolEffect)> {
        let stroke_end = if self.state.drawn_segments() > 0 {
            ToolEffect::CommitStroke
        } else {
            ToolEffect::None
        };

        let outcome = match (&self.state, event) {
            (ToolState::PendingText { content, font_size }, ToolEvent::Press(at)) => (
                ToolState::Idle,
                ToolEffect::PlaceText {
                    content: content.clone(),
                    font_size: *font_size,
                    anchor: *at,
                },
            ),
            (ToolState::Idle | ToolState::Drawing { .. }, ToolEvent::Press(at)) => (
                ToolState::Drawing {
                    last: *at,
                    segments: 0,
                },
                stroke_end,
            ),
            (ToolState::Drawing { last, segments }, ToolEvent::Move(to)) => (
                ToolState::Drawing {
                    last: *to,
                    segments: segments.saturating_add(1),
                },
                ToolEffect::Segment {
                    from: *last,
                    to: *to,
                },
            ),
            (ToolState::Drawing { .. }, ToolEvent::Release | ToolEvent::Leave) => {
                (ToolState::Idle, stroke_end)
            }
            (_, ToolEvent::RequestText { content, font_size }) => {
                let content = validated_content(content)?;
                (
                    ToolState::PendingText {
                        content,
                        font_size: *font_size,
                    },
                    stroke_end,
                )
            }
            (ToolState::PendingText { .. }, ToolEvent::CancelText) => {
                (ToolState::Idle, ToolEffect::None)
            }
            (
                ToolState::Idle | ToolState::PendingText { .. },
                ToolEvent::Move(_) | ToolEvent::Release | ToolEvent::Leave,
            )
            | (ToolState::Idle | ToolState::Drawing { .. }, ToolEvent::CancelText) => {
                (self.state.clone(), ToolEffect::None)
            }
        };

        Ok(outcome)
    }

    pub fn handle(&mut self, event: ToolEvent) -> ToolResult<ToolEffect> {
        let (next, effect) = self.next(&event).inspect_err(|err| {
            tracing::warn!(state = ?self.state, event = ?event, %err, "input event rejected");
        })?;

        if std::mem::discriminant(&next) != std::mem::discriminant(&self.state) {
            tracing::debug!(from = ?self.state, to = ?next, "tool state transition");
        }
        self.state = next;
        Ok(effect)
    }
}

fn validated_content(content: &str) -> ToolResult<String> {
    if content.trim().is_empty() {
        return Err(ToolError::EmptyTextPlacement);
    }
    Ok(content.to_string())
}
