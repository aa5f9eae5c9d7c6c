//! Reconciles physical size changes with the history pointer.

use serde::Deserialize;

use crate::history::HistoryStack;
use crate::surface::{PixelSurface, Snapshot, StrokeStyle};

/// Which history entry is re-applied after a resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeRestore {
    /// The entry addressed by the history pointer; blank when undone past the start.
    #[default]
    Current,
    /// The newest entry, even when the pointer sits below it.
    Latest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResizeOutcome {
    InitialSnapshot,
    Restored { index: usize },
    Blank,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ResizeCoordinator {
    restore: ResizeRestore,
}

impl ResizeCoordinator {
    pub const fn new(restore: ResizeRestore) -> Self {
        Self { restore }
    }

    pub fn apply(
        &self,
        surface: &mut PixelSurface,
        history: &mut HistoryStack,
        width: u32,
        height: u32,
    ) -> ResizeOutcome {
        let previous = (surface.width(), surface.height());
        surface.resize(width, height);
        surface.set_stroke_style(StrokeStyle::ROUND);

        let outcome = if history.is_empty() {
            history.push(Snapshot::blank(width, height));
            ResizeOutcome::InitialSnapshot
        } else {
            let index = match self.restore {
                ResizeRestore::Current => history.pointer(),
                ResizeRestore::Latest => history.len().checked_sub(1),
            };
            match index.and_then(|index| history.get(index).map(|snapshot| (index, snapshot))) {
                Some((index, snapshot)) => {
                    surface.restore(snapshot);
                    ResizeOutcome::Restored { index }
                }
                None => ResizeOutcome::Blank,
            }
        };

        tracing::info!(
            from = ?previous,
            to = ?(width, height),
            outcome = ?outcome,
            "surface resized"
        );
        outcome
    }
}
