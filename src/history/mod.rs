//! Pointer-addressed snapshot history with branch truncation.

use std::num::NonZeroUsize;

use crate::surface::Snapshot;

/// What the surface must do after an undo or redo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryStep {
    Restore(Snapshot),
    Clear,
    Unchanged,
}

impl HistoryStep {
    pub const fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HistoryAction {
    Undo,
    Redo,
}

impl HistoryAction {
    const fn applied_message(self) -> &'static str {
        match self {
            Self::Undo => "undo applied",
            Self::Redo => "redo applied",
        }
    }

    const fn empty_message(self) -> &'static str {
        match self {
            Self::Undo => "nothing to undo",
            Self::Redo => "nothing to redo",
        }
    }
}

/// Affordance state handed to observers after every history change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryStatus {
    pub pointer: Option<usize>,
    pub len: usize,
    pub can_undo: bool,
    pub can_redo: bool,
}

#[derive(Debug, Clone, Default)]
pub struct HistoryStack {
    entries: Vec<Snapshot>,
    pointer: Option<usize>,
    capacity: Option<NonZeroUsize>,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(capacity: Option<NonZeroUsize>) -> Self {
        Self {
            entries: Vec::new(),
            pointer: None,
            capacity,
        }
    }

    /// Index of the current entry; `None` is the blank state before the first entry.
    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn current(&self) -> Option<&Snapshot> {
        self.pointer.and_then(|index| self.entries.get(index))
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.entries.last()
    }

    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.entries.get(index)
    }

    pub fn can_undo(&self) -> bool {
        self.pointer.is_some()
    }

    pub fn can_redo(&self) -> bool {
        self.next_index() < self.entries.len()
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            pointer: self.pointer,
            len: self.entries.len(),
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        }
    }

    pub fn push(&mut self, snapshot: Snapshot) {
        let keep = self.next_index();
        if keep < self.entries.len() {
            tracing::debug!(
                discarded = self.entries.len() - keep,
                "new commit discards redo branch"
            );
            self.entries.truncate(keep);
        }

        self.entries.push(snapshot);
        self.pointer = Some(self.entries.len() - 1);
        self.evict_over_capacity();
    }

    pub fn undo(&mut self) -> HistoryStep {
        let step = match self.pointer {
            None => HistoryStep::Unchanged,
            Some(0) => {
                self.pointer = None;
                HistoryStep::Clear
            }
            Some(index) => {
                self.pointer = Some(index - 1);
                self.entries
                    .get(index - 1)
                    .cloned()
                    .map_or(HistoryStep::Clear, HistoryStep::Restore)
            }
        };
        self.log_step(HistoryAction::Undo, &step);
        step
    }

    pub fn redo(&mut self) -> HistoryStep {
        let next = self.next_index();
        let step = match self.entries.get(next) {
            Some(snapshot) => {
                self.pointer = Some(next);
                HistoryStep::Restore(snapshot.clone())
            }
            None => HistoryStep::Unchanged,
        };
        self.log_step(HistoryAction::Redo, &step);
        step
    }

    fn next_index(&self) -> usize {
        self.pointer.map_or(0, |index| index + 1)
    }

    fn evict_over_capacity(&mut self) {
        let Some(capacity) = self.capacity else {
            return;
        };
        let Some(pointer) = self.pointer else {
            return;
        };

        let overflow = self.entries.len().saturating_sub(capacity.get());
        let evictable = overflow.min(pointer);
        if evictable == 0 {
            return;
        }

        self.entries.drain(..evictable);
        self.pointer = Some(pointer - evictable);
        tracing::debug!(evicted = evictable, capacity = capacity.get(), "history evicted oldest entries");
    }

    fn log_step(&self, action: HistoryAction, step: &HistoryStep) {
        if step.is_unchanged() {
            tracing::debug!(pointer = ?self.pointer, "{}", action.empty_message());
        } else {
            tracing::debug!(pointer = ?self.pointer, len = self.entries.len(), "{}", action.applied_message());
        }
    }
}
