use std::collections::VecDeque;

use crate::document::model::Album;

/// Undo/redo stacks of whole-album snapshots.
///
/// Snapshots share unchanged spreads with each other, so keeping many of them is cheap.
#[derive(Clone, Debug)]
pub struct History {
    past: VecDeque<Album>,
    future: Vec<Album>,
    limit: usize,
    paused: bool,
}

impl History {
    /// Empty history keeping at most `limit` undo steps.
    pub fn new(limit: usize) -> Self {
        Self {
            past: VecDeque::new(),
            future: Vec::new(),
            limit,
            paused: false,
        }
    }

    /// Record that `before` was replaced by `after`.
    ///
    /// Ignored while paused or when the two are structurally equal. Returns whether an entry was
    /// added.
    pub fn record(&mut self, before: &Album, after: &Album) -> bool {
        if self.paused || before == after || self.limit == 0 {
            return false;
        }
        if self.past.len() == self.limit {
            self.past.pop_front();
        }
        self.past.push_back(before.clone());
        self.future.clear();
        true
    }

    /// Stop recording until [`History::resume`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Record again after [`History::pause`].
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// `true` between [`History::pause`] and [`History::resume`].
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Step back from `current`; returns the album to restore.
    pub fn undo(&mut self, current: &Album) -> Option<Album> {
        let prev = self.past.pop_back()?;
        self.future.push(current.clone());
        Some(prev)
    }

    /// Step forward from `current`; returns the album to restore.
    pub fn redo(&mut self, current: &Album) -> Option<Album> {
        let next = self.future.pop()?;
        self.past.push_back(current.clone());
        if self.past.len() > self.limit {
            self.past.pop_front();
        }
        Some(next)
    }

    /// `true` when [`History::undo`] has a step to return.
    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    /// `true` when [`History::redo`] has a step to return.
    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of undo steps available.
    pub fn undo_depth(&self) -> usize {
        self.past.len()
    }

    /// Forget every step.
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/history.rs"]
mod tests;
