//! Editing session: the current album plus engine, history and empty-slot index.

use crate::{
    catalog::resources::ResourceCatalog,
    document::model::Album,
    foundation::error::{FolioError, FolioResult},
    mutation::engine::{Edit, Engine, EngineOpts, Outcome},
    mutation::intent::Intent,
    session::history::History,
    tracker::index::EmptySlotIndex,
};

/// Session configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionOpts {
    /// Engine configuration.
    pub engine: EngineOpts,
    /// Maximum number of undo steps kept.
    pub history_limit: usize,
}

impl Default for SessionOpts {
    fn default() -> Self {
        Self {
            engine: EngineOpts::default(),
            history_limit: 100,
        }
    }
}

/// Single-writer editing session over one album.
#[derive(Debug)]
pub struct Session<'a> {
    engine: Engine<'a>,
    album: Album,
    history: History,
    empty_slots: EmptySlotIndex,
}

impl<'a> Session<'a> {
    /// Open a session on `album`, which must validate against `catalog`.
    pub fn open(
        catalog: &'a ResourceCatalog,
        album: Album,
        opts: SessionOpts,
    ) -> FolioResult<Self> {
        album.validate(catalog)?;
        let empty_slots = EmptySlotIndex::build(&album);
        tracing::debug!(
            spreads = album.book.folders.len(),
            empty = empty_slots.total(),
            "session opened"
        );
        Ok(Self {
            engine: Engine::new(catalog, opts.engine),
            album,
            history: History::new(opts.history_limit),
            empty_slots,
        })
    }

    /// Current album.
    pub fn album(&self) -> &Album {
        &self.album
    }

    /// Empty slots of the current album.
    pub fn empty_slots(&self) -> &EmptySlotIndex {
        &self.empty_slots
    }

    /// Undo/redo state.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Apply one intent. Applied edits become the current album and one undo step.
    pub fn apply(&mut self, intent: &Intent) -> FolioResult<Edit> {
        let edit = self.engine.apply(&self.album, intent)?;
        if edit.outcome == Outcome::Applied {
            self.history.record(&self.album, &edit.album);
            self.album = edit.album.clone();
            self.empty_slots.refresh(&self.album, &edit.touched);
        }
        Ok(edit)
    }

    /// Run several edits as one undo step.
    ///
    /// History is paused for the duration of `f`. If `f` fails the album rolls back to where the
    /// batch started.
    pub fn batch<T>(&mut self, f: impl FnOnce(&mut Self) -> FolioResult<T>) -> FolioResult<T> {
        let start = self.album.clone();
        let was_paused = self.history.is_paused();
        self.history.pause();
        let result = f(self);
        if !was_paused {
            self.history.resume();
        }
        match result {
            Ok(value) => {
                let end = self.album.clone();
                self.history.record(&start, &end);
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(error = %e, "batch rolled back");
                self.album = start;
                self.empty_slots.rebuild(&self.album);
                Err(e)
            }
        }
    }

    /// Restore the previous album. `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.album) {
            Some(prev) => {
                self.album = prev;
                self.empty_slots.rebuild(&self.album);
                true
            }
            None => false,
        }
    }

    /// Re-apply an undone edit. `false` when there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.album) {
            Some(next) => {
                self.album = next;
                self.empty_slots.rebuild(&self.album);
                true
            }
            None => false,
        }
    }

    /// Close the session and hand back the current album.
    pub fn into_album(self) -> Album {
        self.album
    }

    /// Replace the album wholesale (e.g. after a reload), dropping history.
    pub fn replace(&mut self, album: Album) -> FolioResult<()> {
        album
            .validate(self.engine.catalog())
            .map_err(|e| FolioError::validation(format!("replacement album: {e}")))?;
        self.album = album;
        self.history.clear();
        self.empty_slots.rebuild(&self.album);
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
