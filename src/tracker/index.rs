//! Incremental index of image slots with nothing bound.

use std::collections::{BTreeMap, BTreeSet};

use crate::{
    document::model::{Album, Folder, FolderKind, Subtree},
    foundation::core::FolderId,
    mutation::engine::TouchedRegion,
};

/// Key of one tracked region: a book spread by index, or the whole cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpreadKey {
    /// Book spread at this index.
    Book(usize),
    /// The cover.
    Cover,
}

/// An image-like slot with no image record bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EmptySlot {
    /// Page holding the slot.
    pub page: FolderId,
    /// Position among the page's layout-bound slots.
    pub index: usize,
    /// Slot folder id; the sentinel for empty slots.
    pub folder: FolderId,
}

/// Spread → empty slots, kept current by re-scanning only the regions an edit touched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmptySlotIndex {
    by_spread: BTreeMap<SpreadKey, Vec<EmptySlot>>,
}

impl EmptySlotIndex {
    /// Scan the whole album.
    pub fn build(album: &Album) -> Self {
        let mut index = Self::default();
        index.rebuild(album);
        index
    }

    /// Drop everything and rescan the whole album.
    pub fn rebuild(&mut self, album: &Album) {
        self.by_spread.clear();
        for i in 0..album.book.folders.len() {
            self.rescan(album, SpreadKey::Book(i));
        }
        self.rescan(album, SpreadKey::Cover);
    }

    /// Bring the index up to date after an edit that wrote `touched`.
    pub fn refresh(&mut self, album: &Album, touched: &[TouchedRegion]) {
        for region in touched {
            match *region {
                TouchedRegion::Spread(i) => self.rescan(album, SpreadKey::Book(i)),
                TouchedRegion::Cover => self.rescan(album, SpreadKey::Cover),
                TouchedRegion::SpreadInserted(i) => {
                    self.shift(i, true);
                    self.rescan(album, SpreadKey::Book(i));
                }
                TouchedRegion::SpreadRemoved(i) => {
                    self.by_spread.remove(&SpreadKey::Book(i));
                    self.shift(i, false);
                }
            }
        }
    }

    /// Empty slots of one region.
    pub fn get(&self, key: SpreadKey) -> &[EmptySlot] {
        self.by_spread.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Regions with at least one empty slot, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (SpreadKey, &[EmptySlot])> {
        self.by_spread.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    /// Empty slots across all regions.
    pub fn total(&self) -> usize {
        self.by_spread.values().map(Vec::len).sum()
    }

    /// `true` when no region has an empty slot.
    pub fn is_empty(&self) -> bool {
        self.by_spread.is_empty()
    }

    fn rescan(&mut self, album: &Album, key: SpreadKey) {
        let found = match key {
            SpreadKey::Book(i) => album
                .book
                .folders
                .get(i)
                .map(|spread| scan(&album.book, &[spread.as_ref()]))
                .unwrap_or_default(),
            SpreadKey::Cover => {
                let roots: Vec<&Folder> = album.cover.folders.iter().map(|f| f.as_ref()).collect();
                scan(&album.cover, &roots)
            }
        };
        if found.is_empty() {
            self.by_spread.remove(&key);
        } else {
            self.by_spread.insert(key, found);
        }
    }

    /// Re-key book entries at or after `at` one step up (insert) or down (remove).
    fn shift(&mut self, at: usize, up: bool) {
        let keys: Vec<usize> = self
            .by_spread
            .keys()
            .filter_map(|k| match k {
                SpreadKey::Book(i) if *i >= at => Some(*i),
                _ => None,
            })
            .collect();
        let mut moved = Vec::with_capacity(keys.len());
        for i in keys {
            if let Some(slots) = self.by_spread.remove(&SpreadKey::Book(i)) {
                moved.push((i, slots));
            }
        }
        for (i, slots) in moved {
            let to = if up { i + 1 } else { i.saturating_sub(1) };
            self.by_spread.insert(SpreadKey::Book(to), slots);
        }
    }
}

fn scan(subtree: &Subtree, roots: &[&Folder]) -> Vec<EmptySlot> {
    let bound: BTreeSet<FolderId> = subtree.images.iter().map(|i| i.folder_id).collect();
    let mut out = Vec::new();
    for root in roots {
        root.walk(&mut |f| {
            if !f.kind.is_page_like() {
                return;
            }
            for (index, slot) in f.slots().enumerate() {
                let unbound = match slot.kind {
                    FolderKind::EmptySlot => true,
                    FolderKind::ImageSlot => !bound.contains(&slot.id),
                    _ => false,
                };
                if unbound {
                    out.push(EmptySlot {
                        page: f.id,
                        index,
                        folder: slot.id,
                    });
                }
            }
        });
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/tracker/index.rs"]
mod tests;
