//! Transactional edit driver shared by every mutation.
//!
//! An operation runs against a working copy of the album. Top-level folders are shared with the
//! input until written, so an edit copies only the spreads it touches. A miss discards the copy and
//! hands back the input album; a fatal error discards it and surfaces the error.

use std::collections::BTreeSet;

use crate::{
    catalog::layout::{ContentFamily, Layout},
    catalog::resources::{ResourceCatalog, Theme},
    catalog::styles::slot_frame_for,
    document::model::{Album, Child, Folder, FolderKind, Image, NodePath},
    foundation::core::{FolderId, ImageId, LayoutId, Point, Side, Size},
    foundation::error::{FolioError, FolioResult},
    foundation::events::{Correction, Miss},
    foundation::math::Rng64,
    geometry::fit::refit,
    geometry::slots::{apply_layout, container_ratio},
    mutation::intent::{NewImage, PageRef},
};

/// Engine configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOpts {
    /// Seed for template and layout picks.
    pub seed: u64,
    /// Random picks tried by `shuffle_layout` before giving up.
    pub shuffle_attempts: u32,
    /// Random picks tried by `add_page` while looking for an unlocked template.
    pub template_attempts: u32,
    /// Validate the whole album after every applied edit.
    pub verify: bool,
}

impl Default for EngineOpts {
    fn default() -> Self {
        Self {
            seed: 0,
            shuffle_attempts: 8,
            template_attempts: 8,
            verify: true,
        }
    }
}

/// How an edit ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The album changed.
    Applied,
    /// The request was valid but had nothing to do.
    Unchanged,
    /// Something the request named could not be resolved; the album is the input album.
    Missed(Miss),
}

/// A region of the album an edit wrote to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TouchedRegion {
    /// Contents of the book spread at this index changed.
    Spread(usize),
    /// The cover changed.
    Cover,
    /// A spread was inserted at this index; later spreads shifted up.
    SpreadInserted(usize),
    /// The spread at this index was removed; later spreads shifted down.
    SpreadRemoved(usize),
}

/// Result of one engine operation.
#[derive(Clone, Debug)]
pub struct Edit {
    /// Album after the edit (the input album unless [`Outcome::Applied`]).
    pub album: Album,
    /// How the edit ended.
    pub outcome: Outcome,
    /// Self-healed data problems met along the way.
    pub corrections: Vec<Correction>,
    /// Image records removed from the album but handed back to the caller.
    pub detached: Vec<Image>,
    /// Regions written, in the order they were written.
    pub touched: Vec<TouchedRegion>,
}

impl Edit {
    pub(crate) fn untouched(album: &Album, outcome: Outcome, corrections: Vec<Correction>) -> Self {
        Self {
            album: album.clone(),
            outcome,
            corrections,
            detached: Vec::new(),
            touched: Vec::new(),
        }
    }

    /// `true` when the album changed.
    pub fn is_applied(&self) -> bool {
        self.outcome == Outcome::Applied
    }

    /// The miss, when the edit was a no-op because something did not resolve.
    pub fn miss(&self) -> Option<&Miss> {
        match &self.outcome {
            Outcome::Missed(m) => Some(m),
            _ => None,
        }
    }
}

pub(crate) enum Abort {
    Miss(Miss),
    Fatal(FolioError),
}

impl From<FolioError> for Abort {
    fn from(e: FolioError) -> Self {
        Self::Fatal(e)
    }
}

impl From<Miss> for Abort {
    fn from(m: Miss) -> Self {
        Self::Miss(m)
    }
}

pub(crate) type Step<T> = Result<T, Abort>;

pub(crate) fn fatal(msg: impl Into<String>) -> Abort {
    Abort::Fatal(FolioError::invariant(msg))
}

/// Runs album edits against a read-only resource catalog.
#[derive(Debug)]
pub struct Engine<'a> {
    catalog: &'a ResourceCatalog,
    rng: Rng64,
    opts: EngineOpts,
}

impl<'a> Engine<'a> {
    /// Engine over `catalog`; the seed in `opts` starts its RNG.
    pub fn new(catalog: &'a ResourceCatalog, opts: EngineOpts) -> Self {
        Self {
            catalog,
            rng: Rng64::new(opts.seed),
            opts,
        }
    }

    /// Catalog the engine resolves layouts against.
    pub fn catalog(&self) -> &'a ResourceCatalog {
        self.catalog
    }

    /// Options the engine was built with.
    pub fn opts(&self) -> &EngineOpts {
        &self.opts
    }

    pub(crate) fn run<F>(&mut self, album: &Album, op: &'static str, f: F) -> FolioResult<Edit>
    where
        F: FnOnce(&mut Txn<'a>, &mut Rng64, &EngineOpts) -> Step<()>,
    {
        let Some(theme) = self.catalog.theme(&album.theme) else {
            let miss = Miss::ThemeNotFound {
                theme: album.theme.clone(),
            };
            tracing::debug!(op, %miss, "edit missed");
            return Ok(Edit::untouched(album, Outcome::Missed(miss), Vec::new()));
        };

        let mut txn = Txn {
            album: album.clone(),
            catalog: self.catalog,
            theme,
            corrections: Vec::new(),
            detached: Vec::new(),
            touched: Vec::new(),
        };
        match f(&mut txn, &mut self.rng, &self.opts) {
            Ok(()) => {
                for c in &txn.corrections {
                    tracing::warn!(op, correction = ?c, "data corrected");
                }
                if txn.album == *album && txn.detached.is_empty() {
                    return Ok(Edit::untouched(album, Outcome::Unchanged, txn.corrections));
                }
                if self.opts.verify {
                    if let Err(e) = txn.album.validate(self.catalog) {
                        tracing::error!(op, error = %e, "edit produced an invalid album");
                        return Err(FolioError::invariant(format!("{op}: {e}")));
                    }
                }
                tracing::debug!(op, touched = txn.touched.len(), "edit applied");
                Ok(Edit {
                    album: txn.album,
                    outcome: Outcome::Applied,
                    corrections: txn.corrections,
                    detached: txn.detached,
                    touched: txn.touched,
                })
            }
            Err(Abort::Miss(miss)) => {
                tracing::debug!(op, %miss, "edit missed");
                Ok(Edit::untouched(album, Outcome::Missed(miss), Vec::new()))
            }
            Err(Abort::Fatal(e)) => {
                tracing::error!(op, error = %e, "edit aborted");
                Err(e)
            }
        }
    }
}

/// Working state of one edit.
pub(crate) struct Txn<'c> {
    pub(crate) album: Album,
    pub(crate) catalog: &'c ResourceCatalog,
    pub(crate) theme: &'c Theme,
    pub(crate) corrections: Vec<Correction>,
    pub(crate) detached: Vec<Image>,
    pub(crate) touched: Vec<TouchedRegion>,
}

impl<'c> Txn<'c> {
    pub(crate) fn page(&self, r: PageRef) -> Step<NodePath> {
        self.album
            .subtree(r.side)
            .find_page(r.id)
            .ok_or(Abort::Miss(Miss::PageNotFound { page: r.id }))
    }

    pub(crate) fn folder(&self, side: Side, path: &NodePath) -> Step<&Folder> {
        self.album
            .subtree(side)
            .folder(path)
            .ok_or_else(|| fatal(format!("dangling path {path:?}")))
    }

    pub(crate) fn folder_mut(&mut self, side: Side, path: &NodePath) -> Step<&mut Folder> {
        self.album
            .subtree_mut(side)
            .folder_mut(path)
            .ok_or_else(|| fatal(format!("dangling path {path:?}")))
    }

    /// Page at `r`, refusing locked pages.
    pub(crate) fn editable_page(&self, r: PageRef) -> Step<NodePath> {
        let path = self.page(r)?;
        let page = self.folder(r.side, &path)?;
        if page.locked {
            return Err(Miss::Locked { folder: page.id }.into());
        }
        Ok(path)
    }

    /// Layout of `page`, resolved in this album's theme.
    pub(crate) fn layout_of(&self, page: &Folder) -> Step<&'c Layout> {
        let id = page
            .layout
            .as_ref()
            .ok_or_else(|| fatal(format!("page {} carries no layout", page.id)))?;
        self.theme_layout(id)
    }

    pub(crate) fn theme_layout(&self, id: &LayoutId) -> Step<&'c Layout> {
        let in_theme = self
            .catalog
            .theme_of(id)
            .is_some_and(|t| t.name == self.theme.name);
        match self.catalog.layout(id) {
            Some(layout) if in_theme => Ok(layout),
            _ => Err(Miss::LayoutNotFound { layout: id.clone() }.into()),
        }
    }

    pub(crate) fn touch(&mut self, region: TouchedRegion) {
        if !self.touched.contains(&region) {
            self.touched.push(region);
        }
    }

    pub(crate) fn touch_path(&mut self, side: Side, path: &NodePath) {
        let region = match side {
            Side::Book => TouchedRegion::Spread(path.top),
            Side::Cover => TouchedRegion::Cover,
        };
        self.touch(region);
    }

    pub(crate) fn correct(&mut self, c: Option<Correction>) {
        self.corrections.extend(c);
    }

    /// Recompute the crop of every image bound on the page at `path`.
    pub(crate) fn refit_page(&mut self, side: Side, path: &NodePath) -> Step<()> {
        let page = self.folder(side, path)?;
        let layout = self.layout_of(page)?;
        let size = page.size;
        let bound: Vec<(usize, FolderId)> = page
            .slots()
            .enumerate()
            .filter(|(_, f)| f.kind == FolderKind::ImageSlot)
            .map(|(i, f)| (i, f.id))
            .collect();

        let subtree = self.album.subtree_mut(side);
        for (i, folder) in bound {
            let ratio = container_ratio(layout, size, i);
            if let Some(img) = subtree.images.iter_mut().find(|img| img.folder_id == folder) {
                self.corrections.extend(refit(img, ratio));
            }
        }
        Ok(())
    }

    /// Rebuild the page at `path` for `dest`, shrinking or growing its layout-bound slots.
    ///
    /// Shrinking drops empty slots first (last first), then filled slots from the end. Growing
    /// inserts empty slots before the trailing text slots. Returns the image records pruned with
    /// removed slots.
    pub(crate) fn relayout(
        &mut self,
        side: Side,
        path: &NodePath,
        dest: &'c Layout,
    ) -> Step<Vec<Image>> {
        let theme = self.theme;
        let target = dest.container_count();
        let page = self.folder(side, path)?;
        let slots: Vec<(usize, FolderKind, FolderId)> = page
            .children
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.folder().map(|f| (i, f)))
            .filter(|(_, f)| !f.kind.is_text())
            .map(|(i, f)| (i, f.kind, f.id))
            .collect();
        let sibling_frame = page
            .slots()
            .find(|f| f.kind.is_image_like())
            .and_then(|f| f.frame.clone());

        let mut drop_children = Vec::new();
        if slots.len() > target {
            let surplus = slots.len() - target;
            let empties = slots
                .iter()
                .rev()
                .filter(|(_, kind, _)| *kind == FolderKind::EmptySlot);
            let filled = slots
                .iter()
                .rev()
                .filter(|(_, kind, _)| *kind != FolderKind::EmptySlot);
            drop_children = empties.chain(filled).take(surplus).copied().collect();
        }

        let mut grow = Vec::new();
        for k in slots.len()..target {
            let spine = dest
                .placeable_at(k)
                .is_some_and(|c| c.family == ContentFamily::Spine);
            let slot = if spine {
                let id = FolderId(self.album.subtree_mut(side).allocate_id());
                Folder::new(id, FolderKind::SpineSlot, Size::default())
            } else {
                let mut slot = Folder::empty_slot(Size::default(), Point::ORIGIN);
                slot.frame = slot_frame_for(theme, sibling_frame.as_deref());
                slot
            };
            grow.push(Child::Folder(slot));
        }

        let page = self.folder_mut(side, path)?;
        let mut removed_ids = BTreeSet::new();
        let mut indices: Vec<usize> = drop_children.iter().map(|(i, ..)| *i).collect();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        for i in indices {
            if let Child::Folder(f) = page.children.remove(i) {
                f.walk(&mut |f| {
                    if !f.id.is_empty() {
                        removed_ids.insert(f.id);
                    }
                });
            }
        }
        let at = page.text_start();
        page.children.splice(at..at, grow);
        apply_layout(page, dest)?;

        let subtree = self.album.subtree_mut(side);
        let mut pruned = Vec::new();
        subtree.images.retain(|img| {
            let drop = removed_ids.contains(&img.folder_id);
            if drop {
                pruned.push(img.clone());
            }
            !drop
        });
        subtree
            .texts
            .retain(|t| !removed_ids.contains(&t.folder_id));

        self.refit_page(side, path)?;
        self.touch_path(side, path);
        Ok(pruned)
    }

    /// Bind new content to the empty slot at `slot` (layout-bound position) of the page at `path`.
    pub(crate) fn bind_new_image(
        &mut self,
        side: Side,
        path: &NodePath,
        slot: usize,
        content: &NewImage,
    ) -> Step<ImageId> {
        let page = self.folder(side, path)?;
        let layout = self.layout_of(page)?;
        let page_id = page.id;
        let ratio = container_ratio(layout, page.size, slot);
        let child = page
            .slot_child_index(slot)
            .filter(|&i| {
                page.children[i]
                    .folder()
                    .is_some_and(|f| f.kind == FolderKind::EmptySlot)
            })
            .ok_or_else(|| Miss::SlotNotFound {
                page: page_id,
                slot: format!("empty #{slot}"),
            })?;

        let subtree = self.album.subtree_mut(side);
        let folder_id = FolderId(subtree.allocate_id());
        let image_id = ImageId(subtree.allocate_id());
        let page = subtree
            .folder_mut(path)
            .ok_or_else(|| fatal(format!("dangling path {path:?}")))?;
        if let Some(f) = page.children[child].folder_mut() {
            f.id = folder_id;
            f.kind = FolderKind::ImageSlot;
        }

        let mut image = content.to_record(image_id, folder_id);
        let correction = refit(&mut image, ratio);
        subtree.images.push(image);
        self.correct(correction);
        self.touch_path(side, path);
        Ok(image_id)
    }

    /// Position (among layout-bound slots) of the first empty slot on the page at `path`.
    pub(crate) fn first_empty_slot(&self, side: Side, path: &NodePath) -> Step<Option<usize>> {
        let page = self.folder(side, path)?;
        Ok(page.slots().position(|f| f.kind == FolderKind::EmptySlot))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mutation/engine.rs"]
mod tests;
