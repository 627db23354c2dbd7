use std::collections::BTreeSet;

use crate::{
    document::model::{Album, FolderKind, NodePath},
    foundation::core::{FolderId, ImageId, LayoutId, Side},
    foundation::error::FolioResult,
    foundation::events::Miss,
    mutation::engine::{Edit, Engine, Step, Txn, fatal},
    mutation::intent::{NewImage, PageRef, SlotRef},
    orientation::transform::{CropTransform, reorient},
};

/// Snapshot of one layout-bound slot.
struct SlotInfo {
    path: NodePath,
    child: usize,
    id: FolderId,
    kind: FolderKind,
    locked: bool,
}

fn slot_at(txn: &Txn<'_>, slot: SlotRef) -> Step<SlotInfo> {
    let path = txn.editable_page(slot.page)?;
    let page = txn.folder(slot.page.side, &path)?;
    let not_found = || Miss::SlotNotFound {
        page: slot.page.id,
        slot: format!("#{}", slot.index),
    };
    let child = page.slot_child_index(slot.index).ok_or_else(not_found)?;
    let folder = page.children[child].folder().ok_or_else(not_found)?;
    Ok(SlotInfo {
        child,
        id: folder.id,
        kind: folder.kind,
        locked: folder.locked,
        path,
    })
}

fn set_slot(txn: &mut Txn<'_>, side: Side, at: &SlotInfo, id: FolderId) -> Step<()> {
    let page = txn.folder_mut(side, &at.path)?;
    let slot = page
        .children
        .get_mut(at.child)
        .and_then(|c| c.folder_mut())
        .ok_or_else(|| fatal(format!("slot {} vanished", at.child)))?;
    slot.id = id;
    slot.kind = if id.is_empty() {
        FolderKind::EmptySlot
    } else {
        FolderKind::ImageSlot
    };
    Ok(())
}

impl Engine<'_> {
    /// Add content to a page: into an empty slot when one is free, else by growing the layout by
    /// one container.
    ///
    /// `dest_layout` forces the grow path. Without `image` the grown slot stays empty as a
    /// placeholder.
    #[tracing::instrument(skip(self, album, dest_layout, image), fields(page = %page.id))]
    pub fn add_image(
        &mut self,
        album: &Album,
        page: PageRef,
        container: Option<usize>,
        dest_layout: Option<&LayoutId>,
        image: Option<&NewImage>,
    ) -> FolioResult<Edit> {
        self.run(album, "add_image", |txn, _, _| {
            let side = page.side;
            let path = txn.editable_page(page)?;
            let folder = txn.folder(side, &path)?;
            let current = txn.layout_of(folder)?;
            let count = folder.slot_count();
            let is_empty = |i: usize| {
                folder
                    .slots()
                    .nth(i)
                    .is_some_and(|f| f.kind == FolderKind::EmptySlot)
            };
            let free = container
                .filter(|&i| is_empty(i))
                .or_else(|| folder.slots().position(|f| f.kind == FolderKind::EmptySlot));

            let target = match (dest_layout, free) {
                (None, Some(slot)) => slot,
                (dest, _) => {
                    let grown = match dest {
                        Some(id) => {
                            let layout = txn.theme_layout(id)?;
                            if layout.container_count() != count + 1 || layout.span != current.span
                            {
                                return Err(Miss::NoLayoutForCount { count: count + 1 }.into());
                            }
                            layout
                        }
                        None => txn
                            .catalog
                            .resized(current, count + 1)
                            .ok_or(Miss::NoLayoutForCount { count: count + 1 })?,
                    };
                    txn.relayout(side, &path, grown)?;
                    count
                }
            };
            if let Some(content) = image {
                txn.bind_new_image(side, &path, target, content)?;
            }
            Ok(())
        })
    }

    /// Remove images from a page and shrink its layout by one container per image.
    ///
    /// When the theme has no layout that small, the page keeps its layout and the freed slots
    /// become empty.
    ///
    /// With `keep_records` the removed records are handed back in [`Edit::detached`].
    #[tracing::instrument(skip(self, album, images), fields(page = %page.id, n = images.len()))]
    pub fn remove_images(
        &mut self,
        album: &Album,
        page: PageRef,
        images: &[ImageId],
        keep_records: bool,
    ) -> FolioResult<Edit> {
        self.run(album, "remove_images", |txn, _, _| {
            let side = page.side;
            let path = txn.editable_page(page)?;
            let wanted: BTreeSet<ImageId> = images.iter().copied().collect();
            if wanted.is_empty() {
                return Ok(());
            }

            let folder = txn.folder(side, &path)?;
            let source = txn.layout_of(folder)?;
            let source_count = folder.slot_count();
            let subtree = txn.album.subtree(side);
            let mut positions = Vec::with_capacity(wanted.len());
            for &id in &wanted {
                let img = subtree.image(id).ok_or(Miss::ImageNotFound { image: id })?;
                if img.locked {
                    return Err(Miss::ImageLocked { image: id }.into());
                }
                let pos = folder
                    .slot_position(img.folder_id)
                    .ok_or(Miss::ImageNotFound { image: id })?;
                let child = folder
                    .slot_child_index(pos)
                    .ok_or_else(|| fatal(format!("slot {pos} has no child")))?;
                positions.push(child);
            }

            let dest_count = source_count.checked_sub(positions.len()).ok_or_else(|| {
                fatal(format!(
                    "removing {} images from {source_count} slots",
                    positions.len()
                ))
            })?;
            // Without a smaller layout the emptied slots stay as placeholders.
            let dest = txn.catalog.resized(source, dest_count).unwrap_or_else(|| {
                tracing::debug!(layout = %source.id, dest_count, "no smaller layout");
                source
            });
            if dest.container_count() > source_count {
                return Err(fatal(format!(
                    "shrink from '{}' picked '{}' with more containers",
                    source.id, dest.id
                )));
            }

            let page_folder = txn.folder_mut(side, &path)?;
            for child in positions {
                if let Some(slot) = page_folder
                    .children
                    .get_mut(child)
                    .and_then(|c| c.folder_mut())
                {
                    slot.id = FolderId::EMPTY;
                    slot.kind = FolderKind::EmptySlot;
                }
            }
            let subtree = txn.album.subtree_mut(side);
            let mut removed = Vec::new();
            subtree.images.retain(|img| {
                let hit = wanted.contains(&img.id);
                if hit {
                    removed.push(img.clone());
                }
                !hit
            });
            if keep_records {
                txn.detached.extend(removed);
            }

            let pruned = txn.relayout(side, &path, dest)?;
            if !pruned.is_empty() {
                return Err(fatal(format!(
                    "shrinking to '{}' dropped {} filled slots",
                    dest.id,
                    pruned.len()
                )));
            }
            Ok(())
        })
    }

    /// Move or swap the image in `source` with the slot at `dest`.
    ///
    /// An empty destination on another page is a move: the binding follows the image and the
    /// source page shrinks when a smaller layout exists. Two filled slots exchange bindings.
    #[tracing::instrument(
        skip(self, album),
        fields(source = %source.page.id, dest = %dest.page.id)
    )]
    pub fn swap_images(
        &mut self,
        album: &Album,
        source: SlotRef,
        dest: SlotRef,
    ) -> FolioResult<Edit> {
        self.run(album, "swap_images", |txn, _, _| {
            if source.page.side != dest.page.side {
                return Err(Miss::SlotNotFound {
                    page: dest.page.id,
                    slot: format!("#{} on the other subtree", dest.index),
                }
                .into());
            }
            if source == dest {
                return Ok(());
            }
            let side = source.page.side;
            let s = slot_at(txn, source)?;
            let d = slot_at(txn, dest)?;

            if !d.kind.is_image_like() {
                return Err(Miss::SlotNotFound {
                    page: dest.page.id,
                    slot: format!("#{}", dest.index),
                }
                .into());
            }
            if s.kind != FolderKind::ImageSlot {
                return Err(Miss::SourceSlotEmpty.into());
            }
            for slot in [&s, &d] {
                if slot.locked {
                    return Err(Miss::Locked { folder: slot.id }.into());
                }
            }
            let subtree = txn.album.subtree(side);
            let s_img = subtree
                .image_for_folder(s.id)
                .ok_or(Miss::SourceSlotEmpty)?;
            if s_img.locked {
                return Err(Miss::ImageLocked { image: s_img.id }.into());
            }
            let s_img = s_img.id;
            let d_img = subtree.image_for_folder(d.id).map(|i| (i.id, i.locked));
            if let Some((id, true)) = d_img {
                return Err(Miss::ImageLocked { image: id }.into());
            }

            match d_img {
                None => {
                    set_slot(txn, side, &d, s.id)?;
                    set_slot(txn, side, &s, FolderId::EMPTY)?;
                    if source.page.id != dest.page.id && side == Side::Book {
                        shrink_after_move(txn, side, &s.path)?;
                    }
                }
                Some((d_img, _)) if side == Side::Cover => {
                    let images = &mut txn.album.cover.images;
                    let (Some(a), Some(b)) = (
                        images.iter().position(|i| i.id == s_img),
                        images.iter().position(|i| i.id == d_img),
                    ) else {
                        return Err(fatal("cover images vanished mid-swap"));
                    };
                    let fa = images[a].folder_id;
                    images[a].folder_id = images[b].folder_id;
                    images[b].folder_id = fa;
                    images.swap(a, b);
                }
                Some(_) => {
                    set_slot(txn, side, &d, s.id)?;
                    set_slot(txn, side, &s, d.id)?;
                }
            }

            // The source page may have been rebuilt by the shrink above; refit through fresh paths.
            for r in [source.page, dest.page] {
                let path = txn.page(r)?;
                txn.refit_page(side, &path)?;
                txn.touch_path(side, &path);
            }
            Ok(())
        })
    }

    /// Apply a crop/orientation record from the image-editing collaborator to one image.
    #[tracing::instrument(skip(self, album, record))]
    pub fn apply_transform(
        &mut self,
        album: &Album,
        side: Side,
        image: ImageId,
        record: &CropTransform,
    ) -> FolioResult<Edit> {
        self.run(album, "apply_transform", |txn, _, _| {
            let subtree = txn.album.subtree(side);
            let img = subtree.image(image).ok_or(Miss::ImageNotFound { image })?;
            if img.locked {
                return Err(Miss::ImageLocked { image }.into());
            }
            let slot_path = subtree
                .find(img.folder_id)
                .ok_or_else(|| fatal(format!("{image} is bound to a missing slot")))?;
            let r = reorient(record, img.pixel_size());

            txn.corrections
                .extend(r.corrections.into_iter().map(|c| c.for_image(image)));
            let img = txn
                .album
                .subtree_mut(side)
                .image_mut(image)
                .ok_or_else(|| fatal(format!("{image} vanished")))?;
            img.orientation = r.orientation;
            img.alignment = r.alignment_deg;
            img.crop = r.crop;
            img.rotated = true;
            txn.touch_path(side, &slot_path);
            Ok(())
        })
    }
}

/// After a move left an empty slot behind, drop to a layout one container smaller if the theme
/// has one.
fn shrink_after_move(txn: &mut Txn<'_>, side: Side, path: &NodePath) -> Step<()> {
    let page = txn.folder(side, path)?;
    let layout = txn.layout_of(page)?;
    let count = page.slot_count();
    let Some(smaller) = count
        .checked_sub(1)
        .and_then(|n| txn.catalog.resized(layout, n))
    else {
        return Ok(());
    };
    let pruned = txn.relayout(side, path, smaller)?;
    if !pruned.is_empty() {
        return Err(fatal("shrinking a move source dropped filled slots"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/mutation/images.rs"]
mod tests;
