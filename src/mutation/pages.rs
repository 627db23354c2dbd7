use std::collections::BTreeSet;
use std::sync::Arc;

use crate::{
    catalog::layout::LayoutSpan,
    document::ids::remap_folder_ids,
    document::model::{Album, Child, Folder, FolderKind, NodePath},
    foundation::core::{FolderId, LayoutId, Side},
    foundation::error::FolioResult,
    foundation::events::Miss,
    foundation::math::Rng64,
    geometry::slots::apply_layout,
    mutation::engine::{Edit, Engine, EngineOpts, Step, TouchedRegion, Txn, fatal},
    mutation::intent::InsertAt,
};

struct PageInfo {
    path: NodePath,
    id: FolderId,
    locked: bool,
    span: LayoutSpan,
}

impl Engine<'_> {
    /// Move the content of book page `source` onto page `dest`.
    ///
    /// Pages in between shift one step towards `source`. Locked pages, and pages whose layout spans
    /// a different kind of folder, keep their content and are skipped by the rotation.
    #[tracing::instrument(skip(self, album))]
    pub fn swap_pages(
        &mut self,
        album: &Album,
        source: FolderId,
        dest: FolderId,
    ) -> FolioResult<Edit> {
        self.run(album, "swap_pages", |txn, _, _| {
            let mut pages = Vec::new();
            for (path, folder) in txn.album.book.pages() {
                if folder.kind != FolderKind::Page {
                    continue;
                }
                pages.push(PageInfo {
                    id: folder.id,
                    locked: folder.locked,
                    span: txn.layout_of(folder)?.span,
                    path,
                });
            }
            let find = |id: FolderId| {
                pages
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or(Miss::PageNotFound { page: id })
            };
            let (s, d) = (find(source)?, find(dest)?);
            if s == d {
                return Ok(());
            }
            for i in [s, d] {
                let folder = pages[i].id;
                if pages[i].locked {
                    return Err(Miss::Locked { folder }.into());
                }
            }
            if pages[s].span != pages[d].span {
                let layout_of = |i: usize| {
                    txn.album
                        .book
                        .folder(&pages[i].path)
                        .and_then(|f| f.layout.clone())
                };
                return Err(Miss::LayoutMismatch {
                    expected: layout_of(s).unwrap_or_else(|| LayoutId::new("")),
                    found: layout_of(d),
                }
                .into());
            }

            let span = pages[s].span;
            let (lo, hi) = (s.min(d), s.max(d));
            let ring: Vec<usize> = (lo..=hi)
                .filter(|&i| !pages[i].locked && pages[i].span == span)
                .collect();

            let mut contents = Vec::with_capacity(ring.len());
            for &i in &ring {
                let page = txn.folder(Side::Book, &pages[i].path)?;
                contents.push((page.children.clone(), page.layout.clone()));
            }
            if s < d {
                contents.rotate_left(1);
            } else {
                contents.rotate_right(1);
            }

            for (&i, (children, layout)) in ring.iter().zip(contents) {
                let path = pages[i].path.clone();
                let Some(layout) = layout else {
                    return Err(fatal(format!("{} has no layout", pages[i].id)));
                };
                let resolved = txn.theme_layout(&layout)?;
                let page = txn.folder_mut(Side::Book, &path)?;
                page.children = children;
                apply_layout(page, resolved)?;
                txn.refit_page(Side::Book, &path)?;
                txn.touch_path(Side::Book, &path);
            }
            Ok(())
        })
    }

    /// Insert a new spread cloned from a randomly chosen existing one, with every image slot
    /// emptied and titles dropped.
    #[tracing::instrument(skip(self, album))]
    pub fn add_page(&mut self, album: &Album, at: InsertAt) -> FolioResult<Edit> {
        self.run(album, "add_page", |txn, rng, opts| {
            let len = txn.album.book.folders.len();
            if let Some(max) = txn.theme.max_spreads {
                if len >= max {
                    return Err(Miss::PageLimit { max }.into());
                }
            }
            let folders = &txn.album.book.folders;
            let index = pick_template(folders, rng, opts).ok_or(Miss::NoTemplate)?;
            let mut template = (*txn.album.book.folders[index]).clone();
            fill_reserved(txn, &mut template)?;
            scrub_template(&mut template);
            remap_folder_ids(&mut template, &mut txn.album.book);

            let at = at.resolve(len);
            txn.album.book.folders.insert(at, Arc::new(template));
            txn.touch(TouchedRegion::SpreadInserted(at));
            Ok(())
        })
    }

    /// Remove an interior book spread together with the records bound inside it.
    #[tracing::instrument(skip(self, album))]
    pub fn remove_page(&mut self, album: &Album, index: usize) -> FolioResult<Edit> {
        self.run(album, "remove_page", |txn, _, _| {
            let book = &txn.album.book;
            let len = book.folders.len();
            let spread = book
                .folders
                .get(index)
                .ok_or(Miss::SpreadNotFound { index })?;
            if index == 0 || index + 1 == len {
                return Err(Miss::EdgeSpread { index }.into());
            }
            let mut ids = BTreeSet::new();
            let mut locked = None;
            spread.walk(&mut |f| {
                if f.locked && locked.is_none() {
                    locked = Some(f.id);
                }
                if !f.id.is_empty() {
                    ids.insert(f.id);
                }
            });
            if let Some(folder) = locked {
                return Err(Miss::Locked { folder }.into());
            }

            let book = &mut txn.album.book;
            book.folders.remove(index);
            book.images.retain(|img| !ids.contains(&img.folder_id));
            book.texts.retain(|t| !ids.contains(&t.folder_id));
            txn.touch(TouchedRegion::SpreadRemoved(index));
            Ok(())
        })
    }
}

/// Index of the spread to clone: interior spreads first, preferring ones without locked pages.
fn pick_template(spreads: &[Arc<Folder>], rng: &mut Rng64, opts: &EngineOpts) -> Option<usize> {
    let candidates: Vec<usize> = if spreads.len() > 2 {
        (1..spreads.len() - 1).collect()
    } else {
        (0..spreads.len()).collect()
    };
    let unlocked = |i: usize| spreads[i].child_folders().all(|p| !p.locked);

    let mut picked = None;
    for _ in 0..opts.template_attempts {
        let i = candidates[rng.pick_index(candidates.len())?];
        picked = Some(i);
        if unlocked(i) {
            break;
        }
    }
    picked.or_else(|| candidates.first().copied())
}

/// Give an edge template a second page by mirroring its present one, unless it is layflat.
fn fill_reserved(txn: &Txn<'_>, spread: &mut Folder) -> Step<()> {
    let Some(reserved) = spread
        .children
        .iter()
        .position(|c| matches!(c, Child::Reserved))
    else {
        return Ok(());
    };
    let Some((present, page)) = spread
        .children
        .iter()
        .enumerate()
        .find_map(|(i, c)| c.folder().map(|f| (i, f)))
    else {
        return Err(fatal(format!("spread {} has no pages", spread.id)));
    };
    if txn.layout_of(page)?.span == LayoutSpan::Layflat {
        return Ok(());
    }
    let mut mirror = page.clone();
    mirror.pivot.x += (reserved as f64 - present as f64) * page.size.width;
    spread.children[reserved] = Child::Folder(mirror);
    Ok(())
}

fn scrub_template(spread: &mut Folder) {
    spread.walk_mut(&mut |f| {
        f.locked = false;
        if f.kind == FolderKind::ImageSlot {
            f.id = FolderId::EMPTY;
            f.kind = FolderKind::EmptySlot;
        }
        f.children
            .retain(|c| c.folder().is_none_or(|child| !child.kind.is_text()));
    });
}

#[cfg(test)]
#[path = "../../tests/unit/mutation/pages.rs"]
mod tests;
