use std::collections::{BTreeMap, BTreeSet};

use crate::{
    catalog::layout::LayoutSpan,
    catalog::resources::ResourceCatalog,
    document::ids::first_duplicate,
    document::model::{Album, Child, Folder, FolderKind, Subtree},
    foundation::core::{FolderId, Side},
    foundation::error::{FolioError, FolioResult},
};

impl Album {
    /// Check every structural invariant against `catalog`.
    ///
    /// Returns the first violation found as [`FolioError::Validation`].
    pub fn validate(&self, catalog: &ResourceCatalog) -> FolioResult<()> {
        if catalog.theme(&self.theme).is_none() {
            return Err(FolioError::validation(format!(
                "album theme '{}' is not in the catalog",
                self.theme
            )));
        }
        validate_subtree(&self.book, Side::Book, catalog)?;
        validate_subtree(&self.cover, Side::Cover, catalog)
    }
}

fn fail<T>(side: Side, msg: impl std::fmt::Display) -> FolioResult<T> {
    let side = match side {
        Side::Book => "book",
        Side::Cover => "cover",
    };
    Err(FolioError::validation(format!("{side}: {msg}")))
}

pub(crate) fn validate_subtree(
    subtree: &Subtree,
    side: Side,
    catalog: &ResourceCatalog,
) -> FolioResult<()> {
    if let Some(dup) = first_duplicate(subtree) {
        return fail(side, format_args!("{dup} appears more than once"));
    }
    let max = subtree.max_used_id();
    if subtree.next_id <= max {
        return fail(
            side,
            format_args!("next_id {} does not exceed used id {max}", subtree.next_id),
        );
    }

    let mut kinds: BTreeMap<FolderId, FolderKind> = BTreeMap::new();
    for root in &subtree.folders {
        check_folder(root, side, catalog, true)?;
        root.walk(&mut |f| {
            if !f.id.is_empty() {
                kinds.insert(f.id, f.kind);
            }
        });
    }

    let mut image_ids = BTreeSet::new();
    let mut bound_slots = BTreeSet::new();
    for img in &subtree.images {
        if !image_ids.insert(img.id) {
            return fail(side, format_args!("{} appears more than once", img.id));
        }
        if img.folder_id.is_empty() {
            return fail(side, format_args!("{} is bound to the empty sentinel", img.id));
        }
        match kinds.get(&img.folder_id) {
            Some(FolderKind::ImageSlot) => {}
            Some(kind) => {
                return fail(
                    side,
                    format_args!("{} is bound to {} of kind {kind:?}", img.id, img.folder_id),
                );
            }
            None => return fail(side, format_args!("{} is orphaned", img.id)),
        }
        if !bound_slots.insert(img.folder_id) {
            return fail(side, format_args!("{} holds two images", img.folder_id));
        }
        if !img.crop.is_valid() {
            return fail(side, format_args!("{} has an invalid crop", img.id));
        }
    }

    let mut text_slots = BTreeSet::new();
    for text in &subtree.texts {
        if text.folder_id.is_empty() {
            return fail(side, "a text record is bound to the empty sentinel");
        }
        if !kinds.get(&text.folder_id).is_some_and(|k| k.binds_text()) {
            return fail(side, format_args!("text bound to {} is orphaned", text.folder_id));
        }
        if !text_slots.insert(text.folder_id) {
            return fail(side, format_args!("{} holds two texts", text.folder_id));
        }
    }
    Ok(())
}

fn check_folder(
    folder: &Folder,
    side: Side,
    catalog: &ResourceCatalog,
    top_level: bool,
) -> FolioResult<()> {
    if (folder.kind == FolderKind::EmptySlot) != folder.id.is_empty() {
        return fail(
            side,
            format_args!("{} of kind {:?} breaks the empty-slot sentinel", folder.id, folder.kind),
        );
    }
    if folder.kind == FolderKind::Spread {
        if !top_level {
            return fail(side, format_args!("spread {} is nested", folder.id));
        }
        if folder.children.len() != 2 {
            return fail(
                side,
                format_args!(
                    "spread {} has {} entries, expected 2",
                    folder.id,
                    folder.children.len()
                ),
            );
        }
        if folder.children.iter().all(|c| matches!(c, Child::Reserved)) {
            return fail(side, format_args!("spread {} has no pages", folder.id));
        }
    } else if folder.children.iter().any(|c| matches!(c, Child::Reserved)) {
        return fail(
            side,
            format_args!("{} holds a reserved entry but is not a spread", folder.id),
        );
    }

    if folder.kind.is_page_like() {
        check_page(folder, side, catalog)?;
    }
    for child in folder.child_folders() {
        check_folder(child, side, catalog, false)?;
    }
    Ok(())
}

fn check_page(page: &Folder, side: Side, catalog: &ResourceCatalog) -> FolioResult<()> {
    let Some(layout_id) = &page.layout else {
        return fail(side, format_args!("page {} has no layout", page.id));
    };
    let Some(layout) = catalog.layout(layout_id) else {
        return fail(
            side,
            format_args!("page {} uses unknown layout '{layout_id}'", page.id),
        );
    };
    let span_ok = match page.kind {
        FolderKind::Page => matches!(layout.span, LayoutSpan::Page | LayoutSpan::Layflat),
        _ => layout.span == LayoutSpan::Cover,
    };
    if !span_ok {
        return fail(
            side,
            format_args!(
                "page {} ({:?}) cannot use {:?} layout '{layout_id}'",
                page.id, page.kind, layout.span
            ),
        );
    }
    let slots = page.slot_count();
    if layout.container_count() != slots {
        return fail(
            side,
            format_args!(
                "page {} holds {slots} slots but layout '{layout_id}' has {} containers",
                page.id,
                layout.container_count()
            ),
        );
    }
    let text_start = page.text_start();
    if page.child_folders().skip(text_start).any(|f| !f.kind.is_text()) {
        return fail(
            side,
            format_args!("page {} has a layout slot after a text slot", page.id),
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/document/validate.rs"]
mod tests;
