use crate::{
    catalog::styles::{title_font, title_style_for},
    document::model::{Album, Child, Folder, FolderKind, Text, TextDirection},
    foundation::core::FolderId,
    foundation::error::FolioResult,
    foundation::events::Miss,
    geometry::slots::title_placement,
    mutation::engine::{Edit, Engine},
    mutation::intent::PageRef,
};

impl Engine<'_> {
    /// Set the title of a page, inserting a trailing title slot when the page has none.
    ///
    /// The text is cut to the theme's maximum length. Style comes from the page background via
    /// the theme's title-style tiers.
    #[tracing::instrument(skip(self, album, text), fields(page = %page.id))]
    pub fn add_page_title(
        &mut self,
        album: &Album,
        page: PageRef,
        text: &str,
    ) -> FolioResult<Edit> {
        self.run(album, "add_page_title", |txn, _, _| {
            let side = page.side;
            let theme = txn.theme;
            let path = txn.editable_page(page)?;
            let folder = txn.folder(side, &path)?;
            let layout = txn.layout_of(folder)?;
            let content: String = text.trim().chars().take(theme.title.max_len).collect();
            let (style, tier) = title_style_for(theme, folder.background.as_deref());
            tracing::debug!(?tier, "title style resolved");
            let existing = folder
                .child_folders()
                .find(|f| f.kind == FolderKind::TitleSlot)
                .map(|f| f.id);

            let record = |id: FolderId| Text {
                folder_id: id,
                direction: TextDirection::detect(&content),
                content: content.clone(),
                font: title_font(theme, style),
                align_h: Default::default(),
                align_v: Default::default(),
                locked: false,
            };

            if let Some(id) = existing {
                let subtree = txn.album.subtree_mut(side);
                match subtree.texts.iter().position(|t| t.folder_id == id) {
                    Some(i) if subtree.texts[i].locked => {
                        return Err(Miss::Locked { folder: id }.into());
                    }
                    Some(i) => {
                        let t = &mut subtree.texts[i];
                        t.direction = TextDirection::detect(&content);
                        t.content = content.clone();
                    }
                    None => subtree.texts.push(record(id)),
                }
            } else {
                let (size, pivot) = title_placement(theme, Some(layout), folder.size);
                let id = FolderId(txn.album.subtree_mut(side).allocate_id());
                let mut slot = Folder::new(id, FolderKind::TitleSlot, size);
                slot.pivot = pivot;
                slot.background = style.title_background.clone();
                slot.frame = style.frame.clone();
                txn.folder_mut(side, &path)?
                    .children
                    .push(Child::Folder(slot));
                txn.album.subtree_mut(side).texts.push(record(id));
            }
            txn.touch_path(side, &path);
            Ok(())
        })
    }

    /// Remove the title slot of a page together with its text record.
    #[tracing::instrument(skip(self, album), fields(page = %page.id))]
    pub fn remove_page_title(&mut self, album: &Album, page: PageRef) -> FolioResult<Edit> {
        self.run(album, "remove_page_title", |txn, _, _| {
            let side = page.side;
            let path = txn.editable_page(page)?;
            let folder = txn.folder(side, &path)?;
            let Some((child, id)) = folder
                .children
                .iter()
                .enumerate()
                .find_map(|(i, c)| {
                    c.folder()
                        .filter(|f| f.kind == FolderKind::TitleSlot)
                        .map(|f| (i, f.id))
                })
            else {
                return Err(Miss::TitleNotFound { page: page.id }.into());
            };
            txn.folder_mut(side, &path)?.children.remove(child);
            txn.album
                .subtree_mut(side)
                .texts
                .retain(|t| t.folder_id != id);
            txn.touch_path(side, &path);
            Ok(())
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/mutation/titles.rs"]
mod tests;
