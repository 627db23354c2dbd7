use crate::{
    catalog::layout::Layout,
    document::model::{Album, NodePath},
    foundation::core::{LayoutId, Side},
    foundation::error::FolioResult,
    foundation::events::Miss,
    mutation::engine::{Edit, Engine, Step, Txn},
    mutation::intent::{NewImage, PageRef},
};

impl Engine<'_> {
    /// Switch a page from `current` to `dest`, growing or shrinking its slots to match.
    ///
    /// With equal container counts only geometry and crops are recomputed. `image`, when given,
    /// is bound to the first empty slot after the switch.
    #[tracing::instrument(skip(self, album, image), fields(page = %page.id))]
    pub fn change_layout(
        &mut self,
        album: &Album,
        page: PageRef,
        current: &LayoutId,
        dest: &LayoutId,
        image: Option<&NewImage>,
    ) -> FolioResult<Edit> {
        self.run(album, "change_layout", |txn, _, _| {
            if current == dest && image.is_none() {
                return Ok(());
            }
            let path = txn.editable_page(page)?;
            expect_layout(txn, page.side, &path, current)?;
            let dest = txn.theme_layout(dest)?;
            check_span(txn, page.side, &path, dest)?;

            txn.relayout(page.side, &path, dest)?;
            if let Some(content) = image {
                let slot = txn.first_empty_slot(page.side, &path)?.ok_or_else(|| {
                    Miss::SlotNotFound {
                        page: page.id,
                        slot: "any empty".to_string(),
                    }
                })?;
                txn.bind_new_image(page.side, &path, slot, content)?;
            }
            Ok(())
        })
    }

    /// Move a page to a different layout with the same container count, picked at random.
    #[tracing::instrument(skip(self, album), fields(page = %page.id))]
    pub fn shuffle_layout(
        &mut self,
        album: &Album,
        page: PageRef,
        layout: &LayoutId,
    ) -> FolioResult<Edit> {
        self.run(album, "shuffle_layout", |txn, rng, opts| {
            let path = txn.editable_page(page)?;
            expect_layout(txn, page.side, &path, layout)?;
            let current = txn.theme_layout(layout)?;
            let (catalog, theme) = (txn.catalog, txn.theme);
            let candidates: Vec<&Layout> = catalog
                .layouts_with_count(&theme.name, current.span, current.container_count())
                .collect();

            let mut picked = None;
            for _ in 0..opts.shuffle_attempts {
                let Some(i) = rng.pick_index(candidates.len()) else { break };
                if candidates[i].id != current.id {
                    picked = Some(candidates[i]);
                    break;
                }
            }
            let dest = picked.ok_or_else(|| Miss::NoAlternativeLayout {
                layout: current.id.clone(),
            })?;
            txn.relayout(page.side, &path, dest)?;
            Ok(())
        })
    }
}

/// Miss unless the page at `path` currently uses `expected`.
pub(crate) fn expect_layout(
    txn: &Txn<'_>,
    side: Side,
    path: &NodePath,
    expected: &LayoutId,
) -> Step<()> {
    let folder = txn.folder(side, path)?;
    if folder.layout.as_ref() != Some(expected) {
        return Err(Miss::LayoutMismatch {
            expected: expected.clone(),
            found: folder.layout.clone(),
        }
        .into());
    }
    Ok(())
}

/// Miss unless `dest` spans the same kind of folder as the page's current layout.
pub(crate) fn check_span(txn: &Txn<'_>, side: Side, path: &NodePath, dest: &Layout) -> Step<()> {
    let folder = txn.folder(side, path)?;
    let current = txn.layout_of(folder)?;
    if current.span != dest.span {
        return Err(Miss::LayoutMismatch {
            expected: dest.id.clone(),
            found: Some(current.id.clone()),
        }
        .into());
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/mutation/layout_change.rs"]
mod tests;
