use crate::{
    document::model::{Album, Caption, Image},
    foundation::core::{CropRect, FolderId, ImageId, LayoutId, Side},
    foundation::error::FolioResult,
    foundation::events::Miss,
    mutation::engine::{Edit, Engine, Outcome},
    orientation::quantize::Orientation,
    orientation::transform::CropTransform,
};

/// A page (or cover panel) addressed by subtree and folder id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PageRef {
    /// Subtree holding the page.
    #[serde(default)]
    pub side: Side,
    /// Page folder id.
    pub id: FolderId,
}

impl PageRef {
    /// Page `id` in the book subtree.
    pub fn book(id: u32) -> Self {
        Self {
            side: Side::Book,
            id: FolderId(id),
        }
    }

    /// Panel `id` in the cover subtree.
    pub fn cover(id: u32) -> Self {
        Self {
            side: Side::Cover,
            id: FolderId(id),
        }
    }
}

/// A layout-bound slot addressed by its page and container position.
///
/// Empty slots all share the sentinel id, so slots are never addressed by folder id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SlotRef {
    /// Owning page.
    pub page: PageRef,
    /// Position among the page's layout-bound slots.
    pub index: usize,
}

impl SlotRef {
    /// Slot `index` of `page`.
    pub fn new(page: PageRef, index: usize) -> Self {
        Self { page, index }
    }
}

/// Freshly uploaded photo content, before it has an id.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NewImage {
    /// Opaque upload reference.
    #[serde(default)]
    pub source: String,
    /// Medium-resolution pixel width.
    pub width: u32,
    /// Medium-resolution pixel height.
    pub height: u32,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Caption>,
}

impl NewImage {
    /// Photo of `width × height` pixels with no source or caption.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            source: String::new(),
            width,
            height,
            caption: None,
        }
    }

    pub(crate) fn to_record(&self, id: ImageId, folder: FolderId) -> Image {
        Image {
            id,
            folder_id: folder,
            source: self.source.clone(),
            width: self.width,
            height: self.height,
            crop: CropRect::FULL,
            orientation: Orientation::Identity,
            alignment: 0.0,
            opacity: 1.0,
            locked: false,
            rotated: false,
            caption: self.caption.clone(),
        }
    }
}

/// Where `add_page` splices the new spread.
///
/// The index is clamped so the first and last spreads stay at the edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertAt {
    /// Right after the front edge spread.
    First,
    /// Right before the back edge spread.
    Last,
    /// Before the spread at this index.
    Before(usize),
    /// After the spread at this index.
    After(usize),
}

impl InsertAt {
    pub(crate) fn resolve(self, len: usize) -> usize {
        let hi = len.saturating_sub(1).max(1);
        let raw = match self {
            Self::First => 1,
            Self::Last => hi,
            Self::Before(i) => i,
            Self::After(i) => i.saturating_add(1),
        };
        raw.clamp(1, hi)
    }
}

/// Drag-and-drop record resolved upstream from pointer input.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropIntent {
    /// Subtree both pages live in.
    #[serde(default)]
    pub side: Side,
    /// Folder id of the dragged slot (`0` when the drag starts outside the album).
    #[serde(default)]
    pub source_slot_id: FolderId,
    /// Folder id of the slot under the pointer (`0` for an empty slot).
    #[serde(default)]
    pub dest_slot_id: FolderId,
    /// Page the drag started on.
    #[serde(default)]
    pub source_page_id: FolderId,
    /// Page the drop landed on.
    pub dest_page_id: FolderId,
    /// Position of the target container on the destination page.
    pub container_id: usize,
    /// Image the collaborator believes it is dragging.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_id: Option<ImageId>,
    /// New content dropped from outside the album.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload: Option<NewImage>,
}

/// Every engine operation as data.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Intent {
    /// [`Engine::change_layout`].
    ChangeLayout {
        /// Page to re-lay.
        page: PageRef,
        /// Layout the caller believes the page has.
        current: LayoutId,
        /// Layout to switch to.
        dest: LayoutId,
        /// Content bound to the first empty slot after the switch.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<NewImage>,
    },
    /// [`Engine::add_image`].
    AddImage {
        /// Target page.
        page: PageRef,
        /// Preferred slot position.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        container: Option<usize>,
        /// Layout to grow into.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dest_layout: Option<LayoutId>,
        /// Content to bind.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<NewImage>,
    },
    /// [`Engine::remove_images`].
    RemoveImages {
        /// Page holding the images.
        page: PageRef,
        /// Images to remove.
        images: Vec<ImageId>,
        /// Hand the records back instead of dropping them.
        #[serde(default)]
        keep_records: bool,
    },
    /// [`Engine::swap_images`].
    SwapImages {
        /// Dragged slot.
        source: SlotRef,
        /// Drop target.
        dest: SlotRef,
    },
    /// [`Engine::swap_pages`].
    SwapPages {
        /// First page.
        source: FolderId,
        /// Second page.
        dest: FolderId,
    },
    /// [`Engine::add_page`].
    AddPage {
        /// Insert position.
        at: InsertAt,
    },
    /// [`Engine::remove_page`].
    RemovePage {
        /// Spread index to remove.
        index: usize,
    },
    /// [`Engine::shuffle_layout`].
    ShuffleLayout {
        /// Page to re-lay.
        page: PageRef,
        /// Layout the caller believes the page has.
        layout: LayoutId,
    },
    /// [`Engine::add_page_title`].
    AddPageTitle {
        /// Page receiving the title.
        page: PageRef,
        /// Title text.
        text: String,
    },
    /// [`Engine::remove_page_title`].
    RemovePageTitle {
        /// Page losing its title.
        page: PageRef,
    },
    /// [`Engine::apply_transform`].
    ApplyTransform {
        /// Subtree holding the image.
        #[serde(default)]
        side: Side,
        /// Image to transform.
        image: ImageId,
        /// Record from the crop tool.
        transform: CropTransform,
    },
    /// [`Engine::apply_drop`].
    Drop(DropIntent),
}

impl Engine<'_> {
    /// Run the operation `intent` describes.
    pub fn apply(&mut self, album: &Album, intent: &Intent) -> FolioResult<Edit> {
        match intent {
            Intent::ChangeLayout {
                page,
                current,
                dest,
                image,
            } => self.change_layout(album, *page, current, dest, image.as_ref()),
            Intent::AddImage {
                page,
                container,
                dest_layout,
                image,
            } => self.add_image(album, *page, *container, dest_layout.as_ref(), image.as_ref()),
            Intent::RemoveImages {
                page,
                images,
                keep_records,
            } => self.remove_images(album, *page, images, *keep_records),
            Intent::SwapImages { source, dest } => self.swap_images(album, *source, *dest),
            Intent::SwapPages { source, dest } => self.swap_pages(album, *source, *dest),
            Intent::AddPage { at } => self.add_page(album, *at),
            Intent::RemovePage { index } => self.remove_page(album, *index),
            Intent::ShuffleLayout { page, layout } => self.shuffle_layout(album, *page, layout),
            Intent::AddPageTitle { page, text } => self.add_page_title(album, *page, text),
            Intent::RemovePageTitle { page } => self.remove_page_title(album, *page),
            Intent::ApplyTransform {
                side,
                image,
                transform,
            } => self.apply_transform(album, *side, *image, transform),
            Intent::Drop(drop) => self.apply_drop(album, drop),
        }
    }

    /// Resolve a drop into a slot swap/move or an image add.
    #[tracing::instrument(skip(self, album, drop), fields(dest_page = %drop.dest_page_id))]
    pub fn apply_drop(&mut self, album: &Album, drop: &DropIntent) -> FolioResult<Edit> {
        let dest_page = PageRef {
            side: drop.side,
            id: drop.dest_page_id,
        };
        if let Some(upload) = &drop.upload {
            return self.add_image(
                album,
                dest_page,
                Some(drop.container_id),
                None,
                Some(upload),
            );
        }

        let source_page = PageRef {
            side: drop.side,
            id: drop.source_page_id,
        };
        let subtree = album.subtree(drop.side);
        let Some(source_index) = subtree
            .find_page(drop.source_page_id)
            .and_then(|p| subtree.folder(&p))
            .and_then(|page| page.slot_position(drop.source_slot_id))
        else {
            return Ok(missed(
                album,
                Miss::SlotNotFound {
                    page: drop.source_page_id,
                    slot: drop.source_slot_id.to_string(),
                },
            ));
        };
        if let Some(expected) = drop.image_id {
            let bound = subtree.image_for_folder(drop.source_slot_id).map(|i| i.id);
            if bound != Some(expected) {
                return Ok(missed(album, Miss::ImageNotFound { image: expected }));
            }
        }
        self.swap_images(
            album,
            SlotRef::new(source_page, source_index),
            SlotRef::new(dest_page, drop.container_id),
        )
    }
}

fn missed(album: &Album, miss: Miss) -> Edit {
    tracing::debug!(%miss, "drop missed");
    Edit::untouched(album, Outcome::Missed(miss), Vec::new())
}

#[cfg(test)]
#[path = "../../tests/unit/mutation/intent.rs"]
mod tests;
