use std::fmt;

use crate::foundation::core::{FolderId, ImageId, LayoutId};

/// A self-healed data problem. The edit continued with a safe default.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Correction {
    /// Cover-fit got a non-finite or non-positive ratio; the full frame was used.
    InvalidRatio {
        /// Image being fitted, when known.
        image: Option<ImageId>,
        /// Container aspect ratio that was supplied.
        container_ratio: f64,
        /// Image aspect ratio that was supplied.
        image_ratio: f64,
    },
    /// A crop rectangle failed validation; the full frame was used.
    InvalidCrop {
        /// Image carrying the crop, when known.
        image: Option<ImageId>,
    },
    /// Area-after-transform was not finite/positive; the original dimensions were used.
    InvalidArea {
        /// Image being transformed, when known.
        image: Option<ImageId>,
    },
    /// The rotation was not finite and was treated as zero.
    NonFiniteRotation {
        /// Image being transformed, when known.
        image: Option<ImageId>,
    },
    /// The quantized (turns, flip) triple has no orientation tag; identity was used.
    UnmappedOrientation {
        /// Image being transformed, when known.
        image: Option<ImageId>,
        /// Quarter turns after normalization.
        quarter_turns: u8,
        /// Horizontal flip after normalization.
        flip_x: bool,
        /// Vertical flip after normalization.
        flip_y: bool,
    },
    /// An image/text record bound to no folder was dropped.
    OrphanPruned {
        /// The dangling binding id.
        folder: FolderId,
    },
    /// The subtree id counter was behind an allocated id and was advanced.
    CounterAdvanced {
        /// Counter value before the fix.
        from: u32,
        /// Counter value after the fix.
        to: u32,
    },
}

impl Correction {
    /// Attach the image the correction applies to.
    pub fn for_image(mut self, id: ImageId) -> Self {
        match &mut self {
            Self::InvalidRatio { image, .. }
            | Self::InvalidCrop { image }
            | Self::InvalidArea { image }
            | Self::NonFiniteRotation { image }
            | Self::UnmappedOrientation { image, .. } => *image = Some(id),
            Self::OrphanPruned { .. } | Self::CounterAdvanced { .. } => {}
        }
        self
    }
}

/// Why an edit was a no-op. The original tree is returned unchanged.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Miss {
    /// No page-like folder carries this id.
    PageNotFound {
        /// Requested page id.
        page: FolderId,
    },
    /// The page has no slot at this container index / with this folder id.
    SlotNotFound {
        /// Page searched.
        page: FolderId,
        /// Human-readable slot reference.
        slot: String,
    },
    /// No spread at this index.
    SpreadNotFound {
        /// Requested spread index.
        index: usize,
    },
    /// The layout id is not in the catalog.
    LayoutNotFound {
        /// Requested layout.
        layout: LayoutId,
    },
    /// The page does not currently use the layout the intent was built against.
    LayoutMismatch {
        /// Layout the intent expected.
        expected: LayoutId,
        /// Layout the page actually has.
        found: Option<LayoutId>,
    },
    /// The theme has no layout with this container count for the page's span.
    NoLayoutForCount {
        /// Wanted container count.
        count: usize,
    },
    /// No different layout with the same container count was found.
    NoAlternativeLayout {
        /// Layout that was to be replaced.
        layout: LayoutId,
    },
    /// The album's theme is not in the catalog.
    ThemeNotFound {
        /// Theme name.
        theme: String,
    },
    /// No image record with this id.
    ImageNotFound {
        /// Requested image.
        image: ImageId,
    },
    /// The source slot of a swap/move holds no image.
    SourceSlotEmpty,
    /// The target folder is locked.
    Locked {
        /// Locked folder.
        folder: FolderId,
    },
    /// The target image is locked.
    ImageLocked {
        /// Locked image.
        image: ImageId,
    },
    /// The theme's spread limit is reached.
    PageLimit {
        /// Configured maximum.
        max: usize,
    },
    /// No spread could serve as a template.
    NoTemplate,
    /// The first/last spread carries reserved edge slots and cannot be removed.
    EdgeSpread {
        /// Requested spread index.
        index: usize,
    },
    /// The page has no title to remove.
    TitleNotFound {
        /// Page searched.
        page: FolderId,
    },
}

impl fmt::Display for Miss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageNotFound { page } => write!(f, "page {page} not found"),
            Self::SlotNotFound { page, slot } => write!(f, "slot {slot} not found on page {page}"),
            Self::SpreadNotFound { index } => write!(f, "spread {index} not found"),
            Self::LayoutNotFound { layout } => write!(f, "layout '{layout}' not found"),
            Self::LayoutMismatch { expected, found } => match found {
                Some(found) => write!(f, "page uses layout '{found}', not '{expected}'"),
                None => write!(f, "page has no layout, expected '{expected}'"),
            },
            Self::NoLayoutForCount { count } => write!(f, "no layout with {count} containers"),
            Self::NoAlternativeLayout { layout } => {
                write!(f, "no alternative to layout '{layout}'")
            }
            Self::ThemeNotFound { theme } => write!(f, "theme '{theme}' not found"),
            Self::ImageNotFound { image } => write!(f, "{image} not found"),
            Self::SourceSlotEmpty => f.write_str("source slot is empty"),
            Self::Locked { folder } => write!(f, "{folder} is locked"),
            Self::ImageLocked { image } => write!(f, "{image} is locked"),
            Self::PageLimit { max } => write!(f, "spread limit of {max} reached"),
            Self::NoTemplate => f.write_str("no spread can serve as a template"),
            Self::EdgeSpread { index } => write!(f, "spread {index} is an edge spread"),
            Self::TitleNotFound { page } => write!(f, "page {page} has no title"),
        }
    }
}
