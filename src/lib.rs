//! Folio is the document tree and layout engine behind a photo-book editor.
//!
//! An [`Album`] is two independent subtrees (book spreads and cover regions) of [`Folder`]s,
//! with image and text records kept in flat arrays and bound to slot folders by id. Layout
//! resources from a read-only [`ResourceCatalog`] decide where every slot sits on its page.
//!
//! # Editing model
//!
//! Every mutation goes through an [`Engine`] and is transactional:
//!
//! 1. **Resolve**: the ids an operation names are looked up; anything missing becomes a [`Miss`]
//!    and the input album comes back untouched.
//! 2. **Edit**: a working copy is rebuilt. Top-level folders are shared until written, so an edit
//!    copies only the spreads it touches.
//! 3. **Heal**: degenerate crops and ratios fall back to safe defaults and are reported as
//!    [`Correction`]s.
//! 4. **Verify** (optional): the result is checked against every structural invariant; a failure
//!    is a [`FolioError::Invariant`] and nothing is returned.
//!
//! A [`Session`] layers undo/redo history and an incrementally maintained [`EmptySlotIndex`] on
//! top of the engine.
//!
//! # Getting started
//!
//! Load a catalog with [`ResourceCatalog::from_path`], an album with [`Album::from_path`] (or
//! build one with [`AlbumBuilder`]), then drive edits through [`Engine::apply`] with [`Intent`]
//! values or through the typed methods on [`Engine`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod catalog;
mod document;
mod foundation;
mod geometry;
mod mutation;
mod orientation;
mod session;
mod tracker;

pub use catalog::layout::{AnchorMode, Container, ContentFamily, Layout, LayoutFamily, LayoutSpan};
pub use catalog::resources::{
    Background, FontMetrics, Frame, FrameKind, ResourceCatalog, Theme, TitleBox, TitleRules,
    TitleStyle,
};
pub use catalog::styles::{StyleTier, slot_frame_for, title_font, title_style_for};
pub use document::dsl::{AlbumBuilder, PageBuilder, PhotoSpec, SlotSpec};
pub use document::ids::{advance_counter, first_duplicate, remap_folder_ids};
pub use document::model::{
    Album, Caption, Child, Folder, FolderKind, HAlign, Image, NodePath, Subtree, Text,
    TextDirection, VAlign,
};
pub use foundation::core::{
    CropRect, FolderId, ImageId, LayoutId, Point, Side, Size, SlotRect, positive_ratio,
};
pub use foundation::error::{FolioError, FolioResult};
pub use foundation::events::{Correction, Miss};
pub use foundation::math::Rng64;
pub use geometry::fit::{cover_fit, oriented_ratio, refit};
pub use geometry::slots::{apply_layout, container_ratio, slot_rect, slot_rects, title_placement};
pub use mutation::engine::{Edit, Engine, EngineOpts, Outcome, TouchedRegion};
pub use mutation::intent::{DropIntent, InsertAt, Intent, NewImage, PageRef, SlotRef};
pub use orientation::quantize::{
    Orientation, Quantized, Transform, area_after_transform, dequantize, quantize,
};
pub use orientation::transform::{CropTransform, PixelCrop, Reoriented, reorient};
pub use session::editor::{Session, SessionOpts};
pub use session::history::History;
pub use tracker::index::{EmptySlot, EmptySlotIndex, SpreadKey};
