use std::sync::Arc;

use smallvec::SmallVec;

use crate::{
    catalog::resources::FontMetrics,
    foundation::core::{CropRect, FolderId, ImageId, LayoutId, Point, Side, Size},
    orientation::quantize::Orientation,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Structural role of a [`Folder`].
pub enum FolderKind {
    /// Two-page book spread. Holds exactly two entries.
    Spread,
    /// Book page carrying a layout.
    Page,
    /// Root of the cover subtree.
    Cover,
    /// Front/back cover panel carrying a layout.
    CoverRegion,
    /// Spine panel carrying a layout.
    SpineRegion,
    /// Slot bound to an image record.
    ImageSlot,
    /// Slot with no content bound (`id == 0`).
    EmptySlot,
    /// Spine text slot bound by the layout.
    SpineSlot,
    /// Free text slot bound to a text record.
    TextSlot,
    /// Page title slot bound to a text record.
    TitleSlot,
}

impl FolderKind {
    /// Layout-agnostic text slots, always ordered after layout-bound slots.
    pub fn is_text(self) -> bool {
        matches!(self, Self::TextSlot | Self::TitleSlot)
    }

    /// Slots whose id binds a text record.
    pub fn binds_text(self) -> bool {
        matches!(self, Self::TextSlot | Self::TitleSlot | Self::SpineSlot)
    }

    /// Image or empty slot.
    pub fn is_image_like(self) -> bool {
        matches!(self, Self::ImageSlot | Self::EmptySlot)
    }

    /// Folders whose children are laid out by a layout resource.
    pub fn is_page_like(self) -> bool {
        matches!(self, Self::Page | Self::CoverRegion | Self::SpineRegion)
    }
}

/// A node of the album tree.
#[derive(Clone, Debug, PartialEq)]
pub struct Folder {
    /// Unique within the subtree; [`FolderId::EMPTY`] for empty slots.
    pub id: FolderId,
    /// Structural role.
    pub kind: FolderKind,
    /// Box size in document units.
    pub size: Size,
    /// Center point in the parent's coordinate space.
    pub pivot: Point,
    /// Layout resource applied to this folder's children.
    pub layout: Option<LayoutId>,
    /// Background resource key.
    pub background: Option<String>,
    /// Frame/border resource key.
    pub frame: Option<String>,
    /// Locked folders are skipped by page moves and refuse edits.
    pub locked: bool,
    /// Fine rotation in degrees.
    pub angle: f64,
    /// Ordered children.
    pub children: Vec<Child>,
}

/// One entry of a folder's child list.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    /// A present folder.
    Folder(Folder),
    /// A structurally reserved but absent page (first/last spread edges).
    Reserved,
}

impl Child {
    /// The folder, unless reserved.
    pub fn folder(&self) -> Option<&Folder> {
        match self {
            Self::Folder(f) => Some(f),
            Self::Reserved => None,
        }
    }

    /// Mutable access to the folder, unless reserved.
    pub fn folder_mut(&mut self) -> Option<&mut Folder> {
        match self {
            Self::Folder(f) => Some(f),
            Self::Reserved => None,
        }
    }
}

impl Folder {
    /// A childless folder of `kind`.
    pub fn new(id: FolderId, kind: FolderKind, size: Size) -> Self {
        Self {
            id,
            kind,
            size,
            pivot: Point::new(size.width * 0.5, size.height * 0.5),
            layout: None,
            background: None,
            frame: None,
            locked: false,
            angle: 0.0,
            children: Vec::new(),
        }
    }

    /// An empty slot of `size` centered at `pivot`.
    pub fn empty_slot(size: Size, pivot: Point) -> Self {
        Self {
            pivot,
            ..Self::new(FolderId::EMPTY, FolderKind::EmptySlot, size)
        }
    }

    /// Present child folders.
    pub fn child_folders(&self) -> impl Iterator<Item = &Folder> {
        self.children.iter().filter_map(Child::folder)
    }

    /// Layout-bound (non-text) child folders, in slot order.
    pub fn slots(&self) -> impl Iterator<Item = &Folder> {
        self.child_folders().filter(|f| !f.kind.is_text())
    }

    /// Number of layout-bound children.
    pub fn slot_count(&self) -> usize {
        self.slots().count()
    }

    /// Child index of the `n`-th layout-bound slot.
    pub fn slot_child_index(&self, n: usize) -> Option<usize> {
        self.children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.folder().is_some_and(|f| !f.kind.is_text()))
            .map(|(i, _)| i)
            .nth(n)
    }

    /// Slot position (among layout-bound slots) of the child folder with `id`.
    pub fn slot_position(&self, id: FolderId) -> Option<usize> {
        if id.is_empty() {
            return None;
        }
        self.slots().position(|f| f.id == id)
    }

    /// Child index of the first text slot, or `children.len()` when none.
    pub fn text_start(&self) -> usize {
        self.children
            .iter()
            .position(|c| c.folder().is_some_and(|f| f.kind.is_text()))
            .unwrap_or(self.children.len())
    }

    /// Visit this folder and every descendant, depth first.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Folder)) {
        visit(self);
        for child in self.child_folders() {
            child.walk(visit);
        }
    }

    /// Mutable depth-first visit.
    pub fn walk_mut(&mut self, visit: &mut impl FnMut(&mut Folder)) {
        visit(self);
        for child in self.children.iter_mut().filter_map(Child::folder_mut) {
            child.walk_mut(visit);
        }
    }

    /// Depth-first search for a folder with a non-empty `id`.
    pub fn find_steps(&self, id: FolderId) -> Option<SmallVec<[usize; 4]>> {
        if id.is_empty() {
            return None;
        }
        for (i, child) in self.children.iter().enumerate() {
            let Some(f) = child.folder() else { continue };
            if f.id == id {
                let mut steps = SmallVec::new();
                steps.push(i);
                return Some(steps);
            }
            if let Some(mut rest) = f.find_steps(id) {
                rest.insert(0, i);
                return Some(rest);
            }
        }
        None
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Caption block attached to an image.
pub struct Caption {
    /// Caption text.
    pub text: String,
    /// Writing direction.
    #[serde(default)]
    pub direction: TextDirection,
}

/// Photo content bound to an image slot.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Image {
    /// Unique id within the subtree.
    pub id: ImageId,
    /// Id of the slot folder displaying this image.
    pub folder_id: FolderId,
    /// Opaque upload/asset reference.
    #[serde(default)]
    pub source: String,
    /// Medium-resolution pixel width.
    pub width: u32,
    /// Medium-resolution pixel height.
    pub height: u32,
    /// Normalized crop.
    #[serde(default)]
    pub crop: CropRect,
    /// Discrete orientation.
    #[serde(default)]
    pub orientation: Orientation,
    /// Fine alignment in degrees, within `(-45, 45]`.
    #[serde(default)]
    pub alignment: f64,
    /// Opacity in `[0, 1]`.
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Locked images refuse moves and edits.
    #[serde(default)]
    pub locked: bool,
    /// Set once the user rotated/aligned the image.
    #[serde(default)]
    pub rotated: bool,
    /// Optional caption.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<Caption>,
}

fn default_opacity() -> f64 {
    1.0
}

impl Image {
    /// Medium-resolution pixel size.
    pub fn pixel_size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Writing direction of a text block.
pub enum TextDirection {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

impl TextDirection {
    /// Direction of the first strong character: Hebrew and Arabic script read right to left.
    pub fn detect(text: &str) -> Self {
        for ch in text.chars() {
            match u32::from(ch) {
                0x0590..=0x08FF | 0xFB1D..=0xFDFF | 0xFE70..=0xFEFF => return Self::Rtl,
                _ if ch.is_alphabetic() => return Self::Ltr,
                _ => {}
            }
        }
        Self::Ltr
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Horizontal text alignment.
pub enum HAlign {
    /// Start edge.
    Left,
    /// Centered.
    #[default]
    Center,
    /// End edge.
    Right,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// Vertical text alignment.
pub enum VAlign {
    /// Top edge.
    Top,
    /// Centered.
    #[default]
    Middle,
    /// Bottom edge.
    Bottom,
}

/// Text content bound to a text or title slot.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Text {
    /// Id of the slot folder displaying this text.
    pub folder_id: FolderId,
    /// Text content.
    pub content: String,
    /// Writing direction.
    #[serde(default)]
    pub direction: TextDirection,
    /// Font metrics.
    pub font: FontMetrics,
    /// Horizontal alignment.
    #[serde(default)]
    pub align_h: HAlign,
    /// Vertical alignment.
    #[serde(default)]
    pub align_v: VAlign,
    /// Locked texts refuse edits.
    #[serde(default)]
    pub locked: bool,
}

/// Position of a folder inside a subtree: top-level index plus child steps.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodePath {
    /// Index into [`Subtree::folders`].
    pub top: usize,
    /// Child indices from the top-level folder downwards.
    pub steps: SmallVec<[usize; 4]>,
}

impl NodePath {
    /// Path of the parent folder, `None` for top-level folders.
    pub fn parent(&self) -> Option<NodePath> {
        let (_, rest) = self.steps.split_last()?;
        Some(NodePath {
            top: self.top,
            steps: SmallVec::from_slice(rest),
        })
    }

    /// Path of child `index` under this folder.
    pub fn child(&self, index: usize) -> NodePath {
        let mut steps = self.steps.clone();
        steps.push(index);
        NodePath {
            top: self.top,
            steps,
        }
    }
}

/// The book or cover half of an album, with its own id space.
///
/// Top-level folders are reference counted: cloning a subtree shares every folder, and edits
/// copy only the top-level folder they touch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Subtree {
    /// Ordered top-level folders (spreads for the book, cover roots for the cover).
    pub folders: Vec<Arc<Folder>>,
    /// Image records.
    pub images: Vec<Image>,
    /// Text records.
    pub texts: Vec<Text>,
    /// Next id to hand out; always greater than every allocated id.
    pub next_id: u32,
}

impl Subtree {
    /// Hand out a fresh id.
    pub fn allocate_id(&mut self) -> u32 {
        if self.next_id == 0 {
            self.next_id = 1;
        }
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Look up an image record.
    pub fn image(&self, id: ImageId) -> Option<&Image> {
        self.images.iter().find(|i| i.id == id)
    }

    /// Mutable image record lookup.
    pub fn image_mut(&mut self, id: ImageId) -> Option<&mut Image> {
        self.images.iter_mut().find(|i| i.id == id)
    }

    /// Image bound to slot `folder`.
    pub fn image_for_folder(&self, folder: FolderId) -> Option<&Image> {
        if folder.is_empty() {
            return None;
        }
        self.images.iter().find(|i| i.folder_id == folder)
    }

    /// Text bound to slot `folder`.
    pub fn text_for_folder(&self, folder: FolderId) -> Option<&Text> {
        if folder.is_empty() {
            return None;
        }
        self.texts.iter().find(|t| t.folder_id == folder)
    }

    /// Locate a folder by non-empty id.
    pub fn find(&self, id: FolderId) -> Option<NodePath> {
        if id.is_empty() {
            return None;
        }
        self.folders.iter().enumerate().find_map(|(top, f)| {
            if f.id == id {
                return Some(NodePath {
                    top,
                    steps: SmallVec::new(),
                });
            }
            f.find_steps(id).map(|steps| NodePath { top, steps })
        })
    }

    /// Locate a page-like folder (one that carries a layout).
    pub fn find_page(&self, id: FolderId) -> Option<NodePath> {
        let path = self.find(id)?;
        self.folder(&path)
            .is_some_and(|f| f.kind.is_page_like())
            .then_some(path)
    }

    /// Folder at `path`.
    pub fn folder(&self, path: &NodePath) -> Option<&Folder> {
        let mut cur: &Folder = self.folders.get(path.top)?;
        for &i in &path.steps {
            cur = cur.children.get(i)?.folder()?;
        }
        Some(cur)
    }

    /// Mutable folder at `path`; copies the top-level folder if it is shared.
    pub fn folder_mut(&mut self, path: &NodePath) -> Option<&mut Folder> {
        let mut cur: &mut Folder = Arc::make_mut(self.folders.get_mut(path.top)?);
        for &i in &path.steps {
            cur = cur.children.get_mut(i)?.folder_mut()?;
        }
        Some(cur)
    }

    /// Every page-like folder with its path, in document order.
    pub fn pages(&self) -> Vec<(NodePath, &Folder)> {
        let mut out = Vec::new();
        for (top, root) in self.folders.iter().enumerate() {
            let path = NodePath {
                top,
                steps: SmallVec::new(),
            };
            collect_pages(root, path, &mut out);
        }
        out
    }

    /// Every non-empty folder id in the subtree.
    pub fn folder_ids(&self) -> Vec<FolderId> {
        let mut ids = Vec::new();
        for root in &self.folders {
            root.walk(&mut |f| {
                if !f.id.is_empty() {
                    ids.push(f.id);
                }
            });
        }
        ids
    }

    /// Highest id used by any folder, image or text binding.
    pub fn max_used_id(&self) -> u32 {
        let folders = self.folder_ids().into_iter().map(|f| f.0);
        let images = self.images.iter().map(|i| i.id.0);
        folders.chain(images).max().unwrap_or(0)
    }
}

fn collect_pages<'a>(folder: &'a Folder, path: NodePath, out: &mut Vec<(NodePath, &'a Folder)>) {
    if folder.kind.is_page_like() {
        out.push((path, folder));
        return;
    }
    for (i, child) in folder.children.iter().enumerate() {
        if let Some(f) = child.folder() {
            collect_pages(f, path.child(i), out);
        }
    }
}

/// A complete photo-book document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Album {
    /// Theme key into the resource catalog.
    pub theme: String,
    /// Inner pages.
    pub book: Subtree,
    /// Cover.
    pub cover: Subtree,
}

impl Album {
    /// Subtree for `side`.
    pub fn subtree(&self, side: Side) -> &Subtree {
        match side {
            Side::Book => &self.book,
            Side::Cover => &self.cover,
        }
    }

    /// Mutable subtree for `side`.
    pub fn subtree_mut(&mut self, side: Side) -> &mut Subtree {
        match side {
            Side::Book => &mut self.book,
            Side::Cover => &mut self.cover,
        }
    }

    /// Total image records across both subtrees.
    pub fn image_count(&self) -> usize {
        self.book.images.len() + self.cover.images.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
