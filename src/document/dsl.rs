use crate::{
    catalog::layout::ContentFamily,
    catalog::resources::{ResourceCatalog, Theme},
    catalog::styles::{slot_frame_for, title_font, title_style_for},
    document::model::{Album, Child, Folder, FolderKind, Image, Subtree, Text, TextDirection},
    foundation::core::{CropRect, FolderId, ImageId, LayoutId, Point, Size},
    foundation::error::{FolioError, FolioResult},
    geometry::fit::refit,
    geometry::slots::{apply_layout, container_ratio, title_placement},
    orientation::quantize::Orientation,
};

/// Builds a valid [`Album`] against a catalog theme.
pub struct AlbumBuilder<'a> {
    catalog: &'a ResourceCatalog,
    theme: String,
    page_size: Size,
    spine_width: f64,
    spreads: Vec<SpreadSpec>,
    cover: Vec<(FolderKind, PageBuilder)>,
}

enum SpreadSpec {
    Pages(Option<PageBuilder>, Option<PageBuilder>),
    Layflat(PageBuilder),
}

impl<'a> AlbumBuilder<'a> {
    /// Start an album in `theme`, which must exist in `catalog`.
    pub fn new(catalog: &'a ResourceCatalog, theme: impl Into<String>) -> FolioResult<Self> {
        let theme = theme.into();
        if catalog.theme(&theme).is_none() {
            return Err(FolioError::validation(format!(
                "theme '{theme}' is not in the catalog"
            )));
        }
        Ok(Self {
            catalog,
            theme,
            page_size: Size::new(1000.0, 1000.0),
            spine_width: 50.0,
            spreads: Vec::new(),
            cover: Vec::new(),
        })
    }

    /// Size of one page; spreads are two pages wide. Defaults to 1000 × 1000.
    pub fn page_size(mut self, size: Size) -> Self {
        self.page_size = size;
        self
    }

    /// Width of spine panels added with [`AlbumBuilder::spine`].
    pub fn spine_width(mut self, width: f64) -> Self {
        self.spine_width = width;
        self
    }

    /// Two-page spread; `None` reserves the entry (first/last spread edges).
    pub fn spread(mut self, left: Option<PageBuilder>, right: Option<PageBuilder>) -> Self {
        self.spreads.push(SpreadSpec::Pages(left, right));
        self
    }

    /// Single panel spanning the whole spread.
    pub fn layflat(mut self, page: PageBuilder) -> Self {
        self.spreads.push(SpreadSpec::Layflat(page));
        self
    }

    /// Front/back cover panel, appended left to right.
    pub fn cover_region(mut self, page: PageBuilder) -> Self {
        self.cover.push((FolderKind::CoverRegion, page));
        self
    }

    /// Spine panel, appended left to right.
    pub fn spine(mut self, page: PageBuilder) -> Self {
        self.cover.push((FolderKind::SpineRegion, page));
        self
    }

    /// Lay out every page, fit the photos and allocate ids.
    pub fn build(self) -> FolioResult<Album> {
        let theme = self
            .catalog
            .theme(&self.theme)
            .ok_or_else(|| FolioError::validation(format!("theme '{}' vanished", self.theme)))?;
        let ctx = Ctx {
            catalog: self.catalog,
            theme,
        };
        let page = self.page_size;
        let spread_size = Size::new(page.width * 2.0, page.height);

        let mut book = Subtree::default();
        for spec in self.spreads {
            let mut spread = Folder::new(
                FolderId(book.allocate_id()),
                FolderKind::Spread,
                spread_size,
            );
            match spec {
                SpreadSpec::Pages(left, right) => {
                    if left.is_none() && right.is_none() {
                        return Err(FolioError::validation("a spread needs at least one page"));
                    }
                    for (i, p) in [left, right].into_iter().enumerate() {
                        let child = match p {
                            Some(p) => {
                                let pivot =
                                    Point::new((i as f64 + 0.5) * page.width, page.height * 0.5);
                                let folder =
                                    ctx.page(&p, FolderKind::Page, page, pivot, &mut book)?;
                                Child::Folder(folder)
                            }
                            None => Child::Reserved,
                        };
                        spread.children.push(child);
                    }
                }
                SpreadSpec::Layflat(p) => {
                    let pivot = Point::new(page.width, page.height * 0.5);
                    let folder = ctx.page(&p, FolderKind::Page, spread_size, pivot, &mut book)?;
                    spread.children.push(Child::Folder(folder));
                    spread.children.push(Child::Reserved);
                }
            }
            book.folders.push(spread.into());
        }

        let mut cover = Subtree::default();
        if !self.cover.is_empty() {
            let widths: Vec<f64> = self
                .cover
                .iter()
                .map(|(kind, _)| match kind {
                    FolderKind::SpineRegion => self.spine_width,
                    _ => page.width,
                })
                .collect();
            let total: f64 = widths.iter().sum();
            let mut root = Folder::new(
                FolderId(cover.allocate_id()),
                FolderKind::Cover,
                Size::new(total, page.height),
            );
            let mut x = 0.0;
            for ((kind, p), w) in self.cover.iter().zip(widths) {
                let pivot = Point::new(x + w * 0.5, page.height * 0.5);
                let region = ctx.page(p, *kind, Size::new(w, page.height), pivot, &mut cover)?;
                root.children.push(Child::Folder(region));
                x += w;
            }
            cover.folders.push(root.into());
        }

        let album = Album {
            theme: self.theme,
            book,
            cover,
        };
        album.validate(self.catalog)?;
        Ok(album)
    }
}

struct Ctx<'a> {
    catalog: &'a ResourceCatalog,
    theme: &'a Theme,
}

impl Ctx<'_> {
    fn page(
        &self,
        spec: &PageBuilder,
        kind: FolderKind,
        size: Size,
        pivot: Point,
        subtree: &mut Subtree,
    ) -> FolioResult<Folder> {
        let layout = self.catalog.layout(&spec.layout).ok_or_else(|| {
            FolioError::validation(format!("layout '{}' is not in the catalog", spec.layout))
        })?;
        let count = layout.container_count();
        if spec.slots.len() > count {
            return Err(FolioError::validation(format!(
                "layout '{}' has {count} containers, {} slots given",
                layout.id,
                spec.slots.len()
            )));
        }

        let mut page = Folder::new(FolderId(subtree.allocate_id()), kind, size);
        page.pivot = pivot;
        page.background = spec.background.clone();
        page.locked = spec.locked;

        let frame = slot_frame_for(self.theme, None);
        let mut fitted = Vec::new();
        for (i, container) in layout.placeable().enumerate() {
            let slot = if container.family == ContentFamily::Spine {
                let id = FolderId(subtree.allocate_id());
                if let Some(text) = &spec.spine_text {
                    let record = self.text(id, text, spec.background.as_deref());
                    subtree.texts.push(record);
                }
                Folder::new(id, FolderKind::SpineSlot, Size::default())
            } else {
                match spec.slots.get(i) {
                    Some(SlotSpec::Photo(photo)) => {
                        let id = FolderId(subtree.allocate_id());
                        let image = ImageId(subtree.allocate_id());
                        subtree.images.push(photo.record(image, id));
                        fitted.push((i, image));
                        let mut slot = Folder::new(id, FolderKind::ImageSlot, Size::default());
                        slot.frame = frame.clone();
                        slot
                    }
                    Some(SlotSpec::Empty) | None => {
                        let mut slot = Folder::empty_slot(Size::default(), Point::ORIGIN);
                        slot.frame = frame.clone();
                        slot
                    }
                }
            };
            page.children.push(Child::Folder(slot));
        }

        if let Some(title) = &spec.title {
            let id = FolderId(subtree.allocate_id());
            let (size, pivot) = title_placement(self.theme, Some(layout), page.size);
            let mut slot = Folder::new(id, FolderKind::TitleSlot, size);
            slot.pivot = pivot;
            let (style, _) = title_style_for(self.theme, spec.background.as_deref());
            slot.background = style.title_background.clone();
            slot.frame = style.frame.clone();
            page.children.push(Child::Folder(slot));
            let title: String = title.chars().take(self.theme.title.max_len).collect();
            subtree
                .texts
                .push(self.text(id, &title, spec.background.as_deref()));
        }

        apply_layout(&mut page, layout)?;
        for (i, image) in fitted {
            let ratio = container_ratio(layout, page.size, i);
            if let Some(img) = subtree.image_mut(image) {
                refit(img, ratio);
            }
        }
        Ok(page)
    }

    fn text(&self, folder: FolderId, content: &str, background: Option<&str>) -> Text {
        let (style, _) = title_style_for(self.theme, background);
        Text {
            folder_id: folder,
            direction: TextDirection::detect(content),
            content: content.to_string(),
            font: title_font(self.theme, style),
            align_h: Default::default(),
            align_v: Default::default(),
            locked: false,
        }
    }
}

/// What goes into one layout-bound slot.
#[derive(Clone, Debug)]
pub enum SlotSpec {
    /// Leave the slot empty.
    Empty,
    /// Bind a photo.
    Photo(PhotoSpec),
}

/// Photo content for [`PageBuilder::photo_with`].
#[derive(Clone, Debug)]
pub struct PhotoSpec {
    /// Medium-resolution pixel width.
    pub width: u32,
    /// Medium-resolution pixel height.
    pub height: u32,
    /// Opaque upload reference.
    pub source: String,
    /// Orientation the photo arrives with.
    pub orientation: Orientation,
    /// Mark the photo as already rotated by the user.
    pub rotated: bool,
    /// Lock the photo against edits.
    pub locked: bool,
}

impl PhotoSpec {
    /// Plain `width × height` photo with no source or orientation.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            source: String::new(),
            orientation: Orientation::Identity,
            rotated: false,
            locked: false,
        }
    }

    fn record(&self, id: ImageId, folder: FolderId) -> Image {
        Image {
            id,
            folder_id: folder,
            source: self.source.clone(),
            width: self.width,
            height: self.height,
            crop: CropRect::FULL,
            orientation: self.orientation,
            alignment: 0.0,
            opacity: 1.0,
            locked: self.locked,
            rotated: self.rotated,
            caption: None,
        }
    }
}

/// One page (or cover panel) for [`AlbumBuilder`].
#[derive(Clone, Debug)]
pub struct PageBuilder {
    layout: LayoutId,
    slots: Vec<SlotSpec>,
    background: Option<String>,
    title: Option<String>,
    spine_text: Option<String>,
    locked: bool,
}

impl PageBuilder {
    /// Page laid out with the catalog layout `layout`.
    pub fn new(layout: impl Into<String>) -> Self {
        Self {
            layout: LayoutId::new(layout),
            slots: Vec::new(),
            background: None,
            title: None,
            spine_text: None,
            locked: false,
        }
    }

    /// Fill the next slot with a `width × height` photo.
    pub fn photo(self, width: u32, height: u32) -> Self {
        self.photo_with(PhotoSpec::new(width, height))
    }

    /// Fill the next slot with `photo`.
    pub fn photo_with(mut self, photo: PhotoSpec) -> Self {
        self.slots.push(SlotSpec::Photo(photo));
        self
    }

    /// Leave the next slot empty.
    pub fn empty(mut self) -> Self {
        self.slots.push(SlotSpec::Empty);
        self
    }

    /// Background resource id.
    pub fn background(mut self, id: impl Into<String>) -> Self {
        self.background = Some(id.into());
        self
    }

    /// Add a page title.
    pub fn title(mut self, text: impl Into<String>) -> Self {
        self.title = Some(text.into());
        self
    }

    /// Text for the spine slot of a spine panel.
    pub fn spine_text(mut self, text: impl Into<String>) -> Self {
        self.spine_text = Some(text.into());
        self
    }

    /// Lock the page.
    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/dsl.rs"]
mod tests;
