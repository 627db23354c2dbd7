use crate::{
    catalog::layout::{Container, Layout},
    catalog::resources::Theme,
    document::model::{Child, Folder, FolderKind},
    foundation::core::{Point, Size, SlotRect},
    foundation::error::{FolioError, FolioResult},
};

/// Child rectangles of `folder` as fractions of its box, one per present child, in order.
///
/// Pure and deterministic. A degenerate parent box yields all-zero rectangles instead of NaN.
pub fn slot_rects(folder: &Folder) -> Vec<SlotRect> {
    folder
        .child_folders()
        .map(|child| slot_rect(folder.size, child))
        .collect()
}

/// Rectangle of `child` relative to a parent of size `parent`.
///
/// A degenerate parent yields an all-zero rectangle.
pub fn slot_rect(parent: Size, child: &Folder) -> SlotRect {
    if !parent.is_valid() {
        return SlotRect {
            left: 0.0,
            top: 0.0,
            width: 0.0,
            height: 0.0,
        };
    }
    SlotRect {
        left: (child.pivot.x - child.size.width * 0.5) / parent.width,
        top: (child.pivot.y - child.size.height * 0.5) / parent.height,
        width: child.size.width / parent.width,
        height: child.size.height / parent.height,
    }
}

/// Size and pivot of a slot placed in `container` on a page of `page` size.
pub fn place(container: &Container, page: Size) -> (Size, Point) {
    let (size, (cx, cy)) = container.place_in(page);
    (size, Point::new(cx, cy))
}

/// Re-derive every slot's size and pivot of `page` from `layout`.
///
/// Layout-bound slots map in order onto the layout's placeable containers. A title slot takes the
/// layout's title container when it has one; other text slots keep their geometry.
pub fn apply_layout(page: &mut Folder, layout: &Layout) -> FolioResult<()> {
    let slots = page.slot_count();
    if slots != layout.container_count() {
        return Err(FolioError::invariant(format!(
            "page {} holds {slots} slots, layout '{}' has {} containers",
            page.id,
            layout.id,
            layout.container_count()
        )));
    }

    let page_size = page.size;
    let mut placeable = layout.placeable();
    let title = layout.title_container();
    for child in page.children.iter_mut() {
        let Child::Folder(slot) = child else { continue };
        let container = if slot.kind.is_text() {
            if slot.kind != FolderKind::TitleSlot {
                continue;
            }
            match title {
                Some(c) => c,
                None => continue,
            }
        } else {
            match placeable.next() {
                Some(c) => c,
                None => break,
            }
        };
        let (size, pivot) = place(container, page_size);
        slot.size = size;
        slot.pivot = pivot;
    }
    page.layout = Some(layout.id.clone());
    Ok(())
}

/// Size and pivot of a title slot: the layout's title container, else the theme's default box.
pub fn title_placement(theme: &Theme, layout: Option<&Layout>, page: Size) -> (Size, Point) {
    if let Some(container) = layout.and_then(Layout::title_container) {
        return place(container, page);
    }
    let b = theme.title.default_box;
    (
        Size::new(b.width * page.width, b.height * page.height),
        Point::new(
            (b.x + b.width * 0.5) * page.width,
            (b.y + b.height * 0.5) * page.height,
        ),
    )
}

/// Aspect ratio of the `index`-th placeable container of `layout` on a page of `page` size.
pub fn container_ratio(layout: &Layout, page: Size, index: usize) -> Option<f64> {
    layout.placeable_at(index)?.ratio_on(page)
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/slots.rs"]
mod tests;
