use super::*;
use crate::catalog::resources::ResourceCatalog;
use crate::document::dsl::{AlbumBuilder, PageBuilder};
use crate::document::model::Folder;
use crate::foundation::core::CropRect;
use crate::mutation::engine::{EngineOpts, Outcome, TouchedRegion};
use crate::orientation::quantize::Orientation;
use crate::orientation::transform::PixelCrop;

fn catalog() -> ResourceCatalog {
    ResourceCatalog::from_json_str(include_str!("../../data/catalog.json")).unwrap()
}

fn locked(id: u32) -> Miss {
    Miss::Locked {
        folder: FolderId(id),
    }
}

fn album() -> Album {
    Album::from_json_str(include_str!("../../data/album.json"))
        .unwrap()
        .0
}

fn page(album: &Album, id: u32) -> &Folder {
    album
        .book
        .folder(&album.book.find(FolderId(id)).unwrap())
        .unwrap()
}

fn slot_ids(page: &Folder) -> Vec<u32> {
    page.child_folders().map(|f| f.id.0).collect()
}

fn crop_of(album: &Album, side: Side, id: u32) -> CropRect {
    album.subtree(side).image(ImageId(id)).unwrap().crop
}

fn upload(width: u32, height: u32) -> NewImage {
    NewImage {
        source: "up/new.jpg".to_string(),
        ..NewImage::new(width, height)
    }
}

#[test]
fn add_fills_a_free_slot_before_growing() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .add_image(&album(), PageRef::book(6), Some(0), None, Some(&upload(800, 600)))
        .unwrap();
    assert!(edit.is_applied());
    let p = page(&edit.album, 6);
    assert_eq!(p.layout, Some(LayoutId::new("p2-split")));
    // Slot 0 is taken, so the first free slot wins.
    assert_eq!(slot_ids(p), vec![7, 19]);
    let img = edit.album.book.image(ImageId(20)).unwrap();
    assert_eq!(img.source, "up/new.jpg");
    assert_eq!(img.folder_id, FolderId(19));
    assert_eq!(edit.album.book.images.len(), 6);
}

#[test]
fn add_grows_a_full_page_by_one_container() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .add_image(&album(), PageRef::book(2), None, None, Some(&upload(800, 600)))
        .unwrap();
    let p = page(&edit.album, 2);
    assert_eq!(p.layout, Some(LayoutId::new("p2-split")));
    assert_eq!(slot_ids(p), vec![3, 19]);
    assert_eq!(edit.touched, vec![TouchedRegion::Spread(0)]);
    // Both 4:3 photos now sit in 500x1000 boxes.
    let narrow = CropRect::new(0.3125, 0.0, 0.375, 1.0);
    assert!(crop_of(&edit.album, Side::Book, 4).approx_eq(&narrow, 1e-12));
    assert!(crop_of(&edit.album, Side::Book, 20).approx_eq(&narrow, 1e-12));
}

#[test]
fn add_without_content_leaves_a_placeholder() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let input = album();
    let edit = engine
        .add_image(&input, PageRef::book(2), None, None, None)
        .unwrap();
    let p = page(&edit.album, 2);
    assert_eq!(slot_ids(p), vec![3, 0]);
    assert_eq!(p.child_folders().nth(1).unwrap().kind, FolderKind::EmptySlot);
    assert_eq!(edit.album.book.images.len(), input.book.images.len());
    assert_eq!(edit.album.book.next_id, input.book.next_id);

    // A free slot and nothing to put in it.
    let again = engine
        .add_image(&input, PageRef::book(6), None, None, None)
        .unwrap();
    assert_eq!(again.outcome, Outcome::Unchanged);
}

#[test]
fn forced_layout_grows_even_with_a_free_slot() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let p3 = LayoutId::new("p3-grid");
    let edit = engine
        .add_image(&album(), PageRef::book(6), None, Some(&p3), Some(&upload(10, 10)))
        .unwrap();
    let p = page(&edit.album, 6);
    assert_eq!(p.layout, Some(p3));
    assert_eq!(slot_ids(p), vec![7, 0, 19]);
}

#[test]
fn forced_layout_must_hold_one_more_container() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let input = album();
    let stack = LayoutId::new("p2-stack");
    let edit = engine
        .add_image(&input, PageRef::book(6), None, Some(&stack), None)
        .unwrap();
    assert_eq!(edit.miss(), Some(&Miss::NoLayoutForCount { count: 3 }));

    let layflat = LayoutId::new("lf2-split");
    let edit = engine
        .add_image(&input, PageRef::book(2), None, Some(&layflat), None)
        .unwrap();
    assert_eq!(edit.miss(), Some(&Miss::NoLayoutForCount { count: 2 }));
}

#[test]
fn add_misses_when_no_bigger_layout_exists() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let grown = engine
        .add_image(&album(), PageRef::book(9), None, None, Some(&upload(10, 10)))
        .unwrap();
    assert_eq!(page(&grown.album, 9).layout, Some(LayoutId::new("p4-grid")));
    // The title slot stays behind the new container.
    assert_eq!(slot_ids(page(&grown.album, 9)), vec![10, 12, 14, 19, 16]);

    let edit = engine
        .add_image(&grown.album, PageRef::book(9), None, None, Some(&upload(10, 10)))
        .unwrap();
    assert_eq!(edit.miss(), Some(&Miss::NoLayoutForCount { count: 5 }));
    assert_eq!(edit.album, grown.album);
}

#[test]
fn add_refuses_locked_pages() {
    let cat = catalog();
    let mut input = album();
    let path = input.book.find(FolderId(18)).unwrap();
    input.book.folder_mut(&path).unwrap().locked = true;
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .add_image(&input, PageRef::book(18), None, None, Some(&upload(10, 10)))
        .unwrap();
    assert_eq!(edit.miss(), Some(&locked(18)));
}

#[test]
fn remove_shrinks_the_layout_and_keeps_the_title_last() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .remove_images(&album(), PageRef::book(9), &[ImageId(13)], false)
        .unwrap();
    assert!(edit.is_applied());
    assert!(edit.detached.is_empty());

    let p = page(&edit.album, 9);
    assert_eq!(p.layout, Some(LayoutId::new("p2-split")));
    assert_eq!(slot_ids(p), vec![10, 14, 16]);
    assert!(edit.album.book.image(ImageId(13)).is_none());
    assert!(edit.album.book.text_for_folder(FolderId(16)).is_some());

    // The landscape photo and the rotated portrait both display as 4:3.
    let narrow = CropRect::new(0.3125, 0.0, 0.375, 1.0);
    assert!(crop_of(&edit.album, Side::Book, 11).approx_eq(&narrow, 1e-12));
    assert!(crop_of(&edit.album, Side::Book, 15).approx_eq(&narrow, 1e-12));
    assert_eq!(
        edit.album.book.image(ImageId(15)).unwrap().orientation,
        Orientation::Rotate90
    );
}

#[test]
fn remove_can_hand_back_the_records() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let input = album();
    let edit = engine
        .remove_images(&input, PageRef::book(9), &[ImageId(11), ImageId(13)], true)
        .unwrap();
    let ids: Vec<ImageId> = edit.detached.iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![ImageId(11), ImageId(13)]);
    assert_eq!(edit.album.book.images.len(), input.book.images.len() - 2);
    assert_eq!(slot_ids(page(&edit.album, 9)), vec![14, 16]);
}

#[test]
fn removing_every_image_leaves_a_blank_page() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .remove_images(&album(), PageRef::book(2), &[ImageId(4)], false)
        .unwrap();
    let p = page(&edit.album, 2);
    assert_eq!(p.layout, Some(LayoutId::new("p0-blank")));
    assert_eq!(p.slot_count(), 0);
}

#[test]
fn removing_without_a_smaller_layout_leaves_an_empty_slot() {
    let cat = catalog();
    let input = AlbumBuilder::new(&cat, "modern")
        .unwrap()
        .spread(None, Some(PageBuilder::new("m1-full").photo(800, 600)))
        .build()
        .unwrap();
    let page_id = input.book.folders[0].child_folders().next().unwrap().id;
    let image = input.book.images[0].id;

    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .remove_images(&input, PageRef::book(page_id.0), &[image], false)
        .unwrap();
    assert_eq!(edit.outcome, Outcome::Applied);
    assert_eq!(edit.touched, vec![TouchedRegion::Spread(0)]);
    assert!(edit.album.book.images.is_empty());

    let p = page(&edit.album, page_id.0);
    assert_eq!(p.layout, Some(LayoutId::new("m1-full")));
    let kinds: Vec<FolderKind> = p.slots().map(|f| f.kind).collect();
    assert_eq!(kinds, vec![FolderKind::EmptySlot]);
    edit.album.validate(&cat).unwrap();
}

#[test]
fn remove_misses_on_foreign_or_locked_images() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let mut input = album();

    let elsewhere = engine
        .remove_images(&input, PageRef::book(6), &[ImageId(13)], false)
        .unwrap();
    assert_eq!(elsewhere.miss(), Some(&Miss::ImageNotFound { image: ImageId(13) }));

    let unknown = engine
        .remove_images(&input, PageRef::book(9), &[ImageId(99)], false)
        .unwrap();
    assert_eq!(unknown.miss(), Some(&Miss::ImageNotFound { image: ImageId(99) }));

    input.book.image_mut(ImageId(13)).unwrap().locked = true;
    let locked = engine
        .remove_images(&input, PageRef::book(9), &[ImageId(13)], false)
        .unwrap();
    assert_eq!(locked.miss(), Some(&Miss::ImageLocked { image: ImageId(13) }));
    assert_eq!(locked.album, input);
}

#[test]
fn removing_nothing_is_unchanged() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .remove_images(&album(), PageRef::book(9), &[], true)
        .unwrap();
    assert_eq!(edit.outcome, Outcome::Unchanged);
}

#[test]
fn swap_across_pages_exchanges_bindings_and_recrops() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let input = album();
    let edit = engine
        .swap_images(
            &input,
            SlotRef::new(PageRef::book(6), 0),
            SlotRef::new(PageRef::book(9), 1),
        )
        .unwrap();
    assert!(edit.is_applied());
    assert_eq!(slot_ids(page(&edit.album, 6)), vec![12, 0]);
    assert_eq!(slot_ids(page(&edit.album, 9)), vec![10, 7, 14, 16]);
    assert_eq!(edit.album.book.images.len(), input.book.images.len());
    // Both pages live in the second spread.
    assert_eq!(edit.touched, vec![TouchedRegion::Spread(1)]);

    // Square photo into a 500x1000 box, portrait into a 500x500 box.
    assert!(
        crop_of(&edit.album, Side::Book, 13).approx_eq(&CropRect::new(0.25, 0.0, 0.5, 1.0), 1e-12)
    );
    assert!(
        crop_of(&edit.album, Side::Book, 8).approx_eq(&CropRect::new(0.0, 0.125, 1.0, 0.75), 1e-12)
    );
}

#[test]
fn move_into_an_empty_slot_shrinks_the_source_page() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .swap_images(
            &album(),
            SlotRef::new(PageRef::book(2), 0),
            SlotRef::new(PageRef::book(6), 1),
        )
        .unwrap();
    let source = page(&edit.album, 2);
    assert_eq!(source.layout, Some(LayoutId::new("p0-blank")));
    assert_eq!(source.slot_count(), 0);
    assert_eq!(slot_ids(page(&edit.album, 6)), vec![7, 3]);
    assert_eq!(edit.album.book.image(ImageId(4)).unwrap().folder_id, FolderId(3));
    assert_eq!(
        edit.touched,
        vec![TouchedRegion::Spread(0), TouchedRegion::Spread(1)]
    );
}

#[test]
fn swap_within_a_page_reorders_slots() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .swap_images(
            &album(),
            SlotRef::new(PageRef::book(9), 0),
            SlotRef::new(PageRef::book(9), 2),
        )
        .unwrap();
    let p = page(&edit.album, 9);
    assert_eq!(slot_ids(p), vec![14, 12, 10, 16]);
    assert!(
        crop_of(&edit.album, Side::Book, 11).approx_eq(&CropRect::new(0.125, 0.0, 0.75, 1.0), 1e-12)
    );

    // A move on the same page never changes the layout.
    let moved = engine
        .swap_images(
            &album(),
            SlotRef::new(PageRef::book(6), 0),
            SlotRef::new(PageRef::book(6), 1),
        )
        .unwrap();
    let p = page(&moved.album, 6);
    assert_eq!(slot_ids(p), vec![0, 7]);
    assert_eq!(p.layout, Some(LayoutId::new("p2-split")));
}

#[test]
fn swap_misses_on_bad_addresses() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let input = album();
    let swap = |engine: &mut Engine<'_>, s: SlotRef, d: SlotRef| {
        engine.swap_images(&input, s, d).unwrap()
    };

    let empty_source = swap(
        &mut engine,
        SlotRef::new(PageRef::book(6), 1),
        SlotRef::new(PageRef::book(6), 0),
    );
    assert_eq!(empty_source.miss(), Some(&Miss::SourceSlotEmpty));

    let out_of_range = swap(
        &mut engine,
        SlotRef::new(PageRef::book(6), 0),
        SlotRef::new(PageRef::book(6), 5),
    );
    assert!(matches!(out_of_range.miss(), Some(Miss::SlotNotFound { .. })));

    let cross_side = swap(
        &mut engine,
        SlotRef::new(PageRef::book(6), 0),
        SlotRef::new(PageRef::cover(7), 0),
    );
    assert!(matches!(cross_side.miss(), Some(Miss::SlotNotFound { .. })));

    let spine = swap(
        &mut engine,
        SlotRef::new(PageRef::cover(2), 0),
        SlotRef::new(PageRef::cover(5), 0),
    );
    assert!(matches!(spine.miss(), Some(Miss::SlotNotFound { .. })));

    let itself = swap(
        &mut engine,
        SlotRef::new(PageRef::book(6), 0),
        SlotRef::new(PageRef::book(6), 0),
    );
    assert_eq!(itself.outcome, Outcome::Unchanged);
}

#[test]
fn swap_respects_locks() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let mut input = album();
    input.book.image_mut(ImageId(13)).unwrap().locked = true;
    let edit = engine
        .swap_images(
            &input,
            SlotRef::new(PageRef::book(6), 0),
            SlotRef::new(PageRef::book(9), 1),
        )
        .unwrap();
    assert_eq!(edit.miss(), Some(&Miss::ImageLocked { image: ImageId(13) }));

    let mut input = album();
    let path = input.book.find(FolderId(7)).unwrap();
    input.book.folder_mut(&path).unwrap().locked = true;
    let edit = engine
        .swap_images(
            &input,
            SlotRef::new(PageRef::book(6), 0),
            SlotRef::new(PageRef::book(6), 1),
        )
        .unwrap();
    assert_eq!(edit.miss(), Some(&locked(7)));
}

#[test]
fn cover_moves_keep_region_layouts() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .swap_images(
            &album(),
            SlotRef::new(PageRef::cover(2), 0),
            SlotRef::new(PageRef::cover(7), 0),
        )
        .unwrap();
    assert_eq!(edit.touched, vec![TouchedRegion::Cover]);
    let cover = &edit.album.cover;
    let back = cover.folder(&cover.find(FolderId(2)).unwrap()).unwrap();
    assert_eq!(back.layout, Some(LayoutId::new("cover-back")));
    assert_eq!(back.child_folders().next().unwrap().kind, FolderKind::EmptySlot);
    // Portrait photo in the square front panel.
    assert!(
        crop_of(&edit.album, Side::Cover, 4).approx_eq(&CropRect::new(0.0, 0.125, 1.0, 0.75), 1e-12)
    );
}

#[test]
fn transform_records_set_crop_and_mark_the_image_rotated() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let record = CropTransform {
        crop: PixelCrop {
            x: 100.0,
            y: 200.0,
            width: 500.0,
            height: 400.0,
        },
        rotation: 0.0,
        flip_x: false,
        flip_y: false,
    };
    let edit = engine
        .apply_transform(&album(), Side::Book, ImageId(13), &record)
        .unwrap();
    let img = edit.album.book.image(ImageId(13)).unwrap();
    assert!(img.rotated);
    assert_eq!(img.orientation, Orientation::Identity);
    assert!(img.crop.approx_eq(&CropRect::new(0.1, 0.2, 0.5, 0.4), 1e-12));
    assert_eq!(edit.touched, vec![TouchedRegion::Spread(1)]);

    let missing = engine
        .apply_transform(&album(), Side::Cover, ImageId(13), &record)
        .unwrap();
    assert_eq!(missing.miss(), Some(&Miss::ImageNotFound { image: ImageId(13) }));
}

#[test]
fn huge_transform_rotations_keep_the_album_loadable() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let record = CropTransform {
        crop: PixelCrop {
            x: 0.0,
            y: 0.0,
            width: 200.0,
            height: 200.0,
        },
        rotation: 1e307,
        flip_x: false,
        flip_y: false,
    };
    let edit = engine
        .apply_transform(&album(), Side::Book, ImageId(13), &record)
        .unwrap();
    assert_eq!(edit.outcome, Outcome::Applied);
    let img = edit.album.book.image(ImageId(13)).unwrap();
    assert!(img.alignment.is_finite());
    assert!(img.alignment > -45.0 && img.alignment <= 45.0);

    let json = edit.album.to_json_string().unwrap();
    let (back, corrections) = Album::from_json_str(&json).unwrap();
    assert!(corrections.is_empty());
    assert_eq!(back, edit.album);
}
