use super::*;
use crate::foundation::core::{CropRect, ImageId, LayoutId, Size};

fn catalog() -> ResourceCatalog {
    ResourceCatalog::from_json_str(include_str!("../../data/catalog.json")).unwrap()
}

fn album() -> Album {
    Album::from_json_str(include_str!("../../data/album.json"))
        .unwrap()
        .0
}

fn page_mut(album: &mut Album, id: u32) -> &mut Folder {
    let path = album.book.find(FolderId(id)).unwrap();
    album.book.folder_mut(&path).unwrap()
}

fn expect_err(album: &Album, needle: &str) {
    let err = album.validate(&catalog()).unwrap_err().to_string();
    assert!(err.contains(needle), "expected '{needle}' in '{err}'");
}

#[test]
fn fixture_is_valid() {
    album().validate(&catalog()).unwrap();
}

#[test]
fn unknown_theme_fails() {
    let mut a = album();
    a.theme = "gothic".to_string();
    expect_err(&a, "gothic");
}

#[test]
fn stale_counter_fails() {
    let mut a = album();
    a.book.next_id = 18;
    expect_err(&a, "book: next_id 18");
}

#[test]
fn container_count_must_match_slots() {
    let mut a = album();
    page_mut(&mut a, 6).layout = Some(LayoutId::new("p3-grid"));
    expect_err(&a, "holds 2 slots but layout 'p3-grid' has 3 containers");
}

#[test]
fn page_span_must_fit_the_folder_kind() {
    let mut a = album();
    page_mut(&mut a, 2).layout = Some(LayoutId::new("cover-front"));
    expect_err(&a, "cannot use Cover layout");

    let mut a = album();
    let path = a.cover.find(FolderId(7)).unwrap();
    a.cover.folder_mut(&path).unwrap().layout = Some(LayoutId::new("p1-full"));
    expect_err(&a, "cover: page folder#7");
}

#[test]
fn text_slots_must_trail_layout_slots() {
    let mut a = album();
    page_mut(&mut a, 9).children.swap(2, 3);
    expect_err(&a, "layout slot after a text slot");
}

#[test]
fn images_must_bind_image_slots() {
    let mut a = album();
    a.book.images[0].folder_id = FolderId(16);
    expect_err(&a, "of kind TitleSlot");

    let mut a = album();
    a.book.images[0].folder_id = FolderId(7);
    expect_err(&a, "folder#7 holds two images");

    let mut a = album();
    a.book.images[0].crop = CropRect::new(0.0, 0.0, 0.0, 1.0);
    expect_err(&a, "image#4 has an invalid crop");

    let mut a = album();
    a.book.images[0].id = ImageId(8);
    expect_err(&a, "image#8 appears more than once");
}

#[test]
fn texts_must_bind_text_slots() {
    let mut a = album();
    a.book.texts[0].folder_id = FolderId(10);
    expect_err(&a, "text bound to folder#10 is orphaned");

    let mut a = album();
    let dup = a.book.texts[0].clone();
    a.book.texts.push(dup);
    expect_err(&a, "folder#16 holds two texts");
}

#[test]
fn sentinel_rule_is_enforced() {
    let mut a = album();
    let slot = page_mut(&mut a, 6).children[1].folder_mut().unwrap();
    slot.kind = FolderKind::ImageSlot;
    expect_err(&a, "breaks the empty-slot sentinel");
}

#[test]
fn reserved_entries_live_only_in_spreads() {
    let mut a = album();
    page_mut(&mut a, 18).children.push(Child::Reserved);
    expect_err(&a, "holds a reserved entry but is not a spread");

    let mut a = album();
    let spread = std::sync::Arc::make_mut(&mut a.book.folders[1]);
    spread.children = vec![Child::Reserved, Child::Reserved];
    expect_err(&a, "has no pages");
}

#[test]
fn nested_spreads_are_rejected() {
    let mut a = album();
    let mut nested = Folder::new(FolderId(40), FolderKind::Spread, Size::new(1.0, 1.0));
    nested.children = vec![Child::Reserved, Child::Reserved];
    a.book.next_id = 41;
    let spread = std::sync::Arc::make_mut(&mut a.book.folders[2]);
    spread.children[1] = Child::Folder(nested);
    expect_err(&a, "spread folder#40 is nested");
}
