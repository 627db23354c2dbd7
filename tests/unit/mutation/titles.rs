use super::*;
use crate::catalog::resources::ResourceCatalog;
use crate::foundation::core::Size;
use crate::mutation::engine::{EngineOpts, TouchedRegion};

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

fn title_of(album: &Album, page_id: u32) -> Option<(&Folder, &Text)> {
    let slot = page(album, page_id)
        .child_folders()
        .find(|f| f.kind == FolderKind::TitleSlot)?;
    Some((slot, album.book.text_for_folder(slot.id)?))
}

fn with_background(bg: &str) -> Album {
    let mut album = album();
    let path = album.book.find(FolderId(18)).unwrap();
    album.book.folder_mut(&path).unwrap().background = Some(bg.to_string());
    album
}

#[test]
fn new_title_is_appended_with_the_group_style() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .add_page_title(&album(), PageRef::book(2), "  Hello  ")
        .unwrap();
    assert!(edit.is_applied());
    assert_eq!(edit.touched, vec![TouchedRegion::Spread(0)]);
    assert_eq!(edit.album.book.next_id, 20);

    let p = page(&edit.album, 2);
    let last = p.children.last().and_then(Child::folder).unwrap();
    assert_eq!(last.id, FolderId(19));
    assert_eq!(last.kind, FolderKind::TitleSlot);
    // Without a title container the theme box applies.
    assert_eq!(last.size, Size::new(800.0, 75.0));
    // "white" belongs to the light group.
    assert_eq!(last.frame.as_deref(), Some("title-dark"));
    assert_eq!(last.background, None);

    let (_, text) = title_of(&edit.album, 2).unwrap();
    assert_eq!(text.content, "Hello");
    assert_eq!(text.font.family, "Lora");
    assert_eq!(text.direction, TextDirection::Ltr);
}

#[test]
fn exact_background_styles_win_over_groups() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .add_page_title(&with_background("black"), PageRef::book(18), "Night")
        .unwrap();
    let (slot, text) = title_of(&edit.album, 18).unwrap();
    assert_eq!(slot.frame.as_deref(), Some("title-light"));
    assert_eq!(slot.background.as_deref(), Some("black"));
    assert_eq!(text.font.family, "Lora Light");
}

#[test]
fn ungrouped_backgrounds_use_the_theme_default() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .add_page_title(&with_background("kraft"), PageRef::book(18), "Plain")
        .unwrap();
    let (slot, text) = title_of(&edit.album, 18).unwrap();
    assert_eq!(slot.frame.as_deref(), Some("title-plain"));
    assert_eq!(text.font.family, "Inter");
}

#[test]
fn existing_titles_are_rewritten_in_place() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let input = album();
    let edit = engine
        .add_page_title(&input, PageRef::book(9), "שלום")
        .unwrap();
    assert_eq!(edit.album.book.next_id, input.book.next_id);
    assert_eq!(page(&edit.album, 9).slot_count(), page(&input, 9).slot_count());
    let (slot, text) = title_of(&edit.album, 9).unwrap();
    assert_eq!(slot.id, FolderId(16));
    assert_eq!(text.content, "שלום");
    assert_eq!(text.direction, TextDirection::Rtl);
    assert_eq!(edit.album.book.texts.len(), 1);
}

#[test]
fn long_titles_are_cut_to_the_theme_limit() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .add_page_title(&album(), PageRef::book(9), "A caption well beyond twenty-four characters")
        .unwrap();
    let (_, text) = title_of(&edit.album, 9).unwrap();
    assert_eq!(text.content, "A caption well beyond tw");
}

#[test]
fn locked_title_text_is_kept() {
    let cat = catalog();
    let mut input = album();
    input.book.texts[0].locked = true;
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .add_page_title(&input, PageRef::book(9), "Other")
        .unwrap();
    assert_eq!(edit.miss(), Some(&locked(16)));
}

#[test]
fn removing_a_title_drops_slot_and_text() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let edit = engine
        .remove_page_title(&album(), PageRef::book(9))
        .unwrap();
    assert!(title_of(&edit.album, 9).is_none());
    assert!(edit.album.book.texts.is_empty());
    assert_eq!(page(&edit.album, 9).slot_count(), 3);

    let none = engine
        .remove_page_title(&album(), PageRef::book(18))
        .unwrap();
    assert_eq!(none.miss(), Some(&Miss::TitleNotFound { page: FolderId(18) }));
}

#[test]
fn add_then_remove_restores_the_page() {
    let cat = catalog();
    let mut engine = Engine::new(&cat, EngineOpts::default());
    let input = album();
    let added = engine
        .add_page_title(&input, PageRef::book(2), "Trip")
        .unwrap();
    let removed = engine
        .remove_page_title(&added.album, PageRef::book(2))
        .unwrap();
    assert_eq!(page(&removed.album, 2), page(&input, 2));
    assert_eq!(removed.album.book.texts, input.book.texts);
}
