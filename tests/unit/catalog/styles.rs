use super::*;
use crate::catalog::resources::ResourceCatalog;

fn classic() -> Theme {
    let cat = ResourceCatalog::from_json_str(include_str!("../../data/catalog.json")).unwrap();
    cat.theme("classic").unwrap().clone()
}

#[test]
fn exact_background_wins_over_group() {
    let theme = classic();
    let (style, tier) = title_style_for(&theme, Some("black"));
    assert_eq!(tier, StyleTier::ExactBackground);
    assert_eq!(style.frame.as_deref(), Some("title-light"));
}

#[test]
fn group_tier_applies_to_grouped_backgrounds() {
    let theme = classic();
    let (style, tier) = title_style_for(&theme, Some("cream"));
    assert_eq!(tier, StyleTier::BackgroundGroup);
    assert_eq!(style.font, "serif");
}

#[test]
fn ungrouped_unknown_or_missing_background_falls_to_default() {
    let theme = classic();
    // "slate" is in the dark group, which has no group style.
    for bg in [Some("kraft"), Some("slate"), Some("does-not-exist"), None] {
        let (style, tier) = title_style_for(&theme, bg);
        assert_eq!(tier, StyleTier::ThemeDefault, "background {bg:?}");
        assert_eq!(style.frame.as_deref(), Some("title-plain"));
    }
}

#[test]
fn tiers_are_individually_addressable() {
    let theme = classic();
    assert!(title_style_exact(&theme, "white").is_none());
    assert!(title_style_by_group(&theme, "white").is_some());
    assert_eq!(title_style_default(&theme).font, "sans");
}

#[test]
fn slot_frame_prefers_sibling_image_frame() {
    let theme = classic();
    assert_eq!(slot_frame_for(&theme, Some("polaroid")).as_deref(), Some("polaroid"));
    // Text frames are never reused for photo slots.
    assert_eq!(slot_frame_for(&theme, Some("title-dark")).as_deref(), Some("thin"));
    assert_eq!(slot_frame_for(&theme, Some("missing")).as_deref(), Some("thin"));
    assert_eq!(slot_frame_for(&theme, None).as_deref(), Some("thin"));
}
