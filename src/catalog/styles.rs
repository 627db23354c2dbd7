//! Style fallback chains.
//!
//! Each tier is its own function so the precedence is explicit and individually testable.

use crate::catalog::resources::{FontMetrics, FrameKind, Theme, TitleStyle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Which tier of the title-style chain produced a style.
pub enum StyleTier {
    /// A style registered for the page's exact background.
    ExactBackground,
    /// A style registered for the background's group.
    BackgroundGroup,
    /// The theme's default title style.
    ThemeDefault,
}

/// Title style for a page with `background`, walking exact → group → default.
pub fn title_style_for<'a>(
    theme: &'a Theme,
    background: Option<&str>,
) -> (&'a TitleStyle, StyleTier) {
    if let Some(style) = background.and_then(|bg| title_style_exact(theme, bg)) {
        return (style, StyleTier::ExactBackground);
    }
    if let Some(style) = background.and_then(|bg| title_style_by_group(theme, bg)) {
        return (style, StyleTier::BackgroundGroup);
    }
    (title_style_default(theme), StyleTier::ThemeDefault)
}

pub(crate) fn title_style_exact<'a>(theme: &'a Theme, background: &str) -> Option<&'a TitleStyle> {
    theme
        .title
        .styles
        .iter()
        .find(|s| s.background.as_deref() == Some(background))
}

pub(crate) fn title_style_by_group<'a>(
    theme: &'a Theme,
    background: &str,
) -> Option<&'a TitleStyle> {
    let group = theme.background(background)?.group.as_deref()?;
    theme
        .title
        .styles
        .iter()
        .find(|s| s.background.is_none() && s.group.as_deref() == Some(group))
}

pub(crate) fn title_style_default(theme: &Theme) -> &TitleStyle {
    &theme.title.default_style
}

/// Font metrics for `style`; unknown font keys fall back to the key as family name.
pub fn title_font(theme: &Theme, style: &TitleStyle) -> FontMetrics {
    theme
        .fonts
        .get(&style.font)
        .cloned()
        .unwrap_or_else(|| FontMetrics {
            family: style.font.clone(),
            size_pt: 12.0,
            line_height: 1.2,
        })
}

/// Frame for a newly synthesized image slot: a sibling's image frame, else the theme default.
pub fn slot_frame_for(theme: &Theme, sibling_frame: Option<&str>) -> Option<String> {
    sibling_image_frame(theme, sibling_frame).or_else(|| theme_default_frame(theme))
}

pub(crate) fn sibling_image_frame(theme: &Theme, sibling_frame: Option<&str>) -> Option<String> {
    let id = sibling_frame?;
    let frame = theme.frame(id)?;
    (frame.kind == FrameKind::Image).then(|| frame.id.clone())
}

pub(crate) fn theme_default_frame(theme: &Theme) -> Option<String> {
    theme.default_frame.clone()
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/styles.rs"]
mod tests;
