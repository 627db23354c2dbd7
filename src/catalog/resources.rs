use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::{
    catalog::layout::{Layout, LayoutFamily, LayoutSpan},
    foundation::core::LayoutId,
    foundation::error::{FolioError, FolioResult},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A page background resource.
pub struct Background {
    /// Resource key referenced by folders.
    pub id: String,
    /// Optional group used by the title-style fallback chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// What a frame style decorates.
pub enum FrameKind {
    /// Photo border.
    #[default]
    Image,
    /// Text box border/backdrop.
    Text,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A frame/border style resource.
pub struct Frame {
    /// Resource key referenced by folders.
    pub id: String,
    /// What the frame decorates.
    #[serde(default)]
    pub kind: FrameKind,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Font metrics copied into text records.
pub struct FontMetrics {
    /// Font family name.
    pub family: String,
    /// Nominal size in points.
    pub size_pt: f64,
    /// Line height as a multiple of the size.
    #[serde(default = "default_line_height")]
    pub line_height: f64,
}

fn default_line_height() -> f64 {
    1.2
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Background/frame/font triple used when inserting a page title.
pub struct TitleStyle {
    /// Exact page background this style belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<String>,
    /// Background group this style belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Background applied to the title folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_background: Option<String>,
    /// Frame applied to the title folder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame: Option<String>,
    /// Font key into [`Theme::fonts`].
    pub font: String,
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Normalized box (top-left anchored) used for titles when the layout reserves none.
pub struct TitleBox {
    /// Left edge as a fraction of the page width.
    pub x: f64,
    /// Top edge as a fraction of the page height.
    pub y: f64,
    /// Width as a fraction of the page width.
    pub width: f64,
    /// Height as a fraction of the page height.
    pub height: f64,
}

impl Default for TitleBox {
    fn default() -> Self {
        Self {
            x: 0.1,
            y: 0.85,
            width: 0.8,
            height: 0.1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// Theme rules for page titles.
pub struct TitleRules {
    /// Maximum title length in characters.
    pub max_len: usize,
    /// Fallback title box.
    #[serde(default)]
    pub default_box: TitleBox,
    /// Candidate styles, searched in order.
    #[serde(default)]
    pub styles: Vec<TitleStyle>,
    /// Last-resort style.
    pub default_style: TitleStyle,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// All resources of one theme.
pub struct Theme {
    /// Theme key referenced by albums.
    pub name: String,
    /// Layout resources. Ids must be unique across the whole catalog.
    pub layouts: Vec<Layout>,
    /// Background resources.
    #[serde(default)]
    pub backgrounds: Vec<Background>,
    /// Frame resources.
    #[serde(default)]
    pub frames: Vec<Frame>,
    /// Font metrics by key.
    #[serde(default)]
    pub fonts: BTreeMap<String, FontMetrics>,
    /// Frame given to synthesized image slots when no sibling frame applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_frame: Option<String>,
    /// Upper bound on book spreads, when the product has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_spreads: Option<usize>,
    /// Page-title rules.
    pub title: TitleRules,
}

impl Theme {
    /// Look up a background by key.
    pub fn background(&self, id: &str) -> Option<&Background> {
        self.backgrounds.iter().find(|b| b.id == id)
    }

    /// Look up a frame by key.
    pub fn frame(&self, id: &str) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id == id)
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
struct CatalogDef {
    themes: Vec<Theme>,
}

type GroupKey = (String, LayoutSpan, usize);

/// Read-only, theme-scoped resource catalog.
///
/// Built once per editing session and passed explicitly into every engine call; nothing in the
/// engine writes to it.
#[derive(Clone, Debug)]
pub struct ResourceCatalog {
    themes: BTreeMap<String, Theme>,
    by_id: BTreeMap<LayoutId, (String, usize)>,
    by_count: BTreeMap<GroupKey, Vec<LayoutId>>,
}

impl ResourceCatalog {
    /// Build and validate a catalog from theme definitions.
    pub fn from_themes(themes: Vec<Theme>) -> FolioResult<Self> {
        let mut by_name = BTreeMap::new();
        let mut by_id = BTreeMap::new();
        let mut by_count: BTreeMap<GroupKey, Vec<LayoutId>> = BTreeMap::new();

        for theme in themes {
            validate_theme(&theme)?;
            for (idx, layout) in theme.layouts.iter().enumerate() {
                if by_id
                    .insert(layout.id.clone(), (theme.name.clone(), idx))
                    .is_some()
                {
                    return Err(FolioError::validation(format!(
                        "duplicate layout id '{}'",
                        layout.id
                    )));
                }
                by_count
                    .entry((theme.name.clone(), layout.span, layout.container_count()))
                    .or_default()
                    .push(layout.id.clone());
            }
            let name = theme.name.clone();
            if by_name.insert(name.clone(), theme).is_some() {
                return Err(FolioError::validation(format!(
                    "duplicate theme '{name}'"
                )));
            }
        }

        Ok(Self {
            themes: by_name,
            by_id,
            by_count,
        })
    }

    /// Parse a catalog from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FolioResult<Self> {
        let def: CatalogDef = serde_json::from_reader(r)
            .map_err(|e| FolioError::serde(format!("parse catalog JSON: {e}")))?;
        Self::from_themes(def.themes)
    }

    /// Parse a catalog from a JSON string.
    pub fn from_json_str(s: &str) -> FolioResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a catalog from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FolioResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FolioError::validation(format!("open catalog JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Look up a theme by name.
    pub fn theme(&self, name: &str) -> Option<&Theme> {
        self.themes.get(name)
    }

    /// Look up a layout by id.
    pub fn layout(&self, id: &LayoutId) -> Option<&Layout> {
        let (theme, idx) = self.by_id.get(id)?;
        self.themes.get(theme)?.layouts.get(*idx)
    }

    /// Theme owning `id`.
    pub fn theme_of(&self, id: &LayoutId) -> Option<&Theme> {
        let (theme, _) = self.by_id.get(id)?;
        self.themes.get(theme)
    }

    /// Layouts of `theme`/`span` with exactly `count` placeable containers, in catalog order.
    pub fn layouts_with_count<'a>(
        &'a self,
        theme: &str,
        span: LayoutSpan,
        count: usize,
    ) -> impl Iterator<Item = &'a Layout> + use<'a> {
        self.by_count
            .get(&(theme.to_string(), span, count))
            .into_iter()
            .flatten()
            .filter_map(move |id| self.layout(id))
    }

    /// Other layouts with the same theme, span and container count as `current`.
    pub fn alternatives<'a>(&'a self, current: &'a Layout) -> Vec<&'a Layout> {
        let Some(theme) = self.theme_of(&current.id) else {
            return Vec::new();
        };
        self.layouts_with_count(&theme.name, current.span, current.container_count())
            .filter(|l| l.id != current.id)
            .collect()
    }

    /// A layout like `current` but with `count` containers.
    ///
    /// Prefers the same visual family; falls back to any family of the same span.
    pub fn resized<'a>(&'a self, current: &'a Layout, count: usize) -> Option<&'a Layout> {
        let theme = self.theme_of(&current.id)?;
        if current.container_count() == count {
            return Some(current);
        }
        same_family(self, &theme.name, current.span, current.family, count)
            .or_else(|| self.layouts_with_count(&theme.name, current.span, count).next())
    }
}

fn same_family<'a>(
    catalog: &'a ResourceCatalog,
    theme: &str,
    span: LayoutSpan,
    family: LayoutFamily,
    count: usize,
) -> Option<&'a Layout> {
    catalog
        .layouts_with_count(theme, span, count)
        .find(|l| l.family == family)
}

fn validate_theme(theme: &Theme) -> FolioResult<()> {
    if theme.name.trim().is_empty() {
        return Err(FolioError::validation("theme name must be non-empty"));
    }
    if theme.title.max_len == 0 {
        return Err(FolioError::validation(format!(
            "theme '{}' title max_len must be > 0",
            theme.name
        )));
    }
    for layout in &theme.layouts {
        if layout.id.as_str().trim().is_empty() {
            return Err(FolioError::validation(format!(
                "theme '{}' has a layout with an empty id",
                theme.name
            )));
        }
        for c in &layout.containers {
            let finite = [c.x, c.y, c.width, c.height].iter().all(|v| v.is_finite());
            if !finite || c.width <= 0.0 || c.height <= 0.0 {
                return Err(FolioError::validation(format!(
                    "layout '{}' container {} must have finite position and positive size",
                    layout.id, c.id
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/resources.rs"]
mod tests;
