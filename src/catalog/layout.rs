use crate::foundation::core::{LayoutId, Size, positive_ratio};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// What a container is meant to hold.
pub enum ContentFamily {
    /// Photo slot.
    #[default]
    Image,
    /// Free text box. Layout-agnostic: not counted in the container count.
    Text,
    /// Page title box. Layout-agnostic: not counted in the container count.
    Title,
    /// Cover spine region.
    Spine,
}

impl ContentFamily {
    /// `true` for families that count towards [`Layout::container_count`].
    pub fn is_placeable(self) -> bool {
        matches!(self, Self::Image | Self::Spine)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
/// How a container's `x`/`y` relate to its box.
pub enum AnchorMode {
    /// `x`/`y` is the top-left corner.
    #[default]
    TopLeft,
    /// `x`/`y` is the center point.
    Center,
}

/// Visual family of a layout.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LayoutFamily {
    /// Plain grid-like arrangements.
    #[default]
    Regular,
    /// Editorial arrangements with overlapping/asymmetric boxes.
    Magazine,
}

/// Which kind of folder a layout can be applied to.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSpan {
    /// One page of a regular two-page spread.
    #[default]
    Page,
    /// A single panel spanning a whole layflat spread.
    Layflat,
    /// A cover region.
    Cover,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// One placeable region inside a [`Layout`].
///
/// Position and size are fractions of the page box.
pub struct Container {
    /// Container id, unique within its layout.
    pub id: u32,
    /// Horizontal position (see [`Container::anchor`]).
    pub x: f64,
    /// Vertical position (see [`Container::anchor`]).
    pub y: f64,
    /// Width as a fraction of the page width.
    pub width: f64,
    /// Height as a fraction of the page height.
    pub height: f64,
    /// Design aspect ratio, used when the page box itself is degenerate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<f64>,
    /// Content family.
    #[serde(default)]
    pub family: ContentFamily,
    /// Anchor-origin mode for `x`/`y`.
    #[serde(default)]
    pub anchor: AnchorMode,
}

impl Container {
    /// Slot size and pivot (center) in the coordinate space of a page of `page` size.
    pub fn place_in(&self, page: Size) -> (Size, (f64, f64)) {
        let size = Size::new(self.width * page.width, self.height * page.height);
        let (cx, cy) = match self.anchor {
            AnchorMode::Center => (self.x, self.y),
            AnchorMode::TopLeft => (self.x + self.width * 0.5, self.y + self.height * 0.5),
        };
        (size, (cx * page.width, cy * page.height))
    }

    /// Aspect ratio of this container on a page of `page` size.
    pub fn ratio_on(&self, page: Size) -> Option<f64> {
        positive_ratio(self.width * page.width, self.height * page.height)
            .or_else(|| self.ratio.filter(|r| r.is_finite() && *r > 0.0))
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
/// A named, reusable arrangement of containers.
pub struct Layout {
    /// Catalog key.
    pub id: LayoutId,
    /// Visual family.
    #[serde(default)]
    pub family: LayoutFamily,
    /// Kind of folder this layout applies to.
    #[serde(default)]
    pub span: LayoutSpan,
    /// Ordered containers. Placeable containers map, in order, onto a folder's leading children.
    pub containers: Vec<Container>,
}

impl Layout {
    /// Number of placeable (image/spine) containers.
    pub fn container_count(&self) -> usize {
        self.placeable().count()
    }

    /// Placeable containers in slot order.
    pub fn placeable(&self) -> impl Iterator<Item = &Container> {
        self.containers.iter().filter(|c| c.family.is_placeable())
    }

    /// The `index`-th placeable container.
    pub fn placeable_at(&self, index: usize) -> Option<&Container> {
        self.placeable().nth(index)
    }

    /// Suggested box for a page title, when the layout reserves one.
    pub fn title_container(&self) -> Option<&Container> {
        self.containers
            .iter()
            .find(|c| c.family == ContentFamily::Title)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/catalog/layout.rs"]
mod tests;
