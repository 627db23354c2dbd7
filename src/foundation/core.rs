use std::fmt;

use crate::foundation::error::{FolioError, FolioResult};
use crate::foundation::math::approx_eq;

pub use kurbo::Point;

/// Folder id, unique within its subtree. `0` is the empty-slot sentinel.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct FolderId(pub u32);

impl FolderId {
    /// Sentinel meaning "slot present, no content bound".
    pub const EMPTY: FolderId = FolderId(0);

    /// `true` for the empty sentinel.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "folder#{}", self.0)
    }
}

/// Image record id. Allocated from the same subtree counter as folder ids.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ImageId(pub u32);

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "image#{}", self.0)
    }
}

/// Catalog key of a layout resource.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LayoutId(pub String);

impl LayoutId {
    /// Build a layout id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which half of an album an edit targets.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Inner pages, grouped into spreads.
    #[default]
    Book,
    /// Cover regions (front, spine, back).
    Cover,
}

/// Width/height pair in document units.
///
/// Persisted as the string `"width,height"`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Size {
    /// Size of `width × height`.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// `width / height`, or `None` when either side is non-finite or non-positive.
    pub fn ratio(self) -> Option<f64> {
        positive_ratio(self.width, self.height)
    }

    /// Width and height exchanged.
    pub fn swapped(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// Both sides finite and positive.
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// Parse the wire form `"width,height"`.
    pub fn parse_wire(s: &str) -> FolioResult<Self> {
        let (w, h) = s
            .split_once(',')
            .ok_or_else(|| FolioError::serde(format!("size '{s}' must be 'width,height'")))?;
        let width = w
            .trim()
            .parse::<f64>()
            .map_err(|e| FolioError::serde(format!("size '{s}' width: {e}")))?;
        let height = h
            .trim()
            .parse::<f64>()
            .map_err(|e| FolioError::serde(format!("size '{s}' height: {e}")))?;
        Ok(Self { width, height })
    }

    /// Wire form `"width,height"`.
    pub fn to_wire(self) -> String {
        format!("{},{}", self.width, self.height)
    }
}

impl serde::Serialize for Size {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> serde::Deserialize<'de> for Size {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Size::parse_wire(&s).map_err(serde::de::Error::custom)
    }
}

/// `a / b` when both are finite and strictly positive.
pub fn positive_ratio(a: f64, b: f64) -> Option<f64> {
    if !(a.is_finite() && b.is_finite()) || a <= 0.0 || b <= 0.0 {
        return None;
    }
    let r = a / b;
    (r.is_finite() && r > 0.0).then_some(r)
}

/// Normalized crop rectangle, origin top-left, components in `(0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CropRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl CropRect {
    /// The whole frame.
    pub const FULL: CropRect = CropRect {
        x: 0.0,
        y: 0.0,
        width: 1.0,
        height: 1.0,
    };

    /// Crop from its four components; no validation.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Finite components, `x, y >= 0`, `width, height > 0`.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.x >= 0.0
            && self.y >= 0.0
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Component-wise comparison within `eps`.
    pub fn approx_eq(&self, other: &CropRect, eps: f64) -> bool {
        approx_eq(self.x, other.x, eps)
            && approx_eq(self.y, other.y, eps)
            && approx_eq(self.width, other.width, eps)
            && approx_eq(self.height, other.height, eps)
    }
}

impl Default for CropRect {
    fn default() -> Self {
        Self::FULL
    }
}

/// A child rectangle expressed as fractions of its parent's box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SlotRect {
    /// Left edge.
    pub left: f64,
    /// Top edge.
    pub top: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}
