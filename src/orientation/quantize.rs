//! Continuous rotation + flips ⇄ discrete orientation tag + residual alignment.

use std::f64::consts::{PI, TAU};

use crate::foundation::{
    core::Size,
    events::Correction,
    math::wrap_degrees,
};

/// Slack used when re-homing a residual that sits exactly on the −45° boundary.
const BOUNDARY_EPS_DEG: f64 = 1e-9;

/// One of the 8 discrete rotate/mirror states, numbered like EXIF orientation (1..=8).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// 1: as shot.
    #[default]
    Identity,
    /// 2: mirrored left-right.
    FlipHorizontal,
    /// 3: half turn.
    Rotate180,
    /// 4: mirrored top-bottom.
    FlipVertical,
    /// 5: quarter turn plus horizontal mirror.
    Transpose,
    /// 6: quarter turn clockwise.
    Rotate90,
    /// 7: quarter turn plus vertical mirror.
    Transverse,
    /// 8: three quarter turns clockwise.
    Rotate270,
}

/// Lookup table: (quarter turns, flip x, flip y) after normalization.
const TABLE: [(Orientation, u8, bool, bool); 8] = [
    (Orientation::Identity, 0, false, false),
    (Orientation::FlipHorizontal, 0, true, false),
    (Orientation::FlipVertical, 0, false, true),
    (Orientation::Rotate90, 1, false, false),
    (Orientation::Rotate180, 2, false, false),
    (Orientation::Rotate270, 3, false, false),
    (Orientation::Transpose, 1, true, false),
    (Orientation::Transverse, 1, false, true),
];

impl Orientation {
    /// All tags in EXIF order.
    pub const ALL: [Orientation; 8] = [
        Self::Identity,
        Self::FlipHorizontal,
        Self::Rotate180,
        Self::FlipVertical,
        Self::Transpose,
        Self::Rotate90,
        Self::Transverse,
        Self::Rotate270,
    ];

    /// EXIF-style code `1..=8`.
    pub fn code(self) -> u8 {
        match self {
            Self::Identity => 1,
            Self::FlipHorizontal => 2,
            Self::Rotate180 => 3,
            Self::FlipVertical => 4,
            Self::Transpose => 5,
            Self::Rotate90 => 6,
            Self::Transverse => 7,
            Self::Rotate270 => 8,
        }
    }

    /// Inverse of [`Orientation::code`].
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code).checked_sub(1)?).copied()
    }

    fn entry(self) -> (u8, bool, bool) {
        TABLE
            .iter()
            .find(|(o, ..)| *o == self)
            .map(|&(_, t, x, y)| (t, x, y))
            .unwrap_or((0, false, false))
    }

    /// Quarter turns (0..=3) of the base rotation.
    pub fn quarter_turns(self) -> u8 {
        self.entry().0
    }

    /// Base rotation in degrees: 0, 90, 180 or 270.
    pub fn base_rotation_deg(self) -> u16 {
        u16::from(self.quarter_turns()) * 90
    }

    /// `true` when the base rotation swaps width and height.
    pub fn swaps_axes(self) -> bool {
        self.quarter_turns() % 2 == 1
    }

    /// Oriented width/height of a `width × height` source.
    pub fn oriented(self, size: Size) -> Size {
        if self.swaps_axes() { size.swapped() } else { size }
    }
}

impl serde::Serialize for Orientation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> serde::Deserialize<'de> for Orientation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = <u8 as serde::Deserialize>::deserialize(deserializer)?;
        Orientation::from_code(code).ok_or_else(|| {
            serde::de::Error::custom(format!("orientation code {code} not in 1..=8"))
        })
    }
}

/// Continuous transform as produced by the crop tool or consumed by a renderer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Transform {
    /// Rotation in radians.
    pub rotation: f64,
    /// Horizontal mirror.
    #[serde(default)]
    pub flip_x: bool,
    /// Vertical mirror.
    #[serde(default)]
    pub flip_y: bool,
}

/// Result of [`quantize`].
#[derive(Clone, Debug, PartialEq)]
pub struct Quantized {
    /// Discrete orientation.
    pub orientation: Orientation,
    /// Residual alignment in degrees, within `(-45, 45]`.
    pub alignment_deg: f64,
    /// Set when a safe default was substituted.
    pub correction: Option<Correction>,
}

/// Quantize a rotation (radians) and two flips into an orientation tag plus residual angle.
pub fn quantize(rotation: f64, flip_x: bool, flip_y: bool) -> Quantized {
    let mut correction = None;
    let (mut rotation, mut flip_x, mut flip_y) = (rotation, flip_x, flip_y);
    if !rotation.is_finite() {
        correction = Some(Correction::NonFiniteRotation { image: None });
        rotation = 0.0;
    }

    // Both mirrors at once are a half turn.
    if flip_x && flip_y {
        rotation += PI;
        flip_x = false;
        flip_y = false;
    }

    // Reduce in radians first; huge finite angles overflow once converted to degrees.
    let deg = wrap_degrees(rotation.rem_euclid(TAU).to_degrees());
    let mut turns = (deg / 90.0).round();
    let mut residual = deg - turns * 90.0;
    if residual <= -45.0 + BOUNDARY_EPS_DEG {
        residual += 90.0;
        turns -= 1.0;
    }
    let residual = residual.min(45.0);
    let turns = (turns as i64).rem_euclid(4) as u8;

    if turns % 2 == 1 && (flip_x || flip_y) {
        std::mem::swap(&mut flip_x, &mut flip_y);
    }

    let orientation = match lookup(turns, flip_x, flip_y) {
        Some(o) => o,
        None => {
            correction = Some(Correction::UnmappedOrientation {
                image: None,
                quarter_turns: turns,
                flip_x,
                flip_y,
            });
            Orientation::Identity
        }
    };

    Quantized {
        orientation,
        alignment_deg: residual,
        correction,
    }
}

fn lookup(turns: u8, flip_x: bool, flip_y: bool) -> Option<Orientation> {
    TABLE
        .iter()
        .find(|&&(_, t, x, y)| t == turns && x == flip_x && y == flip_y)
        .map(|&(o, ..)| o)
}

/// Exact inverse of [`quantize`] for every tag: tag + alignment → rotation + flips.
pub fn dequantize(orientation: Orientation, alignment_deg: f64) -> Transform {
    let (turns, mut flip_x, mut flip_y) = orientation.entry();
    if turns % 2 == 1 && (flip_x || flip_y) {
        std::mem::swap(&mut flip_x, &mut flip_y);
    }
    let deg = f64::from(turns) * 90.0 + alignment_deg;
    Transform {
        rotation: deg.to_radians(),
        flip_x,
        flip_y,
    }
}

/// Bounding box of a `size` image after its base rotation and fine alignment.
///
/// Non-finite or non-positive results fall back to `size` with a correction.
pub fn area_after_transform(
    alignment_deg: f64,
    base_rotation_deg: u16,
    size: Size,
) -> (Size, Option<Correction>) {
    let base = if base_rotation_deg % 180 == 90 {
        size.swapped()
    } else {
        size
    };
    let area = if alignment_deg != 0.0 {
        let s = alignment_deg.abs().to_radians().sin();
        Size::new(base.width + base.height * s, base.height + base.width * s)
    } else {
        base
    };
    if area.is_valid() {
        (area, None)
    } else {
        (size, Some(Correction::InvalidArea { image: None }))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orientation/quantize.rs"]
mod tests;
