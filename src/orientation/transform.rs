//! Consumption of the external crop tool's transform record.

use crate::{
    foundation::core::{CropRect, Size},
    foundation::events::Correction,
    orientation::quantize::{Orientation, area_after_transform, quantize},
};

/// Crop in source pixels, relative to the rotated/aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PixelCrop {
    /// Left offset in pixels.
    pub x: f64,
    /// Top offset in pixels.
    pub y: f64,
    /// Width in pixels.
    pub width: f64,
    /// Height in pixels.
    pub height: f64,
}

/// Transform record produced by the image-editing collaborator.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CropTransform {
    /// Crop box in pixels.
    pub crop: PixelCrop,
    /// Rotation in radians.
    pub rotation: f64,
    /// Horizontal mirror.
    #[serde(default)]
    pub flip_x: bool,
    /// Vertical mirror.
    #[serde(default)]
    pub flip_y: bool,
}

/// Orientation, alignment and normalized crop derived from a [`CropTransform`].
#[derive(Clone, Debug, PartialEq)]
pub struct Reoriented {
    /// Discrete orientation tag.
    pub orientation: Orientation,
    /// Residual alignment in degrees.
    pub alignment_deg: f64,
    /// Crop normalized against the transformed bounding box.
    pub crop: CropRect,
    /// Safe defaults substituted along the way.
    pub corrections: Vec<Correction>,
}

/// Convert a pixel-space transform record for a `source`-sized image into image-record terms.
pub fn reorient(record: &CropTransform, source: Size) -> Reoriented {
    let mut corrections = Vec::new();

    let q = quantize(record.rotation, record.flip_x, record.flip_y);
    corrections.extend(q.correction);

    let (area, area_fix) =
        area_after_transform(q.alignment_deg, q.orientation.base_rotation_deg(), source);
    corrections.extend(area_fix);

    let crop = CropRect::new(
        record.crop.x / area.width,
        record.crop.y / area.height,
        record.crop.width / area.width,
        record.crop.height / area.height,
    );
    let crop = if crop.is_valid() {
        crop
    } else {
        corrections.push(Correction::InvalidCrop { image: None });
        CropRect::FULL
    };

    Reoriented {
        orientation: q.orientation,
        alignment_deg: q.alignment_deg,
        crop,
        corrections,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/orientation/transform.rs"]
mod tests;
