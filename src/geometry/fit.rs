//! Cover-fit crop computation.

use crate::{
    document::model::Image,
    foundation::core::{CropRect, positive_ratio},
    foundation::events::Correction,
    orientation::quantize::Orientation,
};

/// Normalized crop that fills a `container_ratio` box with an `image_ratio` source, centered on
/// the limiting dimension.
///
/// Non-finite or non-positive ratios yield [`CropRect::FULL`] plus a correction.
pub fn cover_fit(container_ratio: f64, image_ratio: f64) -> (CropRect, Option<Correction>) {
    let valid = |r: f64| r.is_finite() && r > 0.0;
    if !valid(container_ratio) || !valid(image_ratio) {
        return (
            CropRect::FULL,
            Some(Correction::InvalidRatio {
                image: None,
                container_ratio,
                image_ratio,
            }),
        );
    }

    let crop = if container_ratio > image_ratio {
        let height = image_ratio / container_ratio;
        CropRect::new(0.0, (1.0 - height) / 2.0, 1.0, height)
    } else {
        let width = container_ratio / image_ratio;
        CropRect::new((1.0 - width) / 2.0, 0.0, width, 1.0)
    };

    if crop.is_valid() {
        (crop, None)
    } else {
        (CropRect::FULL, Some(Correction::InvalidCrop { image: None }))
    }
}

/// Aspect ratio of `image` as displayed, with width/height swapped for quarter turns.
pub fn oriented_ratio(image: &Image) -> Option<f64> {
    let size = image.orientation.oriented(image.pixel_size());
    positive_ratio(size.width, size.height)
}

/// Re-crop `image` for a container of `container_ratio`.
///
/// Images the user never rotated are reset to the identity orientation first.
pub fn refit(image: &mut Image, container_ratio: Option<f64>) -> Option<Correction> {
    if !image.rotated {
        image.orientation = Orientation::Identity;
        image.alignment = 0.0;
    }
    let (crop, correction) = cover_fit(
        container_ratio.unwrap_or(f64::NAN),
        oriented_ratio(image).unwrap_or(f64::NAN),
    );
    image.crop = crop;
    correction.map(|c| c.for_image(image.id))
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/fit.rs"]
mod tests;
