//! Loading images through the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::OwnedImage;
use crate::util::{PlaneMatchError, PlaneMatchResult};
use std::path::Path;

/// Copies a decoded image into an owned grayscale buffer.
pub fn owned_from_dynamic_image(img: &image::DynamicImage) -> PlaneMatchResult<OwnedImage> {
    let gray = img.to_luma8();
    let width = gray.width() as usize;
    let height = gray.height() as usize;
    OwnedImage::new(gray.into_raw(), width, height)
}

/// Loads an image from disk as grayscale, the form detectors expect.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> PlaneMatchResult<OwnedImage> {
    let img = image::open(path).map_err(|err| PlaneMatchError::ImageIo {
        reason: err.to_string(),
    })?;
    owned_from_dynamic_image(&img)
}
