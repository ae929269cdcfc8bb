// SPDX-License-Identifier: MPL-2.0
//! Color and geometry helpers shared by the image and video pipelines.
//!
//! Normalized images are `H × W × 3` [`Array3<f32>`] in RGB order with samples
//! in `[0, 1]`. Every resize, in either direction and for both byte and float
//! images, goes through the same Lanczos3 filter.

use crate::domain::media::FrameSize;
use crate::error::{Error, Result};
use image_rs::{imageops::FilterType, Rgb32FImage, RgbImage};
use ndarray::Array3;
use std::path::Path;

/// Resampling filter for every resize in the pipeline.
pub const RESIZE_FILTER: FilterType = FilterType::Lanczos3;

/// Decodes an image file to 8-bit RGB.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the file cannot be opened or is not a valid image.
pub fn decode_rgb(path: &Path) -> Result<RgbImage> {
    let image = image_rs::open(path)
        .map_err(|e| Error::Decode(format!("{}: {e}", path.display())))?;
    Ok(image.to_rgb8())
}

/// Decodes an image file, resizes it to `target`, and scales samples to `[0, 1]`.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the file cannot be opened or is not a valid image.
pub fn load_normalized_image(path: &Path, target: FrameSize) -> Result<Array3<f32>> {
    let rgb = decode_rgb(path)?;
    Ok(normalize(&resize_rgb8(&rgb, target)))
}

/// Resizes an 8-bit RGB image with [`RESIZE_FILTER`].
pub fn resize_rgb8(image: &RgbImage, target: FrameSize) -> RgbImage {
    let width = target.width.max(1);
    let height = target.height.max(1);
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    image_rs::imageops::resize(image, width, height, RESIZE_FILTER)
}

/// Resizes a normalized image with [`RESIZE_FILTER`].
///
/// # Errors
///
/// Returns [`Error::Shape`] if `image` does not have exactly 3 channels.
pub fn resize(image: &Array3<f32>, target: FrameSize) -> Result<Array3<f32>> {
    let width = target.width.max(1);
    let height = target.height.max(1);
    let (src_height, src_width, channels) = image.dim();
    if channels != 3 {
        return Err(Error::Shape(format!(
            "expected 3 channels for resize, got {channels}"
        )));
    }
    if (src_width, src_height) == (width as usize, height as usize) {
        return Ok(image.clone());
    }

    let buffer = to_float_buffer(image)?;
    let resized = image_rs::imageops::resize(&buffer, width, height, RESIZE_FILTER);
    Ok(Array3::from_shape_vec(
        (height as usize, width as usize, 3),
        resized.into_raw(),
    )?)
}

/// Scales 8-bit samples to `[0, 1]`.
pub fn normalize(image: &RgbImage) -> Array3<f32> {
    let (width, height) = image.dimensions();
    let samples = image.as_raw().iter().map(|&v| f32::from(v) / 255.0).collect();
    // Safe: an RgbImage always holds width * height * 3 samples.
    Array3::from_shape_vec((height as usize, width as usize, 3), samples)
        .unwrap_or_else(|_| Array3::zeros((height as usize, width as usize, 3)))
}

/// Scales `[0, 1]` samples to 8-bit, clamping before rounding.
///
/// # Errors
///
/// Returns [`Error::Shape`] if `image` does not have exactly 3 channels.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn to_byte_image(image: &Array3<f32>) -> Result<RgbImage> {
    let (height, width, channels) = image.dim();
    if channels != 3 {
        return Err(Error::Shape(format!(
            "expected 3 channels for byte conversion, got {channels}"
        )));
    }
    let bytes: Vec<u8> = image
        .iter()
        .map(|&v| {
            let v = if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
            (v * 255.0).round() as u8
        })
        .collect();
    let (width, height) = to_dimensions(width, height)?;
    RgbImage::from_raw(width, height, bytes)
        .ok_or_else(|| Error::Shape(format!("cannot build {width}x{height} RGB image")))
}

fn to_float_buffer(image: &Array3<f32>) -> Result<Rgb32FImage> {
    let (height, width, _) = image.dim();
    let (width, height) = to_dimensions(width, height)?;
    Rgb32FImage::from_raw(width, height, image.iter().copied().collect())
        .ok_or_else(|| Error::Shape(format!("cannot build {width}x{height} float image")))
}

fn to_dimensions(width: usize, height: usize) -> Result<(u32, u32)> {
    let width = u32::try_from(width).map_err(|_| Error::Shape(format!("width {width} too large")))?;
    let height =
        u32::try_from(height).map_err(|_| Error::Shape(format!("height {height} too large")))?;
    Ok((width, height))
}
