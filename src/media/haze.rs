// SPDX-License-Identifier: MPL-2.0
//! Dark Channel Prior feature extraction.
//!
//! This module provides the three haze estimates handed to the restoration
//! model:
//! - [`dark_channel`]: per-pixel channel minimum, eroded by a square window
//! - [`atmospheric_light`]: mean color of the brightest dark-channel pixels
//! - [`transmission_estimate`]: `1 − ω · dark(I / A)`
//!
//! Inputs are never mutated; each stage returns a fresh array.

use crate::domain::dehaze::{AtmosphericEpsilon, BrightestFraction, HazeCoefficient, WindowSize};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};

/// Estimated airlight color, one component per RGB channel.
pub type AtmosphericLight = [f32; 3];

/// Feature maps derived from one normalized image.
#[derive(Debug, Clone, PartialEq)]
pub struct HazeFeatures {
    /// Eroded per-pixel channel minimum, `H × W`.
    pub dark_channel: Array2<f32>,
    /// Estimated airlight color.
    pub atmospheric_light: AtmosphericLight,
    /// Estimated transmission, `H × W`, within `[1 − ω, 1]`.
    pub transmission: Array2<f32>,
}

/// Parameters for [`extract_features`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HazeParams {
    pub window: WindowSize,
    pub omega: HazeCoefficient,
    pub brightest: BrightestFraction,
    pub epsilon: AtmosphericEpsilon,
}

/// Runs the full extractor: dark channel, atmospheric light, transmission.
pub fn extract_features(image: ArrayView3<'_, f32>, params: &HazeParams) -> HazeFeatures {
    let dark = dark_channel(image, params.window);
    let light = atmospheric_light(image, dark.view(), params.brightest);
    let transmission =
        transmission_estimate(image, light, params.omega, params.window, params.epsilon);

    log::debug!(
        "haze features: {}x{} window={} A=[{:.4}, {:.4}, {:.4}]",
        dark.ncols(),
        dark.nrows(),
        params.window.value(),
        light[0],
        light[1],
        light[2]
    );

    HazeFeatures {
        dark_channel: dark,
        atmospheric_light: light,
        transmission,
    }
}

/// Computes the dark channel of an `H × W × C` image.
///
/// Takes the minimum across channels at each pixel, then erodes with a
/// `window × window` square. Pixels outside the image are ignored, so border
/// windows are simply smaller.
pub fn dark_channel(image: ArrayView3<'_, f32>, window: WindowSize) -> Array2<f32> {
    let channel_min = image.map_axis(Axis(2), |pixel| {
        pixel.iter().copied().fold(f32::INFINITY, f32::min)
    });
    erode(channel_min.view(), window.radius())
}

/// Square-element erosion, done as a row pass followed by a column pass.
fn erode(map: ArrayView2<'_, f32>, radius: usize) -> Array2<f32> {
    if radius == 0 {
        return map.to_owned();
    }
    let rows = min_filter_lanes(map, Axis(1), radius);
    min_filter_lanes(rows.view(), Axis(0), radius)
}

fn min_filter_lanes(map: ArrayView2<'_, f32>, axis: Axis, radius: usize) -> Array2<f32> {
    let mut out = Array2::<f32>::zeros(map.raw_dim());
    Zip::from(out.lanes_mut(axis))
        .and(map.lanes(axis))
        .for_each(|mut dst, src| {
            let len = src.len();
            for i in 0..len {
                let start = i.saturating_sub(radius);
                let end = (i + radius).min(len - 1);
                let mut min = f32::INFINITY;
                for j in start..=end {
                    min = min.min(src[j]);
                }
                dst[i] = min;
            }
        });
    out
}

/// Estimates atmospheric light as the mean color of the pixels with the
/// highest dark-channel values.
///
/// At least one pixel is always selected. An all-zero dark channel still
/// produces an estimate (the mean of whichever pixels tie at zero).
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn atmospheric_light(
    image: ArrayView3<'_, f32>,
    dark: ArrayView2<'_, f32>,
    brightest: BrightestFraction,
) -> AtmosphericLight {
    let (height, width, _) = image.dim();
    let total = height * width;
    if total == 0 {
        return [0.0; 3];
    }

    let values: Vec<f32> = dark.iter().copied().collect();
    let count = brightest.pixel_count(total);
    let mut indices: Vec<usize> = (0..total).collect();
    if count < total {
        indices.select_nth_unstable_by(count - 1, |&a, &b| values[b].total_cmp(&values[a]));
        indices.truncate(count);
    }

    let mut sum = [0.0_f64; 3];
    for index in indices {
        let pixel = image.slice(ndarray::s![index / width, index % width, ..]);
        for (acc, &v) in sum.iter_mut().zip(pixel.iter()) {
            *acc += f64::from(v);
        }
    }

    let n = count as f64;
    [
        (sum[0] / n) as f32,
        (sum[1] / n) as f32,
        (sum[2] / n) as f32,
    ]
}

/// Estimates the transmission map `1 − ω · dark(I / A)`.
///
/// Each atmospheric light component is raised to `epsilon` before dividing,
/// so near-black estimates never produce NaN or infinity. The dark channel of
/// the normalized image is capped at 1, keeping the result in `[1 − ω, 1]`.
pub fn transmission_estimate(
    image: ArrayView3<'_, f32>,
    light: AtmosphericLight,
    omega: HazeCoefficient,
    window: WindowSize,
    epsilon: AtmosphericEpsilon,
) -> Array2<f32> {
    let divisor = light.map(|component| epsilon.apply(component));
    let normalized = normalize_by_light(image, divisor);
    let omega = omega.value();
    dark_channel(normalized.view(), window).mapv(|d| 1.0 - omega * d.clamp(0.0, 1.0))
}

fn normalize_by_light(image: ArrayView3<'_, f32>, divisor: AtmosphericLight) -> Array3<f32> {
    let mut normalized = image.to_owned();
    for mut pixel in normalized.lanes_mut(Axis(2)) {
        for (v, d) in pixel.iter_mut().zip(divisor) {
            *v /= d;
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{assert_abs_diff_eq, F32_EPSILON};

    fn pseudo_random_image(height: usize, width: usize, seed: u32) -> Array3<f32> {
        let mut state = seed;
        Array3::from_shape_fn((height, width, 3), |_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            #[allow(clippy::cast_precision_loss)]
            let v = (state >> 8) as f32 / (1u32 << 24) as f32;
            v
        })
    }

    #[test]
    fn dark_channel_keeps_shape_and_range() {
        let image = pseudo_random_image(31, 17, 7);
        let dark = dark_channel(image.view(), WindowSize::default());
        assert_eq!(dark.dim(), (31, 17));
        assert!(dark.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn dark_channel_window_one_is_channel_minimum() {
        let mut image = Array3::<f32>::zeros((1, 2, 3));
        image.slice_mut(ndarray::s![0, 0, ..]).assign(&ndarray::arr1(&[0.9, 0.3, 0.6]));
        image.slice_mut(ndarray::s![0, 1, ..]).assign(&ndarray::arr1(&[0.2, 0.8, 0.7]));
        let dark = dark_channel(image.view(), WindowSize::new(1));
        assert_abs_diff_eq!(dark[[0, 0]], 0.3);
        assert_abs_diff_eq!(dark[[0, 1]], 0.2);
    }

    #[test]
    fn dark_channel_erosion_spreads_minimum_within_radius() {
        let mut image = Array3::from_elem((9, 9, 3), 0.8_f32);
        image[[4, 4, 1]] = 0.1;
        let dark = dark_channel(image.view(), WindowSize::new(3));

        for y in 0..9 {
            for x in 0..9 {
                let inside = (3..=5).contains(&y) && (3..=5).contains(&x);
                let expected = if inside { 0.1 } else { 0.8 };
                assert_abs_diff_eq!(dark[[y, x]], expected);
            }
        }
    }

    #[test]
    fn dark_channel_matches_brute_force_erosion() {
        let image = pseudo_random_image(12, 10, 3);
        let window = WindowSize::new(5);
        let dark = dark_channel(image.view(), window);
        let r = window.radius();

        for y in 0..12_usize {
            for x in 0..10_usize {
                let mut expected = f32::INFINITY;
                for yy in y.saturating_sub(r)..=(y + r).min(11) {
                    for xx in x.saturating_sub(r)..=(x + r).min(9) {
                        for c in 0..3 {
                            expected = expected.min(image[[yy, xx, c]]);
                        }
                    }
                }
                assert_abs_diff_eq!(dark[[y, x]], expected);
            }
        }
    }

    #[test]
    fn atmospheric_light_of_uniform_gray_is_exact() {
        let image = Array3::from_elem((64, 48, 3), 0.37_f32);
        let dark = dark_channel(image.view(), WindowSize::default());
        let light = atmospheric_light(image.view(), dark.view(), BrightestFraction::default());
        assert_eq!(light, [0.37, 0.37, 0.37]);
    }

    #[test]
    fn atmospheric_light_uses_brightest_dark_pixels() {
        // 100x100 -> 0.1% is 10 pixels; make exactly ten hazy pixels.
        let mut image = Array3::from_elem((100, 100, 3), 0.1_f32);
        for i in 0..10 {
            image.slice_mut(ndarray::s![i * 7, 3, ..]).assign(&ndarray::arr1(&[0.9, 0.8, 0.7]));
        }
        let dark = dark_channel(image.view(), WindowSize::new(1));
        let light = atmospheric_light(image.view(), dark.view(), BrightestFraction::default());
        assert_abs_diff_eq!(light[0], 0.9, epsilon = F32_EPSILON);
        assert_abs_diff_eq!(light[1], 0.8, epsilon = F32_EPSILON);
        assert_abs_diff_eq!(light[2], 0.7, epsilon = F32_EPSILON);
    }

    #[test]
    fn atmospheric_light_selects_one_pixel_for_tiny_images() {
        let mut image = Array3::from_elem((3, 3, 3), 0.2_f32);
        image.slice_mut(ndarray::s![1, 2, ..]).assign(&ndarray::arr1(&[0.6, 0.5, 0.4]));
        let dark = dark_channel(image.view(), WindowSize::new(1));
        let light = atmospheric_light(image.view(), dark.view(), BrightestFraction::default());
        assert_eq!(light, [0.6, 0.5, 0.4]);
    }

    #[test]
    fn atmospheric_light_of_black_image_is_zero_not_failure() {
        let image = Array3::<f32>::zeros((20, 20, 3));
        let dark = dark_channel(image.view(), WindowSize::default());
        let light = atmospheric_light(image.view(), dark.view(), BrightestFraction::default());
        assert_eq!(light, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn transmission_stays_within_bounds() {
        let image = pseudo_random_image(40, 40, 11);
        let omega = HazeCoefficient::default();
        let params = HazeParams::default();
        let features = extract_features(image.view(), &params);
        let lower = 1.0 - omega.value();
        assert!(features
            .transmission
            .iter()
            .all(|&t| t >= lower - F32_EPSILON && t <= 1.0 + F32_EPSILON));
    }

    #[test]
    fn transmission_of_black_frame_is_finite() {
        let image = Array3::<f32>::zeros((16, 16, 3));
        let features = extract_features(image.view(), &HazeParams::default());
        assert_eq!(features.atmospheric_light, [0.0; 3]);
        assert!(features.transmission.iter().all(|t| t.is_finite()));
        // 0 / epsilon == 0, so nothing is hazy.
        assert!(features.transmission.iter().all(|&t| (t - 1.0).abs() < F32_EPSILON));
    }

    #[test]
    fn transmission_of_white_image_is_one_minus_omega() {
        let image = Array3::from_elem((10, 10, 3), 1.0_f32);
        let features = extract_features(image.view(), &HazeParams::default());
        assert_eq!(features.atmospheric_light, [1.0, 1.0, 1.0]);
        for &t in &features.transmission {
            assert_abs_diff_eq!(t, 0.05, epsilon = 1e-6);
        }
    }

    #[test]
    fn extractor_does_not_mutate_input() {
        let image = pseudo_random_image(8, 8, 5);
        let copy = image.clone();
        let _ = extract_features(image.view(), &HazeParams::default());
        assert_eq!(image, copy);
    }
}
