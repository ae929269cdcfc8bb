// SPDX-License-Identifier: MPL-2.0
//! Single-image dehazing pipeline.
//!
//! The restoration model runs at a fixed working resolution. [`Dehazer`]
//! borrows the model for the duration of a job, so one loaded model can be
//! reused across any number of sequential jobs.
//!
//! # Pipeline
//!
//! 1. Estimate dark channel, atmospheric light and transmission
//! 2. Pack the image and transmission map into a [`ModelInputBundle`]
//! 3. Run the model and unpack its first output
//! 4. Resize back to the caller's original size

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ndarray::Array3;

use crate::application::port::{ModelError, ModelInputBundle, RestorationModel};
use crate::config::{DehazeConfig, MAX_WORKING_DIMENSION};
use crate::domain::dehaze::{AtmosphericEpsilon, BrightestFraction, HazeCoefficient, WindowSize};
use crate::domain::media::FrameSize;
use crate::error::{Error, Result};
use crate::media::haze::{extract_features, HazeParams};
use crate::media::image_transform::{decode_rgb, normalize, resize, resize_rgb8, to_byte_image};
use crate::media::tensor::{from_model_tensor, to_model_tensor};

/// Validated pipeline parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DehazeParams {
    /// Resolution the model runs at.
    pub working_size: FrameSize,
    /// Dark Channel Prior parameters.
    pub haze: HazeParams,
}

impl Default for DehazeParams {
    fn default() -> Self {
        Self::from_config(&DehazeConfig::default())
    }
}

impl DehazeParams {
    /// Builds parameters from configuration, clamping every value into range.
    #[must_use]
    pub fn from_config(config: &DehazeConfig) -> Self {
        Self {
            working_size: FrameSize::new(
                config.working_width.clamp(1, MAX_WORKING_DIMENSION),
                config.working_height.clamp(1, MAX_WORKING_DIMENSION),
            ),
            haze: HazeParams {
                window: WindowSize::new(config.window_size),
                omega: HazeCoefficient::new(config.omega),
                brightest: BrightestFraction::new(config.brightest_fraction),
                epsilon: AtmosphericEpsilon::new(config.atmospheric_epsilon),
            },
        }
    }
}

/// Outcome of a single-image job.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageReport {
    pub input: PathBuf,
    pub output: PathBuf,
    /// Dimensions of both the input and the output.
    pub size: FrameSize,
    pub elapsed: Duration,
}

/// Runs the dehazing pipeline with a borrowed restoration model.
pub struct Dehazer<'m, M: RestorationModel + ?Sized> {
    model: &'m mut M,
    params: DehazeParams,
}

impl<'m, M: RestorationModel + ?Sized> Dehazer<'m, M> {
    pub fn new(model: &'m mut M, params: DehazeParams) -> Self {
        Self { model, params }
    }

    #[must_use]
    pub fn params(&self) -> &DehazeParams {
        &self.params
    }

    /// Builds the model input for an image already at working resolution.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] if `image` is not `H × W × 3` and
    /// [`Error::ArithmeticDegeneracy`] if it holds non-finite samples.
    pub fn preprocess(&self, image: &Array3<f32>) -> Result<ModelInputBundle> {
        if image.dim().2 != 3 {
            return Err(Error::Shape(format!(
                "expected an HxWx3 image, got {:?}",
                image.shape()
            )));
        }
        let features = extract_features(image.view(), &self.params.haze);
        let hazy = to_model_tensor(image.view().into_dyn())?;
        let transmission = to_model_tensor(features.transmission.view().into_dyn())?;
        ModelInputBundle::new(hazy, transmission)
    }

    /// Dehazes a normalized image at working resolution and returns it at
    /// `original` size with samples in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// - [`Error::Model`] if the model is not ready, fails, or returns nothing
    /// - [`Error::Shape`] if the input or the model output is malformed
    pub fn dehaze_image(&mut self, image: &Array3<f32>, original: FrameSize) -> Result<Array3<f32>> {
        if !self.model.is_ready() {
            return Err(ModelError::NotReady.into());
        }

        let started = Instant::now();
        let bundle = self.preprocess(image)?;
        let features_at = started.elapsed();

        let outputs = self.model.restore(&bundle)?;
        let first = outputs.into_iter().next().ok_or_else(|| {
            ModelError::MissingOutput(format!("{} returned no outputs", self.model.name()))
        })?;
        let restored = from_model_tensor(first)?;

        // Lanczos overshoots at edges.
        let mut result = resize(&restored, original)?;
        result.mapv_inplace(|v| v.clamp(0.0, 1.0));

        log::debug!(
            "dehaze {original}: features {features_at:?}, total {:?}",
            started.elapsed()
        );
        Ok(result)
    }

    /// Dehazes the image at `input` and writes the result to `output`.
    ///
    /// The output format follows the extension of `output`. Parent
    /// directories are created as needed. Nothing is written on failure.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] for an unreadable input, [`Error::Io`] if the
    /// result cannot be written, and any error of [`dehaze_image`](Self::dehaze_image).
    pub fn dehaze_image_file(&mut self, input: &Path, output: &Path) -> Result<ImageReport> {
        let started = Instant::now();

        let rgb = decode_rgb(input)?;
        let size = FrameSize::new(rgb.width(), rgb.height());
        let working = normalize(&resize_rgb8(&rgb, self.params.working_size));
        let dehazed = self.dehaze_image(&working, size)?;
        let bytes = to_byte_image(&dehazed)?;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        bytes.save(output)?;

        let elapsed = started.elapsed();
        log::info!(
            "dehazed {} -> {} ({size}) in {:.2}s",
            input.display(),
            output.display(),
            elapsed.as_secs_f64()
        );

        Ok(ImageReport {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            size,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port::ModelOutput;
    use crate::test_utils::assert_abs_diff_eq;
    use image_rs::{Rgb, RgbImage};
    use ndarray::{ArrayD, Axis};

    /// Returns the hazy image unchanged, recording what it saw.
    #[derive(Default)]
    struct EchoModel {
        calls: usize,
        last_dims: Option<(usize, usize)>,
    }

    impl RestorationModel for EchoModel {
        fn restore(
            &mut self,
            inputs: &ModelInputBundle,
        ) -> std::result::Result<Vec<ModelOutput>, ModelError> {
            self.calls += 1;
            self.last_dims = Some(inputs.spatial_dims());
            Ok(vec![inputs.hazy_image().clone().into_dyn().into()])
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    struct SilentModel;

    impl RestorationModel for SilentModel {
        fn restore(
            &mut self,
            _inputs: &ModelInputBundle,
        ) -> std::result::Result<Vec<ModelOutput>, ModelError> {
            Ok(Vec::new())
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "silent"
        }
    }

    struct UnloadedModel;

    impl RestorationModel for UnloadedModel {
        fn restore(
            &mut self,
            _inputs: &ModelInputBundle,
        ) -> std::result::Result<Vec<ModelOutput>, ModelError> {
            Err(ModelError::NotReady)
        }

        fn is_ready(&self) -> bool {
            false
        }

        fn name(&self) -> &str {
            "unloaded"
        }
    }

    /// Emits values far outside `[0, 1]`.
    struct OvershootModel;

    impl RestorationModel for OvershootModel {
        fn restore(
            &mut self,
            inputs: &ModelInputBundle,
        ) -> std::result::Result<Vec<ModelOutput>, ModelError> {
            let (h, w) = inputs.spatial_dims();
            let mut out = ArrayD::from_elem(ndarray::IxDyn(&[1, 3, h, w]), 4.0_f32);
            out.index_axis_mut(Axis(1), 1).fill(-2.0);
            Ok(vec![out.into()])
        }

        fn is_ready(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "overshoot"
        }
    }

    fn small_params() -> DehazeParams {
        DehazeParams {
            working_size: FrameSize::new(32, 32),
            ..DehazeParams::default()
        }
    }

    #[test]
    fn params_from_default_config_match_fixed_contract() {
        let params = DehazeParams::default();
        assert_eq!(params.working_size, FrameSize::new(512, 512));
        assert_eq!(params.haze.window.value(), 15);
        assert_abs_diff_eq!(params.haze.omega.value(), 0.95);
        assert_abs_diff_eq!(params.haze.brightest.value(), 0.001);
    }

    #[test]
    fn params_from_config_clamp_out_of_range_values() {
        let config = DehazeConfig {
            working_width: 0,
            working_height: 100_000,
            window_size: 8,
            omega: 3.0,
            ..DehazeConfig::default()
        };
        let params = DehazeParams::from_config(&config);
        assert_eq!(params.working_size, FrameSize::new(1, MAX_WORKING_DIMENSION));
        assert_eq!(params.haze.window.value(), 9);
        assert_abs_diff_eq!(params.haze.omega.value(), 1.0);
    }

    #[test]
    fn preprocess_packs_image_and_transmission() {
        let mut model = EchoModel::default();
        let dehazer = Dehazer::new(&mut model, small_params());
        let image = Array3::from_elem((32, 32, 3), 0.5_f32);
        let bundle = dehazer.preprocess(&image).unwrap();
        assert_eq!(bundle.hazy_image().shape(), &[1, 3, 32, 32]);
        assert_eq!(bundle.dcp_features().shape(), &[1, 1, 32, 32]);
    }

    #[test]
    fn preprocess_rejects_non_rgb_input() {
        let mut model = EchoModel::default();
        let dehazer = Dehazer::new(&mut model, small_params());
        let image = Array3::from_elem((8, 8, 4), 0.5_f32);
        assert!(matches!(dehazer.preprocess(&image), Err(Error::Shape(_))));
    }

    #[test]
    fn white_image_returns_original_size_without_degeneracy() {
        let mut model = EchoModel::default();
        let mut dehazer = Dehazer::new(&mut model, small_params());
        let working = Array3::from_elem((32, 32, 3), 1.0_f32);

        let result = dehazer
            .dehaze_image(&working, FrameSize::new(100, 100))
            .unwrap();
        assert_eq!(result.dim(), (100, 100, 3));
        assert!(result.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn black_image_is_dehazed_without_nan() {
        let mut model = EchoModel::default();
        let mut dehazer = Dehazer::new(&mut model, small_params());
        let working = Array3::<f32>::zeros((32, 32, 3));

        let result = dehazer.dehaze_image(&working, FrameSize::new(20, 10)).unwrap();
        assert_eq!(result.dim(), (10, 20, 3));
        assert!(result.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn output_size_always_matches_original() {
        let mut model = EchoModel::default();
        let mut dehazer = Dehazer::new(&mut model, small_params());
        let working = Array3::from_elem((32, 32, 3), 0.3_f32);

        for size in [FrameSize::new(1, 1), FrameSize::new(640, 360), FrameSize::new(33, 7)] {
            let result = dehazer.dehaze_image(&working, size).unwrap();
            assert_eq!(
                (result.dim().1, result.dim().0),
                (size.width as usize, size.height as usize)
            );
        }
        assert_eq!(model.calls, 3);
        assert_eq!(model.last_dims, Some((32, 32)));
    }

    #[test]
    fn model_output_is_clamped() {
        let mut model = OvershootModel;
        let mut dehazer = Dehazer::new(&mut model, small_params());
        let working = Array3::from_elem((32, 32, 3), 0.5_f32);

        let result = dehazer.dehaze_image(&working, FrameSize::new(16, 16)).unwrap();
        assert!(result.index_axis(Axis(2), 0).iter().all(|&v| v == 1.0));
        assert!(result.index_axis(Axis(2), 1).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn empty_model_output_is_missing_output_error() {
        let mut model = SilentModel;
        let mut dehazer = Dehazer::new(&mut model, small_params());
        let working = Array3::from_elem((32, 32, 3), 0.5_f32);
        let result = dehazer.dehaze_image(&working, FrameSize::new(32, 32));
        assert!(matches!(
            result,
            Err(Error::Model(ModelError::MissingOutput(_)))
        ));
    }

    #[test]
    fn unready_model_is_rejected_before_inference() {
        let mut model = UnloadedModel;
        let mut dehazer = Dehazer::new(&mut model, small_params());
        let working = Array3::from_elem((32, 32, 3), 0.5_f32);
        let result = dehazer.dehaze_image(&working, FrameSize::new(32, 32));
        assert!(matches!(result, Err(Error::Model(ModelError::NotReady))));
    }

    #[test]
    fn dehaze_image_file_writes_output_at_input_size() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("image.jpg");
        let output = dir.path().join("out").join("dehazed_image.png");
        RgbImage::from_pixel(48, 20, Rgb([180, 190, 200]))
            .save(&input)
            .unwrap();

        let mut model = EchoModel::default();
        let mut dehazer = Dehazer::new(&mut model, small_params());
        let report = dehazer.dehaze_image_file(&input, &output).unwrap();

        assert_eq!(report.size, FrameSize::new(48, 20));
        assert_eq!(report.output, output);
        let written = image_rs::open(&output).unwrap();
        assert_eq!((written.width(), written.height()), (48, 20));
    }

    #[test]
    fn dehaze_image_file_rejects_garbage_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("image.jpg");
        let output = dir.path().join("dehazed_image.png");
        std::fs::write(&input, b"\xff\xd8 truncated").unwrap();

        let mut model = EchoModel::default();
        let mut dehazer = Dehazer::new(&mut model, small_params());
        let result = dehazer.dehaze_image_file(&input, &output);

        assert!(matches!(result, Err(Error::Decode(_))));
        assert!(!output.exists());
        assert_eq!(model.calls, 0);
    }
}
