// SPDX-License-Identifier: MPL-2.0
//! Restoration model port definition.
//!
//! This module defines the [`RestorationModel`] trait: the learned
//! restoration step treated as an opaque function from a
//! [`ModelInputBundle`] to an ordered list of output tensors.
//!
//! # Design Notes
//!
//! - The bundle validates shapes and finiteness once, at construction
//! - The first output is the restored image; further outputs are ignored
//! - Outputs may be plain arrays or boxed tensor handles; both reduce to an
//!   [`ArrayD<f32>`] through [`ModelOutput::into_array`]

use ndarray::{Array4, ArrayD};
use thiserror::Error;

use crate::error::{Error, Result};

/// Input slot name for the normalized hazy image tensor.
pub const HAZY_IMAGE_SLOT: &str = "hazy_image";

/// Input slot name for the transmission map tensor.
pub const DCP_FEATURES_SLOT: &str = "dcp_features";

// =============================================================================
// ModelError
// =============================================================================

/// Errors that can occur while loading or running a restoration model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// The model has not been loaded.
    #[error("Restoration model is not ready")]
    NotReady,

    /// The model file could not be loaded.
    #[error("Failed to load model: {0}")]
    LoadFailed(String),

    /// Inference failed during processing.
    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    /// The model returned no outputs, or an output could not be extracted.
    #[error("Missing model output: {0}")]
    MissingOutput(String),
}

// =============================================================================
// ModelInputBundle
// =============================================================================

/// The paired channel-first tensors handed to the restoration model.
///
/// - `hazy_image`: `1 × 3 × H × W`, normalized RGB
/// - `dcp_features`: `1 × 1 × H × W`, transmission map
#[derive(Debug, Clone, PartialEq)]
pub struct ModelInputBundle {
    hazy_image: Array4<f32>,
    dcp_features: Array4<f32>,
}

impl ModelInputBundle {
    /// Pairs the two tensors after checking their shapes agree.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shape`] if either tensor has the wrong batch or channel
    /// count, or if their spatial dimensions differ. Returns
    /// [`Error::ArithmeticDegeneracy`] if any sample is NaN or infinite.
    pub fn new(hazy_image: Array4<f32>, dcp_features: Array4<f32>) -> Result<Self> {
        let image_shape = hazy_image.shape();
        let feature_shape = dcp_features.shape();

        if image_shape[0] != 1 || image_shape[1] != 3 {
            return Err(Error::Shape(format!(
                "{HAZY_IMAGE_SLOT} must be 1x3xHxW, got {image_shape:?}"
            )));
        }
        if feature_shape[0] != 1 || feature_shape[1] != 1 {
            return Err(Error::Shape(format!(
                "{DCP_FEATURES_SLOT} must be 1x1xHxW, got {feature_shape:?}"
            )));
        }
        if image_shape[2..] != feature_shape[2..] {
            return Err(Error::Shape(format!(
                "spatial mismatch between {HAZY_IMAGE_SLOT} {image_shape:?} and {DCP_FEATURES_SLOT} {feature_shape:?}"
            )));
        }

        if let Some(slot) = [
            (HAZY_IMAGE_SLOT, &hazy_image),
            (DCP_FEATURES_SLOT, &dcp_features),
        ]
        .into_iter()
        .find_map(|(slot, tensor)| tensor.iter().any(|v| !v.is_finite()).then_some(slot))
        {
            return Err(Error::ArithmeticDegeneracy(format!(
                "non-finite sample in {slot}"
            )));
        }

        Ok(Self {
            hazy_image,
            dcp_features,
        })
    }

    /// Returns the hazy image tensor (`1 × 3 × H × W`).
    #[must_use]
    pub fn hazy_image(&self) -> &Array4<f32> {
        &self.hazy_image
    }

    /// Returns the transmission map tensor (`1 × 1 × H × W`).
    #[must_use]
    pub fn dcp_features(&self) -> &Array4<f32> {
        &self.dcp_features
    }

    /// Returns `(height, width)` shared by both tensors.
    #[must_use]
    pub fn spatial_dims(&self) -> (usize, usize) {
        let shape = self.hazy_image.shape();
        (shape[2], shape[3])
    }
}

// =============================================================================
// ModelOutput
// =============================================================================

/// A tensor handle that can be materialized into a plain array.
pub trait TensorData {
    /// Copies the tensor contents into an owned array.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the data cannot be extracted as `f32`.
    fn to_array(&self) -> std::result::Result<ArrayD<f32>, ModelError>;
}

impl TensorData for ArrayD<f32> {
    fn to_array(&self) -> std::result::Result<ArrayD<f32>, ModelError> {
        Ok(self.clone())
    }
}

/// One output of a restoration model run.
pub enum ModelOutput {
    /// An already-extracted array.
    Array(ArrayD<f32>),
    /// A backend tensor handle that still needs extraction.
    Tensor(Box<dyn TensorData>),
}

impl ModelOutput {
    /// Reduces the output to a plain array.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if a boxed tensor fails to extract.
    pub fn into_array(self) -> std::result::Result<ArrayD<f32>, ModelError> {
        match self {
            ModelOutput::Array(array) => Ok(array),
            ModelOutput::Tensor(tensor) => tensor.to_array(),
        }
    }
}

impl std::fmt::Debug for ModelOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelOutput::Array(array) => f.debug_tuple("Array").field(&array.shape()).finish(),
            ModelOutput::Tensor(_) => f.write_str("Tensor(..)"),
        }
    }
}

impl From<ArrayD<f32>> for ModelOutput {
    fn from(array: ArrayD<f32>) -> Self {
        ModelOutput::Array(array)
    }
}

// =============================================================================
// RestorationModel Trait
// =============================================================================

/// Port for the learned restoration step.
///
/// Implementations are loaded once and reused for every image or frame of
/// a job. Nothing in the pipeline mutates model internals beyond what
/// running inference requires, and no execution device is assumed.
///
/// # Example
///
/// ```ignore
/// use hazelift::application::port::{ModelInputBundle, RestorationModel};
///
/// fn restore_first(model: &mut dyn RestorationModel, bundle: &ModelInputBundle) {
///     let outputs = model.restore(bundle).expect("inference");
///     println!("model returned {} outputs", outputs.len());
/// }
/// ```
pub trait RestorationModel {
    /// Runs the model on `inputs` and returns its outputs in model order.
    ///
    /// # Errors
    ///
    /// Returns a [`ModelError`] if the model is not ready or inference fails.
    fn restore(
        &mut self,
        inputs: &ModelInputBundle,
    ) -> std::result::Result<Vec<ModelOutput>, ModelError>;

    /// Checks if the model is loaded and able to run.
    fn is_ready(&self) -> bool;

    /// Human-readable name for logs.
    fn name(&self) -> &str;
}
