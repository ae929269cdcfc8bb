// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters implement.
//!
//! # Available Ports
//!
//! - [`model`]: The restoration model capability (tensor bundle in, tensors out)
//! - [`video`]: Frame-by-frame video reading and writing
//!
//! # Design Notes
//!
//! - No `FFmpeg` or ONNX Runtime types cross these traits
//! - Methods take `&mut self`: adapters are reused sequentially, never shared
//!   concurrently, so callers serialize access through the borrow checker
//! - No `async fn`: every call blocks until the work is done

pub mod model;
pub mod video;

// Re-export main types for convenience
pub use model::{
    ModelError, ModelInputBundle, ModelOutput, RestorationModel, TensorData, DCP_FEATURES_SLOT,
    HAZY_IMAGE_SLOT,
};
pub use video::{FrameSink, FrameSource, StreamSpec};
