// SPDX-License-Identifier: MPL-2.0
//! ONNX Runtime adapter implementing the [`RestorationModel`] port trait.
//!
//! [`RestorationModel`]: crate::application::port::RestorationModel

mod restoration;

pub use restoration::OnnxRestorationModel;
