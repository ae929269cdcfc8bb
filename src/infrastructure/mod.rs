// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! Concrete implementations of the port traits defined in
//! `application::port`, wrapping `FFmpeg` and ONNX Runtime.
//!
//! - [`ffmpeg`]: video decoding and encoding (implements [`FrameSource`] and [`FrameSink`])
//! - [`onnx`]: model inference (implements [`RestorationModel`])
//!
//! [`FrameSource`]: crate::application::port::FrameSource
//! [`FrameSink`]: crate::application::port::FrameSink
//! [`RestorationModel`]: crate::application::port::RestorationModel

pub mod ffmpeg;
pub mod onnx;

pub use ffmpeg::{FfmpegFrameSink, FfmpegFrameSource};
pub use onnx::OnnxRestorationModel;
