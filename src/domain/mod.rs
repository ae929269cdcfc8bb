// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Core types with ZERO external dependencies.
//!
//! This module contains pure value types shared by the dehazing pipeline.
//! It has no dependencies on external crates (except `std`) so the
//! algorithms and adapters can agree on shapes without pulling in `FFmpeg`
//! or ONNX Runtime types.
//!
//! # Modules
//!
//! - [`dehaze`]: Validated tuning parameters ([`WindowSize`](dehaze::WindowSize),
//!   [`HazeCoefficient`](dehaze::HazeCoefficient), [`BrightestFraction`](dehaze::BrightestFraction))
//! - [`error`]: Domain error types ([`VideoError`](error::VideoError))
//! - [`media`]: Media types ([`FrameSize`](media::FrameSize), [`VideoFrame`](media::VideoFrame),
//!   [`VideoMetadata`](media::VideoMetadata))

pub mod dehaze;
pub mod error;
pub mod media;
