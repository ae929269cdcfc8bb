// SPDX-License-Identifier: MPL-2.0
//! Application layer - Ports for dependency inversion.
//!
//! - [`port`]: Trait definitions (interfaces) that infrastructure implements
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer (`ort`, `ffmpeg-next`) implements application layer ports
//! - The dehazing pipeline in [`crate::media`] only ever talks to the ports
//!
//! # Example
//!
//! ```ignore
//! use hazelift::application::port::RestorationModel;
//! use hazelift::infrastructure::onnx::OnnxRestorationModel;
//! use hazelift::media::dehaze::Dehazer;
//!
//! let mut model = OnnxRestorationModel::load(&config.model)?;
//! let mut dehazer = Dehazer::new(&mut model, DehazeParams::default());
//! ```

pub mod port;
