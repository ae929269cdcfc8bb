// SPDX-License-Identifier: MPL-2.0
//! Dehazing algorithms for images and videos.
//!
//! - [`image_transform`]: decoding, resizing and normalization
//! - [`haze`]: Dark Channel Prior feature extraction
//! - [`tensor`]: model tensor layout
//! - [`dehaze`]: the single-image pipeline
//! - [`video`]: the frame sequencer
//! - [`job`]: job classification, output naming and cleanup

pub mod dehaze;
pub mod haze;
pub mod image_transform;
pub mod job;
pub mod tensor;
pub mod video;

pub use dehaze::{DehazeParams, Dehazer, ImageReport};
pub use haze::{HazeFeatures, HazeParams};
pub use job::{cleanup_artifacts, resolve_output, CleanupReport, JobKind};
pub use video::{dehaze_video, dehaze_video_file, StreamEnd, VideoReport};
