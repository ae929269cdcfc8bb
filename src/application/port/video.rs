// SPDX-License-Identifier: MPL-2.0
//! Video stream port definitions.
//!
//! This module defines the two sides of a video job's stream handle:
//! [`FrameSource`] (read side) and [`FrameSink`] (write side).
//! Infrastructure adapters (like `FFmpeg`) implement these traits.
//!
//! # Design Notes
//!
//! - Both sides are **stateful** and scoped to a single job
//! - `release()` must be safe to call more than once; the second call is a no-op
//! - End of stream is `Ok(None)`, never an error

use crate::domain::error::VideoError;
use crate::domain::media::{ChannelOrder, FrameSize, VideoFrame, VideoMetadata};

// =============================================================================
// FrameSource Trait
// =============================================================================

/// Read side of a video stream.
///
/// # Lifecycle
///
/// 1. Open the source (adapter-specific constructor)
/// 2. Read [`metadata()`](Self::metadata) once
/// 3. Call [`read_frame()`](Self::read_frame) until it returns `Ok(None)`
/// 4. Call [`release()`](Self::release)
pub trait FrameSource {
    /// Returns the native geometry, frame rate, and frame count.
    fn metadata(&self) -> &VideoMetadata;

    /// Decodes the next frame.
    ///
    /// Returns `Ok(Some(frame))` for each decoded frame, or `Ok(None)` when
    /// the source has no more frames.
    ///
    /// # Errors
    ///
    /// Returns a [`VideoError`] if the next frame is unreadable.
    fn read_frame(&mut self) -> Result<Option<VideoFrame>, VideoError>;

    /// Closes the source and frees its resources.
    ///
    /// # Errors
    ///
    /// Returns a [`VideoError`] if cleanup fails.
    fn release(&mut self) -> Result<(), VideoError>;
}

// =============================================================================
// FrameSink Trait
// =============================================================================

/// Geometry and timing an output stream is opened with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamSpec {
    /// Frame dimensions every written frame must have.
    pub size: FrameSize,
    /// Output frame rate.
    pub fps: f64,
}

impl StreamSpec {
    /// Output spec that reproduces the source's native geometry and timing.
    #[must_use]
    pub fn matching(metadata: &VideoMetadata) -> Self {
        Self {
            size: metadata.size,
            fps: metadata.fps,
        }
    }
}

/// Write side of a video stream.
pub trait FrameSink {
    /// Channel order the sink expects for incoming frames.
    fn channel_order(&self) -> ChannelOrder;

    /// Appends one frame to the output.
    ///
    /// # Errors
    ///
    /// Returns a [`VideoError`] if the frame has the wrong size or encoding fails.
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), VideoError>;

    /// Flushes pending frames, finalizes the container, and frees resources.
    ///
    /// # Errors
    ///
    /// Returns a [`VideoError`] if flushing or cleanup fails.
    fn release(&mut self) -> Result<(), VideoError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test that the traits are object-safe
    fn _assert_source_object_safe(_: &dyn FrameSource) {}
    fn _assert_sink_object_safe(_: &dyn FrameSink) {}

    #[test]
    fn stream_spec_matches_native_geometry() {
        let meta = VideoMetadata::new(FrameSize::new(256, 144), 30.0, 10, 0.0);
        let spec = StreamSpec::matching(&meta);
        assert_eq!(spec.size, FrameSize::new(256, 144));
        assert!((spec.fps - 30.0).abs() < f64::EPSILON);
    }
}
