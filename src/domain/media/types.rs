// SPDX-License-Identifier: MPL-2.0
//! Core media types for the domain layer.
//!
//! These types represent pure data without any codec or runtime dependencies.

use std::fmt;

/// Width and height of an image or video frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl FrameSize {
    /// Creates a new frame size.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the total number of pixels.
    #[must_use]
    pub fn pixel_count(self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Returns `true` if either dimension is zero.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Byte order of the three color samples in a packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

/// A decoded video frame with packed 8-bit samples (3 bytes per pixel).
///
/// # Example
///
/// ```
/// use hazelift::domain::media::{ChannelOrder, FrameSize, VideoFrame};
///
/// let frame = VideoFrame::new(FrameSize::new(2, 1), ChannelOrder::Rgb, vec![1, 2, 3, 4, 5, 6]);
/// let bgr = frame.into_order(ChannelOrder::Bgr);
///
/// assert_eq!(bgr.data(), &[3, 2, 1, 6, 5, 4]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFrame {
    size: FrameSize,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl VideoFrame {
    /// Creates a new frame from packed pixel data.
    ///
    /// # Panics
    ///
    /// Panics if the pixel data length doesn't match `width * height * 3`.
    #[must_use]
    pub fn new(size: FrameSize, order: ChannelOrder, data: Vec<u8>) -> Self {
        let expected_len = size.pixel_count() * 3;
        assert_eq!(
            data.len(),
            expected_len,
            "Frame data length mismatch: expected {expected_len}, got {}",
            data.len()
        );

        Self { size, order, data }
    }

    /// Returns the frame dimensions.
    #[must_use]
    pub fn size(&self) -> FrameSize {
        self.size
    }

    /// Returns the channel order of the packed samples.
    #[must_use]
    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    /// Returns the packed pixel data.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the frame and returns the packed pixel data.
    #[must_use]
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Reorders the color samples to `order`, swapping red and blue if needed.
    #[must_use]
    pub fn into_order(mut self, order: ChannelOrder) -> Self {
        if self.order != order {
            for pixel in self.data.chunks_exact_mut(3) {
                pixel.swap(0, 2);
            }
            self.order = order;
        }
        self
    }
}

/// Video stream metadata needed to reproduce the source geometry and timing.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    /// Native frame dimensions.
    pub size: FrameSize,
    /// Frames per second.
    pub fps: f64,
    /// Number of frames reported by the container (0 when unknown).
    pub frame_count: u64,
    /// Duration in seconds (0.0 when unknown).
    pub duration_secs: f64,
}

impl VideoMetadata {
    /// Creates a new `VideoMetadata`.
    #[must_use]
    pub fn new(size: FrameSize, fps: f64, frame_count: u64, duration_secs: f64) -> Self {
        Self {
            size,
            fps,
            frame_count,
            duration_secs,
        }
    }

    /// Returns the reported frame count, or an estimate from duration and
    /// frame rate when the container does not store one.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn expected_frames(&self) -> u64 {
        if self.frame_count > 0 {
            return self.frame_count;
        }
        let frames = self.duration_secs * self.fps;
        if frames.is_finite() && frames > 0.0 {
            frames.round() as u64
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_size_display_and_count() {
        let size = FrameSize::new(256, 144);
        assert_eq!(size.to_string(), "256x144");
        assert_eq!(size.pixel_count(), 256 * 144);
        assert!(!size.is_empty());
        assert!(FrameSize::new(0, 10).is_empty());
    }

    #[test]
    #[should_panic(expected = "Frame data length mismatch")]
    fn video_frame_rejects_wrong_length() {
        let _ = VideoFrame::new(FrameSize::new(2, 2), ChannelOrder::Rgb, vec![0u8; 5]);
    }

    #[test]
    fn into_order_is_noop_for_same_order() {
        let frame = VideoFrame::new(FrameSize::new(1, 1), ChannelOrder::Bgr, vec![9, 8, 7]);
        let same = frame.clone().into_order(ChannelOrder::Bgr);
        assert_eq!(same, frame);
    }

    #[test]
    fn into_order_twice_restores_original() {
        let frame = VideoFrame::new(FrameSize::new(2, 1), ChannelOrder::Rgb, vec![1, 2, 3, 4, 5, 6]);
        let back = frame
            .clone()
            .into_order(ChannelOrder::Bgr)
            .into_order(ChannelOrder::Rgb);
        assert_eq!(back, frame);
    }

    #[test]
    fn expected_frames_prefers_container_count() {
        let meta = VideoMetadata::new(FrameSize::new(10, 10), 30.0, 42, 10.0);
        assert_eq!(meta.expected_frames(), 42);
    }

    #[test]
    fn expected_frames_falls_back_to_duration() {
        let meta = VideoMetadata::new(FrameSize::new(10, 10), 25.0, 0, 2.0);
        assert_eq!(meta.expected_frames(), 50);

        let unknown = VideoMetadata::new(FrameSize::new(10, 10), 25.0, 0, 0.0);
        assert_eq!(unknown.expected_frames(), 0);
    }
}
