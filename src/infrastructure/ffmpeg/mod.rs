// SPDX-License-Identifier: MPL-2.0
//! `FFmpeg` adapters implementing the [`FrameSource`] and [`FrameSink`] ports.
//!
//! - [`FfmpegFrameSource`]: decodes a video file to packed RGB frames
//! - [`FfmpegFrameSink`]: encodes packed RGB frames to an MPEG-4 Part 2
//!   (`mp4v`) stream
//!
//! Both adapters are scoped to one job and release their contexts on
//! [`release`](crate::application::port::FrameSource::release) or drop.
//!
//! [`FrameSource`]: crate::application::port::FrameSource
//! [`FrameSink`]: crate::application::port::FrameSink

mod decoder;
mod encoder;

pub use decoder::FfmpegFrameSource;
pub use encoder::FfmpegFrameSink;

use std::sync::OnceLock;

use crate::domain::error::VideoError;

static FFMPEG_INIT: OnceLock<Result<(), String>> = OnceLock::new();

/// Initializes `FFmpeg` once per process and quiets its logging to errors.
///
/// Safe to call any number of times; later calls return the first outcome.
///
/// # Errors
///
/// Returns [`VideoError::Other`] if `FFmpeg` fails to initialize.
pub fn init_ffmpeg() -> Result<(), VideoError> {
    FFMPEG_INIT
        .get_or_init(|| {
            ffmpeg_next::init().map_err(|e| format!("FFmpeg initialization failed: {e}"))?;
            ffmpeg_next::util::log::set_level(ffmpeg_next::util::log::Level::Error);
            Ok(())
        })
        .clone()
        .map_err(VideoError::Other)
}

/// Copies `height` rows of `row_bytes` each between buffers with different
/// row strides.
fn copy_rows(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    dst_stride: usize,
    row_bytes: usize,
    height: usize,
) {
    for y in 0..height {
        let src_row = &src[y * src_stride..y * src_stride + row_bytes];
        dst[y * dst_stride..y * dst_stride + row_bytes].copy_from_slice(src_row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let first = init_ffmpeg();
        let second = init_ffmpeg();
        assert_eq!(first, second);
    }

    #[test]
    fn copy_rows_drops_padding() {
        let src = [1, 2, 3, 0, 4, 5, 6, 0];
        let mut dst = [0u8; 6];
        copy_rows(&src, 4, &mut dst, 3, 3, 2);
        assert_eq!(dst, [1, 2, 3, 4, 5, 6]);
    }
}
