// SPDX-License-Identifier: MPL-2.0
use std::path::Path;

use ffmpeg_next::{format, software::scaling};

use super::{copy_rows, init_ffmpeg};
use crate::application::port::FrameSource;
use crate::config::FALLBACK_FPS;
use crate::domain::error::VideoError;
use crate::domain::media::{ChannelOrder, FrameSize, VideoFrame, VideoMetadata};

/// `FFmpeg`-backed [`FrameSource`] yielding packed RGB frames at native size.
///
/// # Example
///
/// ```ignore
/// use hazelift::application::port::FrameSource;
/// use hazelift::infrastructure::ffmpeg::FfmpegFrameSource;
///
/// let mut source = FfmpegFrameSource::open(Path::new("video.mp4"))?;
/// while let Some(frame) = source.read_frame()? {
///     println!("frame {}", frame.size());
/// }
/// source.release()?;
/// ```
pub struct FfmpegFrameSource {
    state: Option<DecoderState>,
    metadata: VideoMetadata,
}

struct DecoderState {
    input: format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    eof_sent: bool,
}

impl FfmpegFrameSource {
    /// Opens `path` and prepares its best video stream for decoding.
    ///
    /// # Errors
    ///
    /// - [`VideoError::NoVideoStream`] if the container has no video track
    /// - [`VideoError::InvalidDimensions`] if the stream reports a zero size
    /// - Another [`VideoError`] if the file cannot be opened or its codec is
    ///   unavailable
    pub fn open(path: &Path) -> Result<Self, VideoError> {
        init_ffmpeg()?;

        let input = format::input(&path)
            .map_err(|e| VideoError::from_message(&format!("Failed to open video: {e}")))?;

        let stream = input
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or(VideoError::NoVideoStream)?;
        let stream_index = stream.index();

        let context = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| VideoError::Other(format!("Failed to create codec context: {e}")))?;
        let decoder = context
            .decoder()
            .video()
            .map_err(|e| VideoError::from_message(&format!("Failed to create video decoder: {e}")))?;

        let (width, height) = (decoder.width(), decoder.height());
        if width == 0 || height == 0 {
            return Err(VideoError::InvalidDimensions { width, height });
        }

        let rate = stream.avg_frame_rate();
        let fps = if rate.numerator() > 0 && rate.denominator() > 0 {
            f64::from(rate.numerator()) / f64::from(rate.denominator())
        } else {
            FALLBACK_FPS
        };

        #[allow(clippy::cast_precision_loss)]
        let duration_secs = if input.duration() > 0 {
            input.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
        } else {
            0.0
        };
        let frame_count = u64::try_from(stream.frames()).unwrap_or(0);

        let scaler = scaling::Context::get(
            decoder.format(),
            width,
            height,
            format::Pixel::RGB24,
            width,
            height,
            scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoError::Other(format!("Failed to create scaler: {e}")))?;

        let metadata = VideoMetadata::new(FrameSize::new(width, height), fps, frame_count, duration_secs);
        log::debug!(
            "opened {}: {} @ {fps:.3} fps, {frame_count} frames",
            path.display(),
            metadata.size
        );

        Ok(Self {
            state: Some(DecoderState {
                input,
                decoder,
                scaler,
                stream_index,
                eof_sent: false,
            }),
            metadata,
        })
    }

    /// Returns `true` until [`release`](FrameSource::release) is called.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state.is_some()
    }
}

/// Result of one `receive_frame` call.
#[derive(Debug, PartialEq)]
enum Receive {
    Frame,
    NeedInput,
    Drained,
    Failed(VideoError),
}

fn receive_outcome(result: Result<(), ffmpeg_next::Error>) -> Receive {
    match result {
        Ok(()) => Receive::Frame,
        Err(ffmpeg_next::Error::Other { errno }) if errno == ffmpeg_next::error::EAGAIN => {
            Receive::NeedInput
        }
        Err(ffmpeg_next::Error::Eof) => Receive::Drained,
        Err(e) => Receive::Failed(VideoError::DecodingFailed(format!("Frame decode failed: {e}"))),
    }
}

impl DecoderState {
    fn next_frame(&mut self, size: FrameSize) -> Result<Option<VideoFrame>, VideoError> {
        let mut decoded = ffmpeg_next::frame::Video::empty();
        loop {
            match receive_outcome(self.decoder.receive_frame(&mut decoded)) {
                Receive::Frame => return self.convert(&decoded, size).map(Some),
                Receive::Drained => return Ok(None),
                Receive::Failed(e) => return Err(e),
                Receive::NeedInput => {}
            }
            if self.eof_sent {
                return Ok(None);
            }

            let mut packet = ffmpeg_next::Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() != self.stream_index {
                        continue;
                    }
                    self.decoder
                        .send_packet(&packet)
                        .map_err(|e| VideoError::DecodingFailed(format!("Packet send failed: {e}")))?;
                }
                Err(ffmpeg_next::Error::Eof) => {
                    self.decoder
                        .send_eof()
                        .map_err(|e| VideoError::DecodingFailed(format!("Flush failed: {e}")))?;
                    self.eof_sent = true;
                }
                Err(e) => {
                    return Err(VideoError::DecodingFailed(format!("Packet read failed: {e}")));
                }
            }
        }
    }

    fn convert(
        &mut self,
        decoded: &ffmpeg_next::frame::Video,
        size: FrameSize,
    ) -> Result<VideoFrame, VideoError> {
        if decoded.width() != size.width || decoded.height() != size.height {
            return Err(VideoError::InvalidDimensions {
                width: decoded.width(),
                height: decoded.height(),
            });
        }

        let mut rgb = ffmpeg_next::frame::Video::empty();
        self.scaler
            .run(decoded, &mut rgb)
            .map_err(|e| VideoError::DecodingFailed(format!("Scaling failed: {e}")))?;

        let row_bytes = size.width as usize * 3;
        let height = size.height as usize;
        let mut data = vec![0u8; row_bytes * height];
        copy_rows(rgb.data(0), rgb.stride(0), &mut data, row_bytes, row_bytes, height);

        Ok(VideoFrame::new(size, ChannelOrder::Rgb, data))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    fn read_frame(&mut self) -> Result<Option<VideoFrame>, VideoError> {
        let size = self.metadata.size;
        match self.state.as_mut() {
            Some(state) => state.next_frame(size),
            None => Err(VideoError::Other("source already released".to_string())),
        }
    }

    fn release(&mut self) -> Result<(), VideoError> {
        self.state = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_fails_to_open() {
        let result = FfmpegFrameSource::open(Path::new("/nonexistent/clip.mp4"));
        assert!(result.is_err());
    }

    #[test]
    fn decoder_backpressure_asks_for_more_input() {
        let again = Err(ffmpeg_next::Error::Other {
            errno: ffmpeg_next::error::EAGAIN,
        });
        assert_eq!(receive_outcome(again), Receive::NeedInput);
        assert_eq!(receive_outcome(Ok(())), Receive::Frame);
        assert_eq!(receive_outcome(Err(ffmpeg_next::Error::Eof)), Receive::Drained);
    }

    #[test]
    fn corrupt_frame_is_reported_not_skipped() {
        let outcome = receive_outcome(Err(ffmpeg_next::Error::InvalidData));
        assert!(matches!(outcome, Receive::Failed(VideoError::DecodingFailed(_))));
    }

    #[test]
    fn non_video_file_fails_to_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.mp4");
        std::fs::write(&path, b"plain text, not a container").unwrap();
        assert!(FfmpegFrameSource::open(&path).is_err());
    }
}
