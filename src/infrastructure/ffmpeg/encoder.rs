// SPDX-License-Identifier: MPL-2.0
use std::path::{Path, PathBuf};

use ffmpeg_next::{codec, encoder, format, software::scaling, Packet, Rational};

use super::{copy_rows, init_ffmpeg};
use crate::application::port::{FrameSink, StreamSpec};
use crate::config::MIN_VIDEO_BIT_RATE;
use crate::domain::error::VideoError;
use crate::domain::media::{ChannelOrder, FrameSize, VideoFrame};

/// `FFmpeg`-backed [`FrameSink`] writing MPEG-4 Part 2 video.
///
/// Frames must be packed RGB at exactly the size the sink was created with.
/// The container is finalized on [`release`](FrameSink::release); dropping
/// an unreleased sink attempts the same and logs any failure.
pub struct FfmpegFrameSink {
    state: Option<EncoderState>,
    path: PathBuf,
    size: FrameSize,
}

struct EncoderState {
    output: format::context::Output,
    encoder: encoder::Video,
    scaler: scaling::Context,
    stream_index: usize,
    encoder_time_base: Rational,
    stream_time_base: Rational,
    next_pts: i64,
}

impl FfmpegFrameSink {
    /// Creates `path` and writes the container header.
    ///
    /// `bit_rate` is raised to a floor of 100 kbit/s.
    ///
    /// # Errors
    ///
    /// - [`VideoError::InvalidDimensions`] for a zero-sized stream
    /// - [`VideoError::UnsupportedCodec`] if the MPEG-4 encoder is missing
    /// - [`VideoError::EncodingFailed`] if the output cannot be set up
    pub fn create(path: &Path, spec: &StreamSpec, bit_rate: usize) -> Result<Self, VideoError> {
        init_ffmpeg()?;

        let size = spec.size;
        if size.is_empty() {
            return Err(VideoError::InvalidDimensions {
                width: size.width,
                height: size.height,
            });
        }

        let mut output = format::output(&path)
            .map_err(|e| VideoError::EncodingFailed(format!("Failed to create output: {e}")))?;
        let global_header = output
            .format()
            .flags()
            .contains(format::Flags::GLOBAL_HEADER);

        let codec = encoder::find(codec::Id::MPEG4)
            .ok_or_else(|| VideoError::UnsupportedCodec("mpeg4".to_string()))?;

        let stream_index = output
            .add_stream(codec)
            .map_err(|e| VideoError::EncodingFailed(format!("Failed to add stream: {e}")))?
            .index();

        let mut video = codec::context::Context::new_with_codec(codec)
            .encoder()
            .video()
            .map_err(|e| VideoError::EncodingFailed(format!("Failed to create encoder: {e}")))?;

        let frame_rate = frame_rate(spec.fps);
        let encoder_time_base = frame_rate.invert();
        video.set_width(size.width);
        video.set_height(size.height);
        video.set_format(format::Pixel::YUV420P);
        video.set_frame_rate(Some(frame_rate));
        video.set_time_base(encoder_time_base);
        video.set_bit_rate(bit_rate.max(MIN_VIDEO_BIT_RATE));
        if global_header {
            video.set_flags(codec::Flags::GLOBAL_HEADER);
        }

        let encoder = video
            .open_as(codec)
            .map_err(|e| VideoError::EncodingFailed(format!("Failed to open encoder: {e}")))?;

        if let Some(mut stream) = output.stream_mut(stream_index) {
            stream.set_parameters(&encoder);
            stream.set_time_base(encoder_time_base);
        }

        output
            .write_header()
            .map_err(|e| VideoError::EncodingFailed(format!("Failed to write header: {e}")))?;

        // The muxer may pick its own time base while writing the header.
        let stream_time_base = output
            .stream(stream_index)
            .map_or(encoder_time_base, |s| s.time_base());

        let scaler = scaling::Context::get(
            format::Pixel::RGB24,
            size.width,
            size.height,
            format::Pixel::YUV420P,
            size.width,
            size.height,
            scaling::Flags::BILINEAR,
        )
        .map_err(|e| VideoError::EncodingFailed(format!("Failed to create scaler: {e}")))?;

        log::debug!(
            "writing {} as mpeg4 {size} @ {:.3} fps",
            path.display(),
            spec.fps
        );

        Ok(Self {
            state: Some(EncoderState {
                output,
                encoder,
                scaler,
                stream_index,
                encoder_time_base,
                stream_time_base,
                next_pts: 0,
            }),
            path: path.to_path_buf(),
            size,
        })
    }
}

/// Converts a frame rate to a rational with millihertz precision.
#[allow(clippy::cast_possible_truncation)]
fn frame_rate(fps: f64) -> Rational {
    let fps = if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        crate::config::FALLBACK_FPS
    };
    Rational::new((fps * 1000.0).round() as i32, 1000).reduce()
}

impl EncoderState {
    fn encode(&mut self, frame: &VideoFrame) -> Result<(), VideoError> {
        let size = frame.size();
        let mut rgb = ffmpeg_next::frame::Video::new(format::Pixel::RGB24, size.width, size.height);
        let row_bytes = size.width as usize * 3;
        let stride = rgb.stride(0);
        copy_rows(
            frame.data(),
            row_bytes,
            rgb.data_mut(0),
            stride,
            row_bytes,
            size.height as usize,
        );

        let mut yuv = ffmpeg_next::frame::Video::empty();
        self.scaler
            .run(&rgb, &mut yuv)
            .map_err(|e| VideoError::EncodingFailed(format!("Scaling failed: {e}")))?;
        yuv.set_pts(Some(self.next_pts));
        self.next_pts += 1;

        self.encoder
            .send_frame(&yuv)
            .map_err(|e| VideoError::EncodingFailed(format!("Frame send failed: {e}")))?;
        self.write_packets()
    }

    fn write_packets(&mut self) -> Result<(), VideoError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.encoder_time_base, self.stream_time_base);
            packet
                .write_interleaved(&mut self.output)
                .map_err(|e| VideoError::EncodingFailed(format!("Packet write failed: {e}")))?;
        }
        Ok(())
    }

    fn finish(mut self) -> Result<(), VideoError> {
        self.encoder
            .send_eof()
            .map_err(|e| VideoError::EncodingFailed(format!("Flush failed: {e}")))?;
        self.write_packets()?;
        self.output
            .write_trailer()
            .map_err(|e| VideoError::EncodingFailed(format!("Failed to write trailer: {e}")))
    }
}

impl FrameSink for FfmpegFrameSink {
    fn channel_order(&self) -> ChannelOrder {
        ChannelOrder::Rgb
    }

    fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), VideoError> {
        if frame.size() != self.size {
            return Err(VideoError::InvalidDimensions {
                width: frame.size().width,
                height: frame.size().height,
            });
        }
        let frame = if frame.order() == ChannelOrder::Rgb {
            std::borrow::Cow::Borrowed(frame)
        } else {
            std::borrow::Cow::Owned(frame.clone().into_order(ChannelOrder::Rgb))
        };
        match self.state.as_mut() {
            Some(state) => state.encode(&frame),
            None => Err(VideoError::Other("sink already released".to_string())),
        }
    }

    fn release(&mut self) -> Result<(), VideoError> {
        match self.state.take() {
            Some(state) => state.finish(),
            None => Ok(()),
        }
    }
}

impl Drop for FfmpegFrameSink {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::warn!("failed to finalize {}: {e}", self.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rate_is_reduced() {
        let rate = frame_rate(30.0);
        assert_eq!((rate.numerator(), rate.denominator()), (30, 1));

        let ntsc = frame_rate(29.97);
        assert_eq!((ntsc.numerator(), ntsc.denominator()), (2997, 100));
    }

    #[test]
    fn invalid_frame_rate_falls_back() {
        let rate = frame_rate(f64::NAN);
        assert_eq!((rate.numerator(), rate.denominator()), (30, 1));
        let rate = frame_rate(0.0);
        assert_eq!((rate.numerator(), rate.denominator()), (30, 1));
    }

    #[test]
    fn zero_sized_stream_is_rejected() {
        let spec = StreamSpec {
            size: FrameSize::new(0, 144),
            fps: 30.0,
        };
        let dir = tempfile::tempdir().unwrap();
        let result = FfmpegFrameSink::create(&dir.path().join("out.mp4"), &spec, 1_000_000);
        assert!(matches!(
            result,
            Err(VideoError::InvalidDimensions { width: 0, .. })
        ));
    }
}
