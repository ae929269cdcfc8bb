// SPDX-License-Identifier: MPL-2.0
//! Frame-by-frame video dehazing.
//!
//! [`dehaze_video`] drives any [`FrameSource`] into any [`FrameSink`] through
//! a [`Dehazer`]. Frames are processed at working resolution and written back
//! at the source's native size and frame rate.
//!
//! An unreadable frame ends the stream early without failing the job:
//! frames already written are kept and the report says where reading
//! stopped. Both stream sides are released on every exit path.

use std::path::Path;
use std::time::{Duration, Instant};

use image_rs::RgbImage;

use crate::application::port::{FrameSink, FrameSource, RestorationModel, StreamSpec};
use crate::config::VideoConfig;
use crate::domain::error::VideoError;
use crate::domain::media::{ChannelOrder, VideoFrame, VideoMetadata};
use crate::error::{Error, Result};
use crate::infrastructure::ffmpeg::{FfmpegFrameSink, FfmpegFrameSource};
use crate::media::dehaze::Dehazer;
use crate::media::image_transform::{normalize, resize_rgb8, to_byte_image};

/// Why a video job stopped reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEnd {
    /// The source reported no more frames.
    Exhausted,
    /// Frame `frame_index` (zero-based) could not be read.
    ReadFailure {
        frame_index: u64,
        reason: VideoError,
    },
}

/// Outcome of a video job.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoReport {
    /// Metadata reported by the source.
    pub source: VideoMetadata,
    /// Geometry and timing the output was opened with.
    pub output: StreamSpec,
    pub frames_written: u64,
    pub termination: StreamEnd,
    /// Release failures of either stream side. These never fail the job.
    pub release_warnings: Vec<VideoError>,
    pub elapsed: Duration,
}

impl VideoReport {
    /// Returns `true` if every frame the source offered was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.termination == StreamEnd::Exhausted
    }
}

/// Dehazes every frame of `source` into a sink opened by `open_sink`.
///
/// `open_sink` receives a [`StreamSpec`] with the source's native size and
/// frame rate. A progress line is logged every `progress_interval` frames;
/// `0` disables progress logging.
///
/// # Errors
///
/// Returns an error if the sink cannot be opened, a frame fails to dehaze,
/// or a frame cannot be written. The source (and the sink, once opened) is
/// released before any error is returned.
pub fn dehaze_video<M, S, K, F>(
    dehazer: &mut Dehazer<'_, M>,
    source: &mut S,
    open_sink: F,
    progress_interval: u64,
) -> Result<VideoReport>
where
    M: RestorationModel + ?Sized,
    S: FrameSource + ?Sized,
    K: FrameSink,
    F: FnOnce(&StreamSpec) -> std::result::Result<K, VideoError>,
{
    let started = Instant::now();
    let metadata = source.metadata().clone();
    let spec = StreamSpec::matching(&metadata);
    let mut release_warnings = Vec::new();

    let mut sink = match open_sink(&spec) {
        Ok(sink) => sink,
        Err(e) => {
            collect_release("source", source.release(), &mut release_warnings);
            return Err(e.into());
        }
    };

    let outcome = pump_frames(dehazer, source, &mut sink, &metadata, progress_interval);

    collect_release("source", source.release(), &mut release_warnings);
    collect_release("sink", sink.release(), &mut release_warnings);

    let (frames_written, termination) = outcome?;
    let elapsed = started.elapsed();

    match &termination {
        StreamEnd::Exhausted => log::info!(
            "dehazed {frames_written} frames ({}) in {:.2}s",
            spec.size,
            elapsed.as_secs_f64()
        ),
        StreamEnd::ReadFailure { frame_index, .. } => log::info!(
            "dehazed {frames_written} frames ({}) in {:.2}s, stopped at unreadable frame {frame_index}",
            spec.size,
            elapsed.as_secs_f64()
        ),
    }

    Ok(VideoReport {
        source: metadata,
        output: spec,
        frames_written,
        termination,
        release_warnings,
        elapsed,
    })
}

/// Dehazes the video file at `input` into an MPEG-4 file at `output`.
///
/// # Errors
///
/// Returns [`Error::Decode`] if `input` cannot be opened as a video, and any
/// error of [`dehaze_video`].
pub fn dehaze_video_file<M: RestorationModel + ?Sized>(
    dehazer: &mut Dehazer<'_, M>,
    input: &Path,
    output: &Path,
    config: &VideoConfig,
) -> Result<VideoReport> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut source = FfmpegFrameSource::open(input)
        .map_err(|e| Error::Decode(format!("{}: {e}", input.display())))?;
    log::info!(
        "dehazing {} ({} @ {:.2} fps, {} frames)",
        input.display(),
        source.metadata().size,
        source.metadata().fps,
        source.metadata().expected_frames()
    );

    dehaze_video(
        dehazer,
        &mut source,
        |spec| FfmpegFrameSink::create(output, spec, config.bit_rate),
        config.progress_interval,
    )
}

fn pump_frames<M, S, K>(
    dehazer: &mut Dehazer<'_, M>,
    source: &mut S,
    sink: &mut K,
    metadata: &VideoMetadata,
    progress_interval: u64,
) -> Result<(u64, StreamEnd)>
where
    M: RestorationModel + ?Sized,
    S: FrameSource + ?Sized,
    K: FrameSink,
{
    let sink_order = sink.channel_order();
    let mut written = 0_u64;

    loop {
        let frame = match source.read_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => return Ok((written, StreamEnd::Exhausted)),
            Err(reason) => {
                log::warn!("frame {written} unreadable, ending stream: {reason}");
                return Ok((
                    written,
                    StreamEnd::ReadFailure {
                        frame_index: written,
                        reason,
                    },
                ));
            }
        };

        let restored = dehaze_frame(dehazer, frame, sink_order)?;
        sink.write_frame(&restored)?;
        written += 1;

        if progress_interval > 0 && written % progress_interval == 0 {
            log::info!("{}", progress_line(written, metadata));
        }
    }
}

fn progress_line(written: u64, metadata: &VideoMetadata) -> String {
    match metadata.expected_frames() {
        0 => format!("processed frame {written}"),
        total => format!("processed frame {written} of {total}"),
    }
}

/// Runs one frame through the image pipeline and returns it at native size
/// in `order`.
fn dehaze_frame<M: RestorationModel + ?Sized>(
    dehazer: &mut Dehazer<'_, M>,
    frame: VideoFrame,
    order: ChannelOrder,
) -> Result<VideoFrame> {
    let size = frame.size();
    let rgb = RgbImage::from_raw(
        size.width,
        size.height,
        frame.into_order(ChannelOrder::Rgb).into_data(),
    )
    .ok_or_else(|| Error::Shape(format!("frame buffer does not match {size}")))?;

    let working = normalize(&resize_rgb8(&rgb, dehazer.params().working_size));
    let dehazed = dehazer.dehaze_image(&working, size)?;
    let bytes = to_byte_image(&dehazed)?;

    Ok(VideoFrame::new(size, ChannelOrder::Rgb, bytes.into_raw()).into_order(order))
}

fn collect_release(
    side: &str,
    result: std::result::Result<(), VideoError>,
    warnings: &mut Vec<VideoError>,
) {
    if let Err(e) = result {
        log::warn!("failed to release video {side}: {e}");
        warnings.push(e);
    }
}
