// SPDX-License-Identifier: MPL-2.0
use std::fmt;

/// Errors raised by the video read and write sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    /// File exists but contains no video stream
    NoVideoStream,

    /// File appears corrupted or has invalid data
    CorruptedFile,

    /// Codec is not available in the system's FFmpeg
    UnsupportedCodec(String),

    /// Frame dimensions the codec cannot handle (zero, or odd for 4:2:0)
    InvalidDimensions { width: u32, height: u32 },

    /// Decoding a packet or converting a frame failed
    DecodingFailed(String),

    /// Encoding or muxing a frame failed
    EncodingFailed(String),

    /// I/O error (file not found, permission denied, etc.)
    IoError(String),

    /// Generic error with raw message
    Other(String),
}

impl VideoError {
    /// Attempts to parse a raw error message into a specific `VideoError` type.
    /// This is used to categorize errors from `FFmpeg`.
    pub fn from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();

        if msg_lower.contains("codec") || msg_lower.contains("decoder") {
            if let Some(codec) = Self::extract_codec_name(&msg_lower) {
                return VideoError::UnsupportedCodec(codec);
            } else if msg_lower.contains("not found") || msg_lower.contains("unsupported") {
                return VideoError::DecodingFailed(msg.to_string());
            }
        }

        if msg_lower.contains("no such file")
            || (msg_lower.contains("not found") && !msg_lower.contains("decoder"))
            || msg_lower.contains("permission denied")
            || msg_lower.contains("i/o error")
        {
            return VideoError::IoError(msg.to_string());
        }

        if msg_lower.contains("no video stream") || msg_lower.contains("no video track") {
            return VideoError::NoVideoStream;
        }

        if msg_lower.contains("corrupt")
            || msg_lower.contains("invalid data")
            || msg_lower.contains("malformed")
        {
            return VideoError::CorruptedFile;
        }

        if msg_lower.contains("packet")
            || msg_lower.contains("scaling")
            || msg_lower.contains("decode")
        {
            return VideoError::DecodingFailed(msg.to_string());
        }

        VideoError::Other(msg.to_string())
    }

    fn extract_codec_name(msg: &str) -> Option<String> {
        let codecs = ["h264", "hevc", "h265", "vp8", "vp9", "av1", "mpeg4", "mpeg2"];
        codecs
            .iter()
            .find(|codec| msg.contains(*codec))
            .map(|codec| codec.to_uppercase())
    }
}

impl fmt::Display for VideoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoError::NoVideoStream => write!(f, "No video stream found"),
            VideoError::CorruptedFile => write!(f, "Video file is corrupted"),
            VideoError::UnsupportedCodec(codec) => write!(f, "Unsupported video codec: {codec}"),
            VideoError::InvalidDimensions { width, height } => {
                write!(f, "Invalid video dimensions: {width}x{height}")
            }
            VideoError::DecodingFailed(msg) => write!(f, "Decoding failed: {msg}"),
            VideoError::EncodingFailed(msg) => write!(f, "Encoding failed: {msg}"),
            VideoError::IoError(msg) => write!(f, "I/O error: {msg}"),
            VideoError::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for VideoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_message_io() {
        let err = VideoError::from_message("No such file or directory");
        assert!(matches!(err, VideoError::IoError(_)));
    }

    #[test]
    fn from_message_no_stream() {
        let err = VideoError::from_message("No video stream found in file");
        assert_eq!(err, VideoError::NoVideoStream);
    }

    #[test]
    fn from_message_codec() {
        let err = VideoError::from_message("Decoder h264 not found");
        assert!(matches!(err, VideoError::UnsupportedCodec(codec) if codec == "H264"));
    }

    #[test]
    fn from_message_corrupted() {
        let err = VideoError::from_message("Invalid data found when processing input");
        assert_eq!(err, VideoError::CorruptedFile);
    }

    #[test]
    fn from_message_packet_failure() {
        let err = VideoError::from_message("Packet send failed: error");
        assert!(matches!(err, VideoError::DecodingFailed(_)));
    }

    #[test]
    fn display_includes_dimensions() {
        let err = VideoError::InvalidDimensions {
            width: 255,
            height: 144,
        };
        assert_eq!(err.to_string(), "Invalid video dimensions: 255x144");
    }
}
