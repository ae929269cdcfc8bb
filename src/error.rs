// SPDX-License-Identifier: MPL-2.0
use crate::application::port::ModelError;
use crate::domain::error::VideoError;
use thiserror::Error;

/// Errors surfaced by a dehazing job. Every variant is terminal for the job.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The input could not be opened or decoded as an image or video.
    #[error("Decode Error: {0}")]
    Decode(String),

    /// An array reached the tensor packager with an unsupported shape.
    #[error("Shape Error: {0}")]
    Shape(String),

    /// A non-finite value made it into the model input.
    #[error("Arithmetic Degeneracy: {0}")]
    ArithmeticDegeneracy(String),

    /// The input extension is not one of the supported media kinds.
    #[error("Unsupported Media: {0}")]
    UnsupportedMedia(String),

    #[error("Model Error: {0}")]
    Model(#[from] ModelError),

    #[error("Video Error: {0}")]
    Video(#[from] VideoError),

    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Config Error: {0}")]
    Config(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<image_rs::ImageError> for Error {
    fn from(err: image_rs::ImageError) -> Self {
        match err {
            image_rs::ImageError::IoError(io) => Error::Io(io.to_string()),
            other @ (image_rs::ImageError::Decoding(_)
            | image_rs::ImageError::Unsupported(_)
            | image_rs::ImageError::Limits(_)) => Error::Decode(other.to_string()),
            other => Error::Io(other.to_string()),
        }
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::Shape(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_io_error() {
        let err = Error::Io("disk failure".to_string());
        assert_eq!(format!("{err}"), "I/O Error: disk failure");
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_error = std::io::Error::other("boom");
        let err: Error = io_error.into();
        match err {
            Error::Io(message) => assert!(message.contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn config_error_formats_properly() {
        let err = Error::Config("bad field".into());
        assert_eq!(format!("{err}"), "Config Error: bad field");
    }

    #[test]
    fn video_error_converts_and_keeps_message() {
        let err: Error = VideoError::NoVideoStream.into();
        assert_eq!(format!("{err}"), "Video Error: No video stream found");
    }

    #[test]
    fn malformed_image_bytes_become_decode_error() {
        let err: Error = image_rs::load_from_memory(b"definitely not an image")
            .expect_err("garbage should not decode")
            .into();
        assert!(matches!(err, Error::Decode(_)), "got {err:?}");
    }
}
