// SPDX-License-Identifier: MPL-2.0
//! Job classification, output naming and artifact cleanup.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{
    OutputConfig, DEFAULT_IMAGE_OUTPUT_NAME, DEFAULT_VIDEO_OUTPUT_NAME, IMAGE_UPLOAD_NAME,
    VIDEO_UPLOAD_NAME,
};
use crate::error::{Error, Result};

/// Supported input extensions.
pub mod extensions {
    /// Image file extensions.
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

    /// Video file extensions.
    pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi"];

    /// All accepted extensions.
    #[must_use]
    pub fn all_supported_extensions() -> Vec<&'static str> {
        IMAGE_EXTENSIONS
            .iter()
            .chain(VIDEO_EXTENSIONS.iter())
            .copied()
            .collect()
    }
}

/// The two kinds of dehazing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Image,
    Video,
}

impl JobKind {
    /// Classifies `path` by its extension, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedMedia`] for a missing or unknown extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                Error::UnsupportedMedia(format!("{} has no file extension", path.display()))
            })?;

        if extensions::IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Ok(JobKind::Image)
        } else if extensions::VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Ok(JobKind::Video)
        } else {
            Err(Error::UnsupportedMedia(format!(
                "'.{extension}' is not one of: {}",
                extensions::all_supported_extensions().join(", ")
            )))
        }
    }

    /// Output path used when the caller supplies none.
    #[must_use]
    pub fn default_output(self, output: &OutputConfig) -> PathBuf {
        let name = match self {
            JobKind::Image => &output.image_name,
            JobKind::Video => &output.video_name,
        };
        output.directory.join(name)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Image => write!(f, "image"),
            JobKind::Video => write!(f, "video"),
        }
    }
}

/// Picks the caller's output path, or the configured default for `kind`.
#[must_use]
pub fn resolve_output(kind: JobKind, requested: Option<&Path>, output: &OutputConfig) -> PathBuf {
    requested.map_or_else(|| kind.default_output(output), Path::to_path_buf)
}

/// Files removed by [`cleanup_artifacts`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<PathBuf>,
    /// Files that existed but could not be removed, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Names of every artifact a job can leave in the output directory.
#[must_use]
pub fn artifact_names(output: &OutputConfig) -> Vec<String> {
    let mut names: Vec<String> = [
        IMAGE_UPLOAD_NAME,
        DEFAULT_IMAGE_OUTPUT_NAME,
        DEFAULT_VIDEO_OUTPUT_NAME,
        VIDEO_UPLOAD_NAME,
    ]
    .iter()
    .map(ToString::to_string)
    .collect();
    for configured in [&output.image_name, &output.video_name] {
        if !names.contains(configured) {
            names.push(configured.clone());
        }
    }
    names
}

/// Deletes job artifacts from the configured output directory.
///
/// Missing files are skipped silently. Failures are logged and reported,
/// never raised.
pub fn cleanup_artifacts(output: &OutputConfig) -> CleanupReport {
    let mut report = CleanupReport::default();
    for name in artifact_names(output) {
        let path = output.directory.join(&name);
        if !path.exists() {
            continue;
        }
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::info!("removed {}", path.display());
                report.removed.push(path);
            }
            Err(e) => {
                log::warn!("failed to remove {}: {e}", path.display());
                report.failed.push((path, e.to_string()));
            }
        }
    }
    report
}
