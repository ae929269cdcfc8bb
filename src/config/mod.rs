// SPDX-License-Identifier: MPL-2.0
//! This module handles the configuration, including loading and saving
//! settings to a `settings.toml` file.
//!
//! # Configuration Sections
//!
//! - `[model]` - Restoration model file and runtime threads
//! - `[dehaze]` - Working resolution and Dark Channel Prior parameters
//! - `[video]` - Progress reporting and output bit rate
//! - `[output]` - Artifact directory and default output names
//!
//! # Path Resolution
//!
//! 1. Use `load_from_path()`/`save_to_path()` with explicit path
//! 2. Set `HAZELIFT_CONFIG_DIR` environment variable
//! 3. Falls back to platform-specific config directory
//!
//! # Examples
//!
//! ```no_run
//! use hazelift::config::{self, Config};
//!
//! // Load existing configuration (returns tuple with optional warning)
//! let (mut config, _warning) = config::load();
//!
//! // Modify a setting
//! config.dehaze.window_size = 7;
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//! ```

pub mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "settings.toml";

// =============================================================================
// Section Structs
// =============================================================================

/// Restoration model settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct ModelConfig {
    /// Model file. Defaults to `dehaze.onnx` in the data directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Intra-op thread count handed to the runtime. `None` lets it decide.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intra_threads: Option<usize>,
}

impl ModelConfig {
    /// Returns the configured model path, or the default location.
    #[must_use]
    pub fn resolved_path(&self) -> PathBuf {
        if let Some(path) = &self.path {
            return path.clone();
        }
        paths::data_dir().map_or_else(
            || PathBuf::from(DEFAULT_MODEL_FILENAME),
            |mut p| {
                p.push(DEFAULT_MODEL_FILENAME);
                p
            },
        )
    }
}

/// Dark Channel Prior and working resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DehazeConfig {
    /// Width the model runs at.
    pub working_width: u32,
    /// Height the model runs at.
    pub working_height: u32,
    /// Side of the square erosion window.
    pub window_size: usize,
    /// Haze coefficient ω.
    pub omega: f32,
    /// Share of pixels averaged into the atmospheric light.
    pub brightest_fraction: f32,
    /// Floor for atmospheric light components.
    pub atmospheric_epsilon: f32,
}

impl Default for DehazeConfig {
    fn default() -> Self {
        Self {
            working_width: DEFAULT_WORKING_WIDTH,
            working_height: DEFAULT_WORKING_HEIGHT,
            window_size: DEFAULT_WINDOW_SIZE,
            omega: DEFAULT_OMEGA,
            brightest_fraction: DEFAULT_BRIGHTEST_FRACTION,
            atmospheric_epsilon: DEFAULT_ATMOSPHERIC_EPSILON,
        }
    }
}

/// Video job settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VideoConfig {
    /// Log progress every this many frames. `0` disables progress lines.
    pub progress_interval: u64,
    /// Output bit rate in bits per second.
    pub bit_rate: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            bit_rate: DEFAULT_VIDEO_BIT_RATE,
        }
    }
}

/// Output artifact settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that holds job inputs and outputs.
    pub directory: PathBuf,
    /// Output name for image jobs when the caller supplies none.
    pub image_name: String,
    /// Output name for video jobs when the caller supplies none.
    pub video_name: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_OUTPUT_DIR),
            image_name: DEFAULT_IMAGE_OUTPUT_NAME.to_string(),
            video_name: DEFAULT_VIDEO_OUTPUT_NAME.to_string(),
        }
    }
}

// =============================================================================
// Main Config Struct (Sectioned)
// =============================================================================

/// Configuration with logical sections.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub dehaze: DehazeConfig,

    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

// =============================================================================
// Config Path Resolution
// =============================================================================

fn get_config_path_with_override(base_dir: Option<PathBuf>) -> Option<PathBuf> {
    paths::config_dir_with_override(base_dir).map(|mut path| {
        path.push(CONFIG_FILE);
        path
    })
}

// =============================================================================
// Load / Save Functions
// =============================================================================

/// Loads the configuration from the default path.
///
/// Returns a tuple of (config, optional_warning). If loading fails, returns
/// default config with a warning message explaining what went wrong.
pub fn load() -> (Config, Option<String>) {
    load_with_override(None)
}

/// Loads the configuration from a custom directory.
pub fn load_with_override(base_dir: Option<PathBuf>) -> (Config, Option<String>) {
    if let Some(path) = get_config_path_with_override(base_dir) {
        if path.exists() {
            return match load_from_path(&path) {
                Ok(config) => (config, None),
                Err(err) => (
                    Config::default(),
                    Some(format!(
                        "ignoring {}: {err}; using defaults",
                        path.display()
                    )),
                ),
            };
        }
    }
    (Config::default(), None)
}

/// Loads configuration from a specific path.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read and [`Error::Config`] if
/// it is not valid TOML.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Saves the configuration to the default path.
///
/// # Errors
///
/// Returns an error if the config directory cannot be determined or written.
pub fn save(config: &Config) -> Result<()> {
    let path = get_config_path_with_override(None)
        .ok_or_else(|| Error::Config("no config directory available".to_string()))?;
    save_to_path(config, &path)
}

/// Saves configuration to a specific path, creating parent directories.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn save_to_path(config: &Config, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = to_toml(config)?;
    fs::write(path, content)?;
    Ok(())
}

/// Renders the configuration as pretty TOML.
///
/// # Errors
///
/// Returns [`Error::Config`] if serialization fails.
pub fn to_toml(config: &Config) -> Result<String> {
    Ok(toml::to_string_pretty(config)?)
}
