// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Model**: Restoration model location and working resolution
//! - **Dehaze**: Dark Channel Prior parameters
//! - **Video**: Encoding and progress reporting
//! - **Output**: Artifact directory and per-job file names

use crate::domain::dehaze::newtypes::{
    epsilon_bounds, fraction_bounds, omega_bounds, window_bounds,
};

// ==========================================================================
// Model Defaults
// ==========================================================================

/// Default restoration model filename, resolved inside the data directory.
pub const DEFAULT_MODEL_FILENAME: &str = "dehaze.onnx";

/// Fixed working width the restoration model expects.
pub const DEFAULT_WORKING_WIDTH: u32 = 512;

/// Fixed working height the restoration model expects.
pub const DEFAULT_WORKING_HEIGHT: u32 = 512;

/// Largest accepted working dimension.
pub const MAX_WORKING_DIMENSION: u32 = 4096;

// ==========================================================================
// Dehaze Defaults
// ==========================================================================

/// Default dark channel window size.
pub const DEFAULT_WINDOW_SIZE: usize = window_bounds::DEFAULT;

/// Default haze coefficient ω.
pub const DEFAULT_OMEGA: f32 = omega_bounds::DEFAULT;

/// Default share of pixels used for the atmospheric light estimate (0.1%).
pub const DEFAULT_BRIGHTEST_FRACTION: f32 = fraction_bounds::DEFAULT;

/// Default floor for atmospheric light components.
pub const DEFAULT_ATMOSPHERIC_EPSILON: f32 = epsilon_bounds::DEFAULT;

// ==========================================================================
// Video Defaults
// ==========================================================================

/// Log a progress line every this many frames.
pub const DEFAULT_PROGRESS_INTERVAL: u64 = 10;

/// Default output bit rate in bits per second.
pub const DEFAULT_VIDEO_BIT_RATE: usize = 4_000_000;

/// Lowest accepted output bit rate.
pub const MIN_VIDEO_BIT_RATE: usize = 100_000;

/// Frame rate assumed when the container reports none.
pub const FALLBACK_FPS: f64 = 30.0;

// ==========================================================================
// Output Defaults
// ==========================================================================

/// Default directory for job inputs and outputs.
pub const DEFAULT_OUTPUT_DIR: &str = "uploads";

/// Default file name of a dehazed image.
pub const DEFAULT_IMAGE_OUTPUT_NAME: &str = "dehazed_image.png";

/// Default file name of a dehazed video.
pub const DEFAULT_VIDEO_OUTPUT_NAME: &str = "dehazed_video.mp4";

/// Stored upload name for image jobs, removed by cleanup.
pub const IMAGE_UPLOAD_NAME: &str = "image.jpg";

/// Stored upload name for video jobs, removed by cleanup.
pub const VIDEO_UPLOAD_NAME: &str = "video.mp4";

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    assert!(DEFAULT_WORKING_WIDTH > 0);
    assert!(DEFAULT_WORKING_HEIGHT > 0);
    assert!(DEFAULT_WORKING_WIDTH <= MAX_WORKING_DIMENSION);
    assert!(DEFAULT_WORKING_HEIGHT <= MAX_WORKING_DIMENSION);

    assert!(DEFAULT_WINDOW_SIZE % 2 == 1);
    assert!(DEFAULT_WINDOW_SIZE >= window_bounds::MIN);
    assert!(DEFAULT_WINDOW_SIZE <= window_bounds::MAX);

    assert!(DEFAULT_PROGRESS_INTERVAL > 0);
    assert!(DEFAULT_VIDEO_BIT_RATE >= MIN_VIDEO_BIT_RATE);
};
