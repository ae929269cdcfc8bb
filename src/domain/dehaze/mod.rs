// SPDX-License-Identifier: MPL-2.0
//! Dehazing parameter types.
//!
//! Value objects for the Dark Channel Prior tuning knobs. Each newtype
//! clamps its input so the feature extractor never sees an invalid value.

pub mod newtypes;

pub use newtypes::{AtmosphericEpsilon, BrightestFraction, HazeCoefficient, WindowSize};
