// SPDX-License-Identifier: MPL-2.0
//! `hazelift` removes haze from images and videos.
//!
//! Dark Channel Prior estimates (dark channel, atmospheric light and
//! transmission) are computed at a fixed working resolution and handed,
//! together with the hazy image, to a learned restoration model. The
//! restored image is resized back to the source resolution. Videos are
//! processed frame by frame at their native geometry and frame rate.
//!
//! The model is a dependency passed into [`media::Dehazer`], so any
//! [`application::port::RestorationModel`] can drive the pipeline.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod media;
pub mod paths;

#[cfg(test)]
pub(crate) mod test_utils;
