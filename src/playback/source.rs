// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The playback source handle.
//!
//! Navigation and timing code talks to the video only through this trait.
//! The session owns the handle and drops it on teardown.

use crate::models::annotation::NativeSize;
use anyhow::Result;
use image::RgbaImage;

/// A decoded picture together with the media time it belongs to.
#[derive(Clone)]
pub struct PresentedFrame {
    /// Exact media timestamp of this picture, in seconds.
    pub media_time: f64,
    /// The picture, possibly downscaled from the native size for display.
    pub image: RgbaImage,
}

impl std::fmt::Debug for PresentedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentedFrame")
            .field("media_time", &self.media_time)
            .field("dimensions", &self.image.dimensions())
            .finish()
    }
}

/// Time-based playback primitive.
pub trait PlaybackSource {
    /// Intrinsic dimensions, once metadata is known.
    fn native_size(&self) -> Option<NativeSize>;

    /// Total duration in seconds, if known.
    fn duration(&self) -> Option<f64>;

    /// Polled playback position in seconds. May lag what is on screen.
    fn current_time(&self) -> f64;

    /// Seek to `time` seconds. Seeking is time-based, not frame-indexed.
    fn seek(&mut self, time: f64) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    /// Advance by exactly one decoded picture, whatever its duration.
    fn step_picture(&mut self) -> Result<()>;

    /// Next picture rendered since the last call, if any.
    fn take_presented(&mut self) -> Option<PresentedFrame>;
}
