// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame stepping, play/pause and seeking.
//!
//! Seeking is time-based: a step moves the playback time by `1 / fps`
//! seconds and repeated steps may drift by a fraction of a frame from true
//! frame boundaries. The drift is reported through the returned times, not
//! corrected.

use super::clock::{step_delta, FrameClock};
use super::fps::FpsValue;
use super::source::PlaybackSource;
use crate::error::{AnnotateError, Result};

/// Playback state. Starts paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    Playing,
    #[default]
    Paused,
}

/// Issues navigation commands against the session's playback source.
#[derive(Debug, Default)]
pub struct NavigationController {
    state: PlaybackState,
}

impl NavigationController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Pick up play/pause changes made through the source itself.
    pub fn sync(&mut self, source: &dyn PlaybackSource) {
        self.state = if source.is_paused() {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        };
    }

    /// Move forward one frame. Returns the new playback time.
    pub fn step_forward(
        &mut self,
        source: &mut dyn PlaybackSource,
        clock: &mut FrameClock,
        fps: FpsValue,
    ) -> Result<f64> {
        let delta = step_delta(fps.require()?);
        self.step_by(source, clock, delta)
    }

    /// Move back one frame. Returns the new playback time.
    pub fn step_backward(
        &mut self,
        source: &mut dyn PlaybackSource,
        clock: &mut FrameClock,
        fps: FpsValue,
    ) -> Result<f64> {
        let delta = step_delta(fps.require()?);
        self.step_by(source, clock, -delta)
    }

    pub fn toggle_play_pause(&mut self, source: &mut dyn PlaybackSource) -> Result<PlaybackState> {
        if source.is_paused() {
            source.play().map_err(AnnotateError::playback)?;
            self.state = PlaybackState::Playing;
        } else {
            source.pause();
            self.state = PlaybackState::Paused;
        }
        log::debug!("Playback {:?}", self.state);
        Ok(self.state)
    }

    /// Seek to the start time of frame `index`. Approximate: the source may
    /// land on a neighbouring picture.
    pub fn seek_to_frame(
        &mut self,
        source: &mut dyn PlaybackSource,
        clock: &mut FrameClock,
        fps: FpsValue,
        index: u64,
    ) -> Result<f64> {
        let fps = fps.require()?;
        self.seek_to_time(source, clock, index as f64 / fps)
    }

    /// Seek to `time` seconds, clamped to the media's extent.
    pub fn seek_to_time(
        &mut self,
        source: &mut dyn PlaybackSource,
        clock: &mut FrameClock,
        time: f64,
    ) -> Result<f64> {
        let target = clamp_time(time, source.duration());
        source.seek(target).map_err(AnnotateError::playback)?;
        clock.invalidate_presented();
        clock.observe_polled(source.current_time());
        self.sync(source);
        Ok(target)
    }

    /// Start advancing one decoded picture for the frame rate estimate.
    /// Returns the media time stepped from; the time stepped to is the
    /// timestamp of the next presented picture.
    pub fn estimate_step(
        &mut self,
        source: &mut dyn PlaybackSource,
        clock: &mut FrameClock,
    ) -> Result<f64> {
        source.pause();
        let before = clock.current_time();
        source.step_picture().map_err(AnnotateError::playback)?;
        clock.invalidate_presented();
        clock.observe_polled(source.current_time());
        self.sync(source);
        Ok(before)
    }

    fn step_by(
        &mut self,
        source: &mut dyn PlaybackSource,
        clock: &mut FrameClock,
        delta: f64,
    ) -> Result<f64> {
        source.pause();
        let target = clock.current_time() + delta;
        self.seek_to_time(source, clock, target)
    }
}

fn clamp_time(time: f64, duration: Option<f64>) -> f64 {
    let time = time.max(0.0);
    match duration {
        Some(d) if d > 0.0 => time.min(d),
        _ => time,
    }
}
