// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Time to frame index conversion.

use crate::error::{AnnotateError, Result};

/// Frame index for `current_time` seconds at `fps`.
pub fn frame_index(current_time: f64, fps: Option<f64>) -> Result<u64> {
    let fps = fps.ok_or(AnnotateError::NoFps)?;
    Ok((current_time.max(0.0) * fps).round() as u64)
}

/// Seconds covered by a single frame at `fps`.
pub fn step_delta(fps: f64) -> f64 {
    1.0 / fps
}

/// Tracks the playback position from two feeds: the polled current time and
/// the timestamps of pictures actually presented. The presented timestamp
/// wins while it is fresh, because polled time is reconciled on a slower
/// cadence and can trail the screen by up to a frame.
#[derive(Debug, Default)]
pub struct FrameClock {
    polled: f64,
    presented: Option<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe_polled(&mut self, time: f64) {
        self.polled = time;
    }

    pub fn observe_presented(&mut self, media_time: f64) {
        self.presented = Some(media_time);
    }

    /// Forget the last presented timestamp, e.g. after a seek, until the
    /// next picture arrives.
    pub fn invalidate_presented(&mut self) {
        self.presented = None;
    }

    pub fn current_time(&self) -> f64 {
        self.presented.unwrap_or(self.polled)
    }

    pub fn uses_presented(&self) -> bool {
        self.presented.is_some()
    }

    pub fn frame_index(&self, fps: Option<f64>) -> Result<u64> {
        frame_index(self.current_time(), fps)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_index() {
        assert_eq!(frame_index(2.0, Some(30.0)), Ok(60));
        assert_eq!(frame_index(0.0, Some(30.0)), Ok(0));
        assert_eq!(frame_index(1.0, Some(29.97)), Ok(30));
        assert_eq!(frame_index(0.02, Some(25.0)), Ok(1));
    }

    #[test]
    fn test_frame_index_requires_fps() {
        assert_eq!(frame_index(2.0, None), Err(AnnotateError::NoFps));
    }

    #[test]
    fn test_step_delta() {
        assert!((step_delta(25.0) - 0.04).abs() < 1e-12);
        assert!((step_delta(30.0) - 1.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_presented_time_preferred() {
        let mut clock = FrameClock::new();
        clock.observe_polled(1.0);
        assert_eq!(clock.frame_index(Some(30.0)), Ok(30));

        clock.observe_presented(1.0 + 1.0 / 30.0);
        clock.observe_polled(1.0);
        assert!(clock.uses_presented());
        assert_eq!(clock.frame_index(Some(30.0)), Ok(31));

        clock.invalidate_presented();
        assert_eq!(clock.frame_index(Some(30.0)), Ok(30));
    }
}
