// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The frame presentation loop.
//!
//! Each tick drains the pictures the source has presented, feeds their
//! timestamps to the clock, and asks to be re-armed. Stopping the loop is
//! explicit and final; the flag is checked before every re-arm so a torn
//! down session never keeps polling a stale source.

use super::clock::FrameClock;
use super::source::{PlaybackSource, PresentedFrame};
use std::time::Duration;

/// Re-arm delay while playing when the frame rate is unknown.
const PLAYING_INTERVAL: Duration = Duration::from_millis(10);
/// Re-arm delay while paused; only seek results arrive then.
const PAUSED_INTERVAL: Duration = Duration::from_millis(50);

/// Result of one loop iteration.
#[derive(Debug, Default)]
pub struct Tick {
    /// Most recent picture presented since the previous tick.
    pub frame: Option<PresentedFrame>,
    /// When to run the next tick; `None` once the loop is stopped.
    pub rearm: Option<Duration>,
}

#[derive(Debug)]
pub struct PresentationLoop {
    stopped: bool,
    ticks: u64,
}

impl PresentationLoop {
    pub fn start() -> Self {
        Self {
            stopped: false,
            ticks: 0,
        }
    }

    pub fn stop(&mut self) {
        if !self.stopped {
            log::debug!("Presentation loop stopped after {} ticks", self.ticks);
        }
        self.stopped = true;
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    pub fn tick(
        &mut self,
        source: &mut dyn PlaybackSource,
        clock: &mut FrameClock,
        fps: Option<f64>,
    ) -> Tick {
        if !self.is_running() {
            return Tick::default();
        }
        self.ticks += 1;

        clock.observe_polled(source.current_time());

        let mut latest = None;
        while let Some(frame) = source.take_presented() {
            clock.observe_presented(frame.media_time);
            latest = Some(frame);
        }

        let rearm = if source.is_paused() {
            Some(PAUSED_INTERVAL)
        } else {
            Some(match fps {
                Some(fps) if fps > 0.0 => Duration::from_secs_f64((0.5 / fps).min(0.1)),
                _ => PLAYING_INTERVAL,
            })
        };

        Tick {
            frame: latest,
            rearm,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::source::testing::FakeSource;

    #[test]
    fn test_tick_feeds_clock_with_latest_frame() {
        let mut source = FakeSource::new(0.04);
        let mut clock = FrameClock::new();
        let mut presentation = PresentationLoop::start();

        source.step_picture().unwrap();
        source.step_picture().unwrap();

        let tick = presentation.tick(&mut source, &mut clock, Some(25.0));

        let frame = tick.frame.unwrap();
        assert!((frame.media_time - 0.08).abs() < 1e-12);
        assert!(clock.uses_presented());
        assert_eq!(clock.frame_index(Some(25.0)), Ok(2));
        assert_eq!(tick.rearm, Some(PAUSED_INTERVAL));
    }

    #[test]
    fn test_playing_rearms_faster() {
        let mut source = FakeSource::new(0.04);
        source.paused = false;
        let mut clock = FrameClock::new();
        let mut presentation = PresentationLoop::start();

        let tick = presentation.tick(&mut source, &mut clock, Some(25.0));
        let delay = tick.rearm.unwrap().as_secs_f64();
        assert!((delay - 0.02).abs() < 1e-6);

        let tick = presentation.tick(&mut source, &mut clock, None);
        assert_eq!(tick.rearm, Some(PLAYING_INTERVAL));
    }

    #[test]
    fn test_stopped_loop_does_not_rearm() {
        let mut source = FakeSource::new(0.04);
        let mut clock = FrameClock::new();
        let mut presentation = PresentationLoop::start();
        presentation.stop();

        source.step_picture().unwrap();
        let tick = presentation.tick(&mut source, &mut clock, Some(25.0));

        assert!(tick.frame.is_none());
        assert!(tick.rearm.is_none());
        assert!(!presentation.is_running());
        assert!(!clock.uses_presented());
    }
}
