// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation session state.
//!
//! A session owns everything tied to one loaded video: the playback source
//! handle, the clock, the frame rate, the overlay box and the entry log.
//! All of it is mutated from the UI thread only and torn down together.

use crate::config::BoxSize;
use crate::error::{AnnotateError, ProbeFailure, Result};
use crate::models::annotation::{DisplayRect, EntryId, NativeCoords, NativeSize, Rect, ViewportRect};
use crate::models::entry_log::EntryLog;
use crate::models::project::ProjectData;
use crate::playback::clock::FrameClock;
use crate::playback::fps::{FpsResolver, FpsStrategy, FpsValue};
use crate::playback::navigation::{NavigationController, PlaybackState};
use crate::playback::presentation::{PresentationLoop, Tick};
use crate::playback::source::PlaybackSource;
use crate::util::geometry::{map_to_native, rescale_display};
use std::sync::mpsc::{Receiver, TryRecvError};

/// Smallest box edge, in screen points.
const MIN_BOX_EDGE: f64 = 4.0;

pub struct Session {
    media_name: String,
    source: Box<dyn PlaybackSource>,
    native: NativeSize,
    clock: FrameClock,
    fps: FpsResolver,
    nav: NavigationController,
    entries: EntryLog,
    presentation: PresentationLoop,
    initial_box: BoxSize,
    display: DisplayRect,
    viewport: Option<ViewportRect>,
    probe: Option<Receiver<std::result::Result<f64, ProbeFailure>>>,
    /// Media time an estimate step started from, until its picture arrives.
    estimating_from: Option<f64>,
    estimate: Option<Result<FpsValue>>,
}

impl Session {
    pub fn new(media_name: String, source: Box<dyn PlaybackSource>, initial_box: BoxSize) -> Self {
        let native = source.native_size().unwrap_or_default();
        let mut clock = FrameClock::new();
        clock.observe_polled(source.current_time());
        let mut nav = NavigationController::new();
        nav.sync(source.as_ref());
        Self {
            media_name,
            source,
            native,
            clock,
            fps: FpsResolver::new(),
            nav,
            entries: EntryLog::new(),
            presentation: PresentationLoop::start(),
            initial_box,
            display: Rect::new(0.0, 0.0, initial_box.width, initial_box.height),
            viewport: None,
            probe: None,
            estimating_from: None,
            estimate: None,
        }
    }

    pub fn media_name(&self) -> &str {
        &self.media_name
    }

    pub fn native_size(&self) -> NativeSize {
        self.native
    }

    pub fn duration(&self) -> Option<f64> {
        self.source.duration()
    }

    pub fn current_time(&self) -> f64 {
        self.clock.current_time()
    }

    pub fn fps(&self) -> FpsValue {
        self.fps.value()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.nav.state()
    }

    pub fn entries(&self) -> &EntryLog {
        &self.entries
    }

    pub fn display_rect(&self) -> DisplayRect {
        self.display
    }

    pub fn is_probing(&self) -> bool {
        self.probe.is_some()
    }

    pub fn is_estimating(&self) -> bool {
        self.estimating_from.is_some()
    }

    /// Whether the current time comes from a presented picture rather than
    /// the polled position.
    pub fn uses_presented_time(&self) -> bool {
        self.clock.uses_presented()
    }

    /// Frame currently on screen.
    pub fn frame_index(&self) -> Result<u64> {
        self.clock.frame_index(self.fps.value().fps())
    }

    /// The overlay box in native pixels.
    pub fn coords(&self) -> Result<NativeCoords> {
        let viewport = self.viewport.ok_or(AnnotateError::DegenerateScale)?;
        map_to_native(&self.display, &viewport, self.native)
    }

    /// Record the latest layout of the video surface. The box follows the
    /// picture when the surface moves or changes size.
    pub fn set_viewport(&mut self, viewport: ViewportRect) {
        match self.viewport {
            Some(old) if old == viewport => return,
            Some(old) => self.display = rescale_display(&self.display, &old, &viewport),
            None => {
                self.display = Rect::new(
                    viewport.x,
                    viewport.y,
                    self.initial_box.width,
                    self.initial_box.height,
                );
            }
        }
        self.viewport = Some(viewport);
    }

    pub fn drag_box(&mut self, dx: f64, dy: f64) {
        self.display.x += dx;
        self.display.y += dy;
    }

    /// Resize from the bottom-right corner.
    pub fn resize_box(&mut self, dw: f64, dh: f64) {
        self.display.width = (self.display.width + dw).max(MIN_BOX_EDGE);
        self.display.height = (self.display.height + dh).max(MIN_BOX_EDGE);
    }

    /// Append the current (frame, box) pair to the log.
    pub fn log_entry(&mut self) -> Result<EntryId> {
        let frame = self.frame_index()?;
        let coords = self.coords()?;
        Ok(self.entries.append(frame, coords))
    }

    pub fn remove_entry(&mut self, id: EntryId) {
        self.entries.remove(id);
    }

    /// Navigate to the frame of a logged entry.
    pub fn select_entry(&mut self, id: EntryId) -> Result<f64> {
        let Some(frame) = self.entries.get(id).map(EntryLog::seek_target) else {
            return Ok(self.clock.current_time());
        };
        self.seek_to_frame(frame)
    }

    pub fn step_forward(&mut self) -> Result<f64> {
        self.estimating_from = None;
        self.nav
            .step_forward(self.source.as_mut(), &mut self.clock, self.fps.value())
    }

    pub fn step_backward(&mut self) -> Result<f64> {
        self.estimating_from = None;
        self.nav
            .step_backward(self.source.as_mut(), &mut self.clock, self.fps.value())
    }

    pub fn toggle_play_pause(&mut self) -> Result<PlaybackState> {
        self.estimating_from = None;
        self.nav.toggle_play_pause(self.source.as_mut())
    }

    pub fn seek_to_frame(&mut self, index: u64) -> Result<f64> {
        self.estimating_from = None;
        self.nav
            .seek_to_frame(self.source.as_mut(), &mut self.clock, self.fps.value(), index)
    }

    pub fn seek_to_time(&mut self, time: f64) -> Result<f64> {
        self.estimating_from = None;
        self.nav.seek_to_time(self.source.as_mut(), &mut self.clock, time)
    }

    /// Step one decoded picture to estimate the frame rate. The estimate
    /// is resolved by [`Session::tick`] once the picture is presented and
    /// picked up with [`Session::poll_estimate`].
    pub fn estimate_fps(&mut self) -> Result<()> {
        let before = self.nav.estimate_step(self.source.as_mut(), &mut self.clock)?;
        self.estimating_from = Some(before);
        self.estimate = None;
        Ok(())
    }

    /// Take the estimate result if the stepped picture has arrived.
    pub fn poll_estimate(&mut self) -> Option<Result<FpsValue>> {
        self.estimate.take()
    }

    pub fn set_manual_fps(&mut self, fps: f64) -> Result<FpsValue> {
        self.fps.resolve(FpsStrategy::Manual(fps))
    }

    /// Wait for a probe result in the background. A newer probe replaces
    /// a pending one.
    pub fn attach_probe(&mut self, receiver: Receiver<std::result::Result<f64, ProbeFailure>>) {
        self.probe = Some(receiver);
    }

    /// Apply the probe result if it has arrived.
    pub fn poll_probe(&mut self) -> Option<Result<FpsValue>> {
        let receiver = self.probe.as_ref()?;
        let result = match receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => {
                Err(ProbeFailure::Io("probe worker exited without a result".to_string()))
            }
        };
        self.probe = None;
        Some(self.fps.resolve(FpsStrategy::Probe(result)))
    }

    /// Run one iteration of the presentation loop.
    pub fn tick(&mut self) -> Tick {
        let tick = self
            .presentation
            .tick(self.source.as_mut(), &mut self.clock, self.fps.value().fps());
        self.nav.sync(self.source.as_ref());
        if let (Some(before), Some(frame)) = (self.estimating_from, &tick.frame) {
            self.estimating_from = None;
            let after = frame.media_time;
            self.estimate = Some(self.fps.resolve(FpsStrategy::Estimate { before, after }));
        }
        tick
    }

    /// Stop everything tied to this video. The session is unusable after.
    pub fn teardown(&mut self) {
        self.presentation.stop();
        self.source.pause();
        self.probe = None;
        self.estimating_from = None;
        self.estimate = None;
        self.entries.clear();
        self.fps.reset();
        self.clock.reset();
        log::info!("Closed {}", self.media_name);
    }

    pub fn project(&self) -> ProjectData {
        ProjectData::new(
            self.media_name.clone(),
            self.native,
            self.fps.value(),
            self.entries.list(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::fps::Provenance;
    use crate::playback::source::testing::FakeSource;
    use std::sync::mpsc::channel;

    fn session() -> Session {
        let mut source = FakeSource::new(0.04);
        source.size = NativeSize::new(1920, 1080);
        let mut session = Session::new("clip.mp4".to_string(), Box::new(source), BoxSize::default());
        session.set_viewport(Rect::new(0.0, 0.0, 800.0, 450.0));
        session
    }

    #[test]
    fn test_box_starts_at_viewport_origin() {
        let session = session();
        assert_eq!(session.display_rect(), Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(
            session.coords().unwrap(),
            NativeCoords {
                x1: 0,
                y1: 0,
                x2: 240,
                y2: 240
            }
        );
    }

    #[test]
    fn test_log_entry_requires_fps() {
        let mut session = session();
        assert_eq!(session.log_entry(), Err(AnnotateError::NoFps));
        assert!(session.entries().is_empty());
    }

    #[test]
    fn test_log_entry_records_frame_and_box() {
        let mut session = session();
        session.set_manual_fps(30.0).unwrap();
        session.drag_box(100.0, 100.0);
        session.resize_box(100.0, 50.0);
        session.seek_to_time(2.0).unwrap();

        let id = session.log_entry().unwrap();

        let entry = session.entries().get(id).unwrap();
        assert_eq!(entry.frame, 60);
        assert_eq!(
            entry.coords,
            NativeCoords {
                x1: 240,
                y1: 240,
                x2: 720,
                y2: 600
            }
        );
    }

    #[test]
    fn test_viewport_resize_keeps_coords() {
        let mut session = session();
        session.drag_box(100.0, 100.0);
        let before = session.coords().unwrap();

        session.set_viewport(Rect::new(160.0, 0.0, 1600.0, 900.0));

        assert_eq!(session.coords().unwrap(), before);
    }

    #[test]
    fn test_coords_before_layout() {
        let source = FakeSource::new(0.04);
        let session = Session::new("clip.mp4".to_string(), Box::new(source), BoxSize::default());
        assert_eq!(session.coords(), Err(AnnotateError::DegenerateScale));
    }

    #[test]
    fn test_resize_has_minimum() {
        let mut session = session();
        session.resize_box(-500.0, -500.0);
        let rect = session.display_rect();
        assert_eq!((rect.width, rect.height), (MIN_BOX_EDGE, MIN_BOX_EDGE));
    }

    #[test]
    fn test_select_entry_seeks_to_its_frame() {
        let mut session = session();
        session.set_manual_fps(25.0).unwrap();
        session.seek_to_time(3.0).unwrap();
        let id = session.log_entry().unwrap();
        session.seek_to_time(0.0).unwrap();

        let t = session.select_entry(id).unwrap();

        assert!((t - 3.0).abs() < 1e-9);
        assert_eq!(session.frame_index(), Ok(75));
    }

    #[test]
    fn test_estimate_fps_resolves_when_picture_arrives() {
        let mut session = session();
        session.estimate_fps().unwrap();
        assert!(session.is_estimating());
        assert!(session.poll_estimate().is_none());
        assert_eq!(session.fps().provenance(), Provenance::Unknown);

        session.tick();

        let value = session.poll_estimate().unwrap().unwrap();
        assert_eq!(value.provenance(), Provenance::Estimated);
        assert!((value.fps().unwrap() - 25.0).abs() < 1e-6);
        assert!(!session.is_estimating());
        assert!(session.uses_presented_time());
        assert!(session.poll_estimate().is_none());
    }

    #[test]
    fn test_seek_abandons_pending_estimate() {
        let mut session = session();
        session.estimate_fps().unwrap();
        session.seek_to_time(5.0).unwrap();
        assert!(!session.is_estimating());

        session.tick();

        assert!(session.poll_estimate().is_none());
        assert_eq!(session.fps().provenance(), Provenance::Unknown);
    }

    #[test]
    fn test_probe_result_is_applied_once() {
        let mut session = session();
        let (sender, receiver) = channel();
        session.attach_probe(receiver);
        assert!(session.poll_probe().is_none());
        assert!(session.is_probing());

        sender.send(Ok(23.976)).unwrap();
        let value = session.poll_probe().unwrap().unwrap();
        assert_eq!(value.provenance(), Provenance::Probed);
        assert!(!session.is_probing());
        assert!(session.poll_probe().is_none());
    }

    #[test]
    fn test_probe_worker_vanishing_is_a_failure() {
        let mut session = session();
        let (sender, receiver) = channel();
        session.attach_probe(receiver);
        drop(sender);

        let result = session.poll_probe().unwrap();
        assert!(matches!(result, Err(AnnotateError::ProbeFailure(ProbeFailure::Io(_)))));
        assert_eq!(session.fps().provenance(), Provenance::Unknown);
    }

    #[test]
    fn test_tick_and_teardown() {
        let mut session = session();
        session.set_manual_fps(25.0).unwrap();
        session.step_forward().unwrap();
        let tick = session.tick();
        assert!(tick.frame.is_some());
        assert!(tick.rearm.is_some());
        assert_eq!(session.frame_index(), Ok(1));

        session.log_entry().unwrap();
        session.teardown();

        assert!(session.entries().is_empty());
        assert_eq!(session.fps(), FpsValue::default());
        assert!(session.tick().rearm.is_none());
    }
}
