// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline scrubber control.
//!
//! This module provides the timeline scrubber for navigating through the
//! video by time. Seeking is time-based; the frame shown is whichever
//! picture the decoder lands on.

/// Display the scrubber. Returns the time to seek to when dragged.
pub fn show(ui: &mut egui::Ui, current_time: f64, duration: Option<f64>) -> Option<f64> {
    let Some(duration) = duration.filter(|d| *d > 0.0) else {
        ui.label(format!("{:.3}s", current_time));
        return None;
    };

    let mut time = current_time.min(duration);
    let mut seek = None;
    ui.horizontal(|ui| {
        ui.spacing_mut().slider_width = (ui.available_width() - 160.0).max(100.0);
        let response = ui.add(
            egui::Slider::new(&mut time, 0.0..=duration)
                .show_value(false)
                .trailing_fill(true),
        );
        if response.changed() {
            seek = Some(time);
        }
        ui.monospace(format!("{:>9.3} / {:.3}s", current_time, duration));
    });
    seek
}
