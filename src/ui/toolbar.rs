// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with playback and annotation commands.

use super::shortcuts::Action;
use crate::playback::navigation::PlaybackState;

/// Display the toolbar. Returns the command clicked, if any.
pub fn show(
    ui: &mut egui::Ui,
    state: PlaybackState,
    probing: bool,
    estimating: bool,
) -> Option<Action> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let play_label = match state {
            PlaybackState::Playing => "⏸ Pause (space)",
            PlaybackState::Paused => "▶ Play (space)",
        };
        if ui.button(play_label).clicked() {
            action = Some(Action::TogglePlayPause);
        }
        if ui.button("⏮ Prev frame (←)").clicked() {
            action = Some(Action::StepBackward);
        }
        if ui.button("⏭ Next frame (→)").clicked() {
            action = Some(Action::StepForward);
        }

        ui.separator();

        if ui.button("✚ Log entry (w)").clicked() {
            action = Some(Action::LogEntry);
        }

        ui.separator();

        ui.label("FPS:");
        if ui.button("Set (f)").clicked() {
            action = Some(Action::SetFps);
        }
        if ui
            .add_enabled(!estimating, egui::Button::new("Estimate (q)"))
            .on_hover_text("Advance one picture and time it. Approximate.")
            .clicked()
        {
            action = Some(Action::EstimateFps);
        }
        if ui
            .add_enabled(!probing, egui::Button::new("Probe (p)"))
            .on_hover_text("Decode the start of the file with ffmpeg")
            .clicked()
        {
            action = Some(Action::ProbeFps);
        }
        if probing || estimating {
            ui.spinner();
        }
    });

    action
}
