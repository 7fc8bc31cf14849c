// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Keyboard shortcuts.

/// A user command, bound to a key and usually to a button as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StepBackward,
    StepForward,
    LogEntry,
    SetFps,
    TogglePlayPause,
    EstimateFps,
    ProbeFps,
}

pub const BINDINGS: [(egui::Key, Action); 7] = [
    (egui::Key::ArrowLeft, Action::StepBackward),
    (egui::Key::ArrowRight, Action::StepForward),
    (egui::Key::W, Action::LogEntry),
    (egui::Key::F, Action::SetFps),
    (egui::Key::Space, Action::TogglePlayPause),
    (egui::Key::Q, Action::EstimateFps),
    (egui::Key::P, Action::ProbeFps),
];

/// Actions whose keys were pressed this frame, in binding order.
///
/// Nothing is reported while a text field has focus, so typing a frame
/// rate does not step the video.
pub fn pressed(ctx: &egui::Context) -> Vec<Action> {
    if ctx.wants_keyboard_input() {
        return Vec::new();
    }
    ctx.input(|i| {
        BINDINGS
            .iter()
            .filter(|(key, _)| i.key_pressed(*key) && i.modifiers.is_none())
            .map(|(_, action)| *action)
            .collect()
    })
}
