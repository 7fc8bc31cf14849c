// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video information and entry log panel.
//!
//! This module shows the loaded video's properties, the current frame and
//! box, and the logged entries. Clicking an entry seeks to its frame.

use crate::error::AnnotateError;
use crate::models::annotation::EntryId;
use crate::playback::fps::Provenance;
use crate::session::Session;

/// Result of interaction with the panel.
pub enum PropertiesAction {
    None,
    SelectEntry(EntryId),
    RemoveEntry(EntryId),
}

pub fn show(ui: &mut egui::Ui, session: &Session) -> PropertiesAction {
    let mut action = PropertiesAction::None;

    ui.heading(session.media_name());
    ui.separator();

    let native = session.native_size();
    ui.label(format!("Dimensions {}x{}", native.width, native.height));
    if let Some(duration) = session.duration() {
        ui.label(format!("Duration {:.4}s", duration));
    }
    let time_source = if session.uses_presented_time() {
        "From the last presented picture"
    } else {
        "Polled playback position"
    };
    ui.label(format!("Current time {:.4}s", session.current_time()))
        .on_hover_text(time_source);

    let fps = session.fps();
    if fps.provenance() == Provenance::Unknown {
        ui.colored_label(egui::Color32::YELLOW, "⚠ FPS unknown");
    } else if fps.is_approximate() {
        ui.colored_label(egui::Color32::YELLOW, format!("⚠ FPS {}", fps))
            .on_hover_text("Estimated from one picture step; set or probe for an exact value");
    } else {
        ui.label(format!("FPS {}", fps));
    }

    if let Ok(frame) = session.frame_index() {
        ui.label(format!("Frame {}", frame));
    }
    match session.coords() {
        Ok(coords) => ui.label(format!("Box {}", coords)),
        Err(AnnotateError::DegenerateScale) => ui.label("Box -"),
        Err(e) => ui.label(format!("Box: {}", e)),
    };

    ui.separator();
    ui.label(
        egui::RichText::new(format!("Entries ({})", session.entries().len())).strong(),
    );
    ui.label(egui::RichText::new("frame,x1,y1,x2,y2").weak().monospace());

    if session.entries().is_empty() {
        ui.label(egui::RichText::new("Press W to log the box at this frame").weak());
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui| {
            for entry in session.entries().list() {
                ui.horizontal(|ui| {
                    let text = egui::RichText::new(format!("{},{}", entry.frame, entry.coords))
                        .monospace();
                    if ui
                        .selectable_label(false, text)
                        .on_hover_text(format!("Entry {}: go to this frame", entry.id.value()))
                        .clicked()
                    {
                        action = PropertiesAction::SelectEntry(entry.id);
                    }
                    if ui.small_button("✕").on_hover_text("Remove entry").clicked() {
                        action = PropertiesAction::RemoveEntry(entry.id);
                    }
                });
            }
        });

    action
}
