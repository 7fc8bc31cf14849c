// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Manual frame rate entry window.

/// State of the "Set FPS" window.
pub struct FpsPrompt {
    open: bool,
    text: String,
    reason: Option<String>,
}

impl FpsPrompt {
    pub fn new(default_fps: f64) -> Self {
        Self {
            open: false,
            text: format_fps(default_fps),
            reason: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the window, optionally explaining why it is needed.
    pub fn open(&mut self, reason: Option<String>) {
        self.open = true;
        self.reason = reason;
    }

    /// Show the window if open. Returns the submitted number.
    pub fn show(&mut self, ctx: &egui::Context) -> Option<f64> {
        if !self.open {
            return None;
        }

        let mut submitted = None;
        let mut cancelled = false;
        egui::Window::new("Set FPS")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                if let Some(reason) = &self.reason {
                    ui.label(egui::RichText::new(reason).color(egui::Color32::YELLOW));
                }
                let response = ui.text_edit_singleline(&mut self.text);
                response.request_focus();
                let parsed = parse_fps(&self.text);
                if parsed.is_none() {
                    ui.label(egui::RichText::new("Enter a positive number").weak());
                }

                let enter = response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
                ui.horizontal(|ui| {
                    if ui.add_enabled(parsed.is_some(), egui::Button::new("OK")).clicked()
                        || (enter && parsed.is_some())
                    {
                        submitted = parsed;
                    }
                    if ui.button("Cancel").clicked() || ui.input(|i| i.key_pressed(egui::Key::Escape)) {
                        cancelled = true;
                    }
                });
            });

        if submitted.is_some() || cancelled {
            self.open = false;
            self.reason = None;
        }
        submitted
    }
}

fn format_fps(fps: f64) -> String {
    if fps.fract() == 0.0 {
        format!("{:.0}", fps)
    } else {
        fps.to_string()
    }
}

/// Parse user input as a positive frame rate.
pub fn parse_fps(text: &str) -> Option<f64> {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|fps| fps.is_finite() && *fps > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fps() {
        assert_eq!(parse_fps(" 29.97 "), Some(29.97));
        assert_eq!(parse_fps("30"), Some(30.0));
        assert_eq!(parse_fps("0"), None);
        assert_eq!(parse_fps("-24"), None);
        assert_eq!(parse_fps("abc"), None);
        assert_eq!(parse_fps("inf"), None);
    }

    #[test]
    fn test_default_text() {
        assert_eq!(FpsPrompt::new(30.0).text, "30");
        assert_eq!(FpsPrompt::new(23.976).text, "23.976");
    }
}
