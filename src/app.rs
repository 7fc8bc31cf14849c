// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! This module contains the main application structure that implements
//! the egui::App trait. It owns the annotation session for the loaded
//! video and routes toolbar, panel, canvas and keyboard input into it.

use crate::config::AppConfig;
use crate::error::AnnotateError;
use crate::io::media::FfmpegSource;
use crate::io::probe::{spawn_probe, ProbeRequest};
use crate::io::serialization;
use crate::session::Session;
use crate::ui::canvas;
use crate::ui::fps_prompt::FpsPrompt;
use crate::ui::properties::{self, PropertiesAction};
use crate::ui::shortcuts::{self, Action};
use crate::ui::{timeline, toolbar};
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};

/// Result of background video loading.
struct LoadedVideo {
    name: String,
    path: PathBuf,
    source: FfmpegSource,
}

/// Main application state.
pub struct FrameboxApp {
    config: AppConfig,

    /// Session for the loaded video, if any
    session: Option<Session>,

    /// Path of the loaded video, used for the probe
    video_path: Option<PathBuf>,

    /// Texture holding the latest presented picture
    frame_texture: Option<egui::TextureHandle>,

    /// Receiver for background video loading
    loader: Option<Receiver<Result<LoadedVideo, String>>>,

    /// Loading state message
    loading_message: Option<String>,

    fps_prompt: FpsPrompt,

    /// Last outcome worth telling the user about
    status: Option<String>,
}

impl FrameboxApp {
    /// Create a new application instance, optionally opening a video.
    pub fn new(config: AppConfig, video: Option<PathBuf>) -> Self {
        let fps_prompt = FpsPrompt::new(config.default_fps_prompt);
        let mut app = Self {
            config,
            session: None,
            video_path: None,
            frame_texture: None,
            loader: None,
            loading_message: None,
            fps_prompt,
            status: None,
        };
        if let Some(path) = video {
            app.open_video(path);
        }
        app
    }

    /// Load a video file (asynchronously).
    pub fn open_video(&mut self, path: PathBuf) {
        let (sender, receiver) = channel();
        self.loader = Some(receiver);
        self.loading_message = Some(format!("Opening {}...", path.display()));

        let config = self.config.clone();
        std::thread::spawn(move || {
            let result = FfmpegSource::open(&config, &path)
                .map(|source| LoadedVideo {
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| path.display().to_string()),
                    path: path.clone(),
                    source,
                })
                .map_err(|e| format!("{:#}", e));
            let _ = sender.send(result);
        });
    }

    /// Replace the current session. The old one is torn down first.
    fn install(&mut self, loaded: LoadedVideo) {
        self.close_video();
        log::info!("Loaded {}", loaded.path.display());
        self.session = Some(Session::new(
            loaded.name,
            Box::new(loaded.source),
            self.config.initial_box,
        ));
        self.video_path = Some(loaded.path);
        self.status = Some("Set, estimate or probe the FPS to start annotating".to_string());
    }

    fn close_video(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.teardown();
        }
        self.video_path = None;
        self.frame_texture = None;
    }

    fn report(&mut self, err: AnnotateError) {
        log::warn!("{}", err);
        match err {
            AnnotateError::NoFps | AnnotateError::ProbeFailure(_) => {
                self.fps_prompt.open(Some(err.to_string()));
            }
            _ => {}
        }
        self.status = Some(err.to_string());
    }

    fn perform(&mut self, action: Action) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let result = match action {
            Action::StepBackward => session.step_backward().map(|_| None),
            Action::StepForward => session.step_forward().map(|_| None),
            Action::TogglePlayPause => session.toggle_play_pause().map(|_| None),
            Action::LogEntry => session.log_entry().map(|_| None),
            Action::EstimateFps => session
                .estimate_fps()
                .map(|_| Some("Estimating FPS...".to_string())),
            Action::SetFps => {
                self.fps_prompt.open(None);
                Ok(None)
            }
            Action::ProbeFps => {
                if let Some(path) = &self.video_path {
                    session.attach_probe(spawn_probe(ProbeRequest::new(&self.config, path)));
                }
                Ok(Some("Probing FPS...".to_string()))
            }
        };

        match result {
            Ok(Some(message)) => self.status = Some(message),
            Ok(None) => {}
            Err(e) => self.report(e),
        }
    }

    fn export_csv(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .set_file_name(serialization::csv_file_name(session.media_name()))
            .save_file()
        else {
            return;
        };

        match serialization::export_csv(session.entries().list(), &path) {
            Ok(_) => {
                log::info!("Exported {} entries to {}", session.entries().len(), path.display());
                self.status = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to export entries: {:#}", e);
                self.status = Some(format!("Export failed: {}", e));
            }
        }
    }

    /// Export the project snapshot; the format follows the file extension.
    fn export_project(&mut self, path: PathBuf) {
        let Some(session) = &self.session else {
            return;
        };
        let project = session.project();
        let extension = path.extension().and_then(|s| s.to_str());
        let result = match extension {
            Some("yaml") | Some("yml") => serialization::export_yaml(&project, &path),
            Some("json") => serialization::export_json(&project, &path),
            _ => {
                log::error!("Unsupported file extension: {:?}", extension);
                return;
            }
        };

        match result {
            Ok(_) => log::info!("Exported project to {}", path.display()),
            Err(e) => log::error!("Failed to export project: {}", e),
        }
    }

    fn poll_loader(&mut self) {
        let Some(receiver) = &self.loader else {
            return;
        };
        let Ok(result) = receiver.try_recv() else {
            return;
        };
        self.loader = None;
        self.loading_message = None;

        match result {
            Ok(loaded) => self.install(loaded),
            Err(e) => {
                log::error!("Failed to open video: {}", e);
                self.status = Some(e);
            }
        }
    }

    /// Drive the presentation loop and pick up background results.
    fn poll_session(&mut self, ctx: &egui::Context) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Some(result) = session.poll_probe() {
            match result {
                Ok(fps) => self.status = Some(format!("FPS {}", fps)),
                Err(e) => self.report(e),
            }
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        let tick = session.tick();
        if let Some(result) = session.poll_estimate() {
            match result {
                Ok(fps) => self.status = Some(format!("FPS {}", fps)),
                Err(e) => self.report(e),
            }
        }
        if let Some(frame) = tick.frame {
            let (width, height) = frame.image.dimensions();
            let image = egui::ColorImage::from_rgba_unmultiplied(
                [width as usize, height as usize],
                frame.image.as_raw(),
            );
            match &mut self.frame_texture {
                Some(texture) => texture.set(image, egui::TextureOptions::LINEAR),
                None => {
                    self.frame_texture =
                        Some(ctx.load_texture("video_frame", image, egui::TextureOptions::LINEAR));
                }
            }
        }
        if let Some(delay) = tick.rearm {
            ctx.request_repaint_after(delay);
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Video...").clicked() {
                        if let Some(path) = rfd::FileDialog::new()
                            .add_filter("Videos", &["mp4", "mov", "mkv", "webm", "avi", "m4v"])
                            .pick_file()
                        {
                            self.open_video(path);
                        }
                        ui.close_menu();
                    }
                    ui.separator();
                    let loaded = self.session.is_some();
                    if ui
                        .add_enabled(loaded, egui::Button::new("Download CSV..."))
                        .clicked()
                    {
                        self.export_csv();
                        ui.close_menu();
                    }
                    ui.add_enabled_ui(loaded, |ui| {
                        ui.menu_button("Export Project", |ui| {
                            if ui.button("Export as YAML...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("YAML", &["yaml", "yml"])
                                    .set_file_name("project.yaml")
                                    .save_file()
                                {
                                    self.export_project(path);
                                }
                                ui.close_menu();
                            }
                            if ui.button("Export as JSON...").clicked() {
                                if let Some(path) = rfd::FileDialog::new()
                                    .add_filter("JSON", &["json"])
                                    .set_file_name("project.json")
                                    .save_file()
                                {
                                    self.export_project(path);
                                }
                                ui.close_menu();
                            }
                        });
                    });
                    ui.separator();
                    if ui.add_enabled(loaded, egui::Button::new("Close Video")).clicked() {
                        self.close_video();
                        ui.close_menu();
                    }
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });
    }
}

impl eframe::App for FrameboxApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_loader();
        self.poll_session(ctx);

        // Request repaint if still loading (to update spinner)
        if self.loading_message.is_some() {
            ctx.request_repaint();
        }

        self.menu_bar(ctx);

        let mut actions = Vec::new();

        if let Some(session) = &self.session {
            egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
                if let Some(action) = toolbar::show(
                    ui,
                    session.playback_state(),
                    session.is_probing(),
                    session.is_estimating(),
                ) {
                    actions.push(action);
                }
            });
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status.as_deref().unwrap_or("Ready"));
            });
        });

        let mut seek = None;
        if let Some(session) = &self.session {
            egui::TopBottomPanel::bottom("timeline").show(ctx, |ui| {
                seek = timeline::show(ui, session.current_time(), session.duration());
            });
        }

        let mut properties_action = PropertiesAction::None;
        if let Some(session) = &self.session {
            properties_action = egui::SidePanel::right("properties")
                .default_width(280.0)
                .show(ctx, |ui| properties::show(ui, session))
                .inner;
        }

        let canvas_output = egui::CentralPanel::default()
            .show(ctx, |ui| {
                if let Some(ref message) = self.loading_message {
                    ui.centered_and_justified(|ui| {
                        ui.vertical_centered(|ui| {
                            ui.add_space(20.0);
                            ui.spinner();
                            ui.add_space(10.0);
                            ui.label(
                                egui::RichText::new(message)
                                    .size(16.0)
                                    .color(egui::Color32::from_gray(200)),
                            );
                        });
                    });
                    None
                } else if let Some(session) = &self.session {
                    Some(canvas::show(
                        ui,
                        self.frame_texture.as_ref(),
                        session.native_size(),
                        session.display_rect(),
                    ))
                } else {
                    welcome(ui);
                    None
                }
            })
            .inner;

        if !self.fps_prompt.is_open() {
            actions.extend(shortcuts::pressed(ctx));
        }

        if let Some(session) = self.session.as_mut() {
            if let Some(output) = canvas_output {
                if let Some(viewport) = output.viewport {
                    session.set_viewport(viewport);
                }
                if let Some(delta) = output.moved {
                    session.drag_box(delta.x as f64, delta.y as f64);
                }
                if let Some(delta) = output.resized {
                    session.resize_box(delta.x as f64, delta.y as f64);
                }
            }

            let result = match properties_action {
                PropertiesAction::SelectEntry(id) => session.select_entry(id).map(|_| ()),
                PropertiesAction::RemoveEntry(id) => {
                    session.remove_entry(id);
                    Ok(())
                }
                PropertiesAction::None => Ok(()),
            };
            let result = result.and_then(|_| match seek {
                Some(time) => session.seek_to_time(time).map(|_| ()),
                None => Ok(()),
            });
            if let Err(e) = result {
                self.report(e);
            }
        }

        for action in actions {
            self.perform(action);
        }

        if let Some(fps) = self.fps_prompt.show(ctx) {
            if let Some(session) = self.session.as_mut() {
                match session.set_manual_fps(fps) {
                    Ok(value) => self.status = Some(format!("FPS {}", value)),
                    Err(e) => self.report(e),
                }
            }
        }
    }
}

/// Message shown when no video is loaded.
fn welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("framebox")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Frame-by-frame bounding box annotation")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("File → Open Video...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}
