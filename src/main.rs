// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! framebox - frame-by-frame bounding box annotation
//!
//! A desktop application for stepping through a local video one frame at a
//! time, placing a box over the picture and logging its native pixel
//! coordinates against the frame number.

mod app;
mod cli;
mod config;
mod error;
mod io;
mod models;
mod playback;
mod session;
mod ui;
mod util;

use anyhow::Result;
use app::FrameboxApp;
use cli::Args;
use config::AppConfig;

fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let args = Args::parse_args();
    let mut config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    if let Some(ffmpeg) = args.ffmpeg {
        config.ffmpeg_path = ffmpeg;
    }
    log::debug!("Using ffmpeg at {}", config.ffmpeg_path.display());

    // Configure egui options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([800.0, 600.0])
            .with_title("framebox"),
        ..Default::default()
    };

    let video = args.video;
    eframe::run_native(
        "framebox",
        options,
        Box::new(move |_cc| Ok(Box::new(FrameboxApp::new(config, video)))),
    )
    .map_err(|e| anyhow::anyhow!("Application error: {}", e))?;

    Ok(())
}
