// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application settings.
//!
//! Settings come from an optional YAML file; every field has a default so
//! the file may list only what it changes. Command line flags are applied
//! on top.

use crate::io::media::MIN_PREVIEW_WIDTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Size of the overlay box when a video is first shown, in screen points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxSize {
    pub width: f64,
    pub height: f64,
}

impl Default for BoxSize {
    fn default() -> Self {
        Self {
            width: 100.0,
            height: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// The ffmpeg executable used for decoding and probing.
    pub ffmpeg_path: PathBuf,
    /// Upper bound on a frame rate probe run.
    pub probe_timeout_secs: u64,
    /// How many leading bytes of the video the probe decodes.
    pub probe_prefix_bytes: usize,
    /// Decoded pictures wider than this are downscaled for display; 0 keeps
    /// the native width.
    pub preview_max_width: u32,
    pub initial_box: BoxSize,
    /// Pre-filled value of the manual frame rate prompt.
    pub default_fps_prompt: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: PathBuf::from("ffmpeg"),
            probe_timeout_secs: 20,
            probe_prefix_bytes: 8 * 1024 * 1024,
            preview_max_width: 1280,
            initial_box: BoxSize::default(),
            default_fps_prompt: 30.0,
        }
    }
}

impl AppConfig {
    /// Load settings from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let mut config: Self = serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        if config.preview_max_width != 0 && config.preview_max_width < MIN_PREVIEW_WIDTH {
            log::warn!(
                "preview_max_width {} is too small, using {}",
                config.preview_max_width,
                MIN_PREVIEW_WIDTH
            );
            config.preview_max_width = MIN_PREVIEW_WIDTH;
        }
        Ok(config)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}
