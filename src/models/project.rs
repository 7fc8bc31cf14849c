// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Project snapshot for serialization.
//!
//! A snapshot captures everything known about the annotated video at
//! export time: where it came from, its native size, the frame rate and
//! how it was obtained, and the logged entries in order.

use super::annotation::{Entry, NativeSize};
use crate::playback::fps::FpsValue;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectData {
    pub media_file: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub fps: FpsValue,
    pub entries: Vec<Entry>,
}

impl ProjectData {
    pub fn new(media_file: String, size: NativeSize, fps: FpsValue, entries: &[Entry]) -> Self {
        Self {
            media_file,
            frame_width: size.width,
            frame_height: size.height,
            fps,
            entries: entries.to_vec(),
        }
    }
}
