// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation export.
//!
//! The entry log is exported as CSV, one row per entry in log order. A
//! full project snapshot can also be written as YAML or JSON.

use crate::models::annotation::Entry;
use crate::models::project::ProjectData;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Column header of the CSV export, in order.
pub const CSV_HEADER: [&str; 5] = [
    "frame",
    "top_left_x",
    "top_left_y",
    "bottom_right_x",
    "bottom_right_y",
];

#[derive(Serialize)]
struct CsvRow {
    frame: u64,
    top_left_x: u32,
    top_left_y: u32,
    bottom_right_x: u32,
    bottom_right_y: u32,
}

impl From<&Entry> for CsvRow {
    fn from(entry: &Entry) -> Self {
        Self {
            frame: entry.frame,
            top_left_x: entry.coords.x1,
            top_left_y: entry.coords.y1,
            bottom_right_x: entry.coords.x2,
            bottom_right_y: entry.coords.y2,
        }
    }
}

/// Default export file name for a video: the video's name plus `.csv`.
pub fn csv_file_name(video_name: &str) -> String {
    format!("{}.csv", video_name)
}

/// Write the entries as CSV. The header is written even with no entries.
pub fn write_csv<W: Write>(entries: &[Entry], writer: W) -> Result<()> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(CSV_HEADER)?;
    for entry in entries {
        csv.serialize(CsvRow::from(entry))?;
    }
    csv.flush()?;
    Ok(())
}

/// Export entries to a CSV file.
pub fn export_csv(entries: &[Entry], path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    write_csv(entries, file)
}

/// Export project data to YAML format.
pub fn export_yaml(data: &ProjectData, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Export project data to JSON format.
pub fn export_json(data: &ProjectData, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    std::fs::write(path, json)?;
    Ok(())
}
