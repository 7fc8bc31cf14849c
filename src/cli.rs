// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Command line arguments.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video file to open on start
    pub video: Option<PathBuf>,

    /// YAML settings file
    #[arg(long, env = "FRAMEBOX_CONFIG")]
    pub config: Option<PathBuf>,

    /// ffmpeg executable, overriding the settings file
    #[arg(long, env = "FRAMEBOX_FFMPEG")]
    pub ffmpeg: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_video_and_flags() {
        let args = Args::parse_from(["framebox", "clip.mp4", "--ffmpeg", "/opt/ffmpeg/bin/ffmpeg"]);
        assert_eq!(args.video, Some(PathBuf::from("clip.mp4")));
        assert_eq!(args.ffmpeg, Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg")));
    }
}
