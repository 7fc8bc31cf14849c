// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Decode-based frame rate probe.
//!
//! The first bytes of the video are piped through ffmpeg and the frame rate
//! is read back from its diagnostic output. Any miss is a failure; the
//! probe never guesses a number.

use crate::config::AppConfig;
use crate::error::ProbeFailure;
use regex::Regex;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::mpsc::{channel, Receiver};
use std::sync::OnceLock;
use std::time::Duration;
use wait_timeout::ChildExt;

fn fps_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?) fps").expect("valid fps pattern"))
}

/// Nominal rates of the 1000/1001 (NTSC) family.
const NTSC_BASES: [f64; 5] = [24.0, 30.0, 48.0, 60.0, 120.0];

/// Largest distance between ffmpeg's two-decimal figure and the exact rate.
const NTSC_TOLERANCE: f64 = 0.006;

/// Extract the first "NN.NN fps" figure from ffmpeg's stream description.
///
/// ffmpeg prints rates rounded to two decimals, so `24000/1001` shows up
/// as `23.98`. Those figures are mapped back to the exact rate; stepping
/// with the rounded value would drift a frame every couple of minutes.
pub fn parse_fps(diagnostics: &str) -> Option<f64> {
    fps_pattern()
        .captures_iter(diagnostics)
        .filter_map(|cap| cap[1].parse::<f64>().ok())
        .find(|fps| fps.is_finite() && *fps > 0.0)
        .map(exact_rate)
}

fn exact_rate(shown: f64) -> f64 {
    NTSC_BASES
        .iter()
        .map(|base| base * 1000.0 / 1001.0)
        .find(|exact| (shown - exact).abs() < NTSC_TOLERANCE)
        .unwrap_or(shown)
}

/// Settings for one probe run.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    pub ffmpeg: PathBuf,
    pub video: PathBuf,
    pub prefix_bytes: usize,
    pub timeout: Duration,
}

impl ProbeRequest {
    pub fn new(config: &AppConfig, video: &Path) -> Self {
        Self {
            ffmpeg: config.ffmpeg_path.clone(),
            video: video.to_path_buf(),
            prefix_bytes: config.probe_prefix_bytes,
            timeout: config.probe_timeout(),
        }
    }
}

/// Run the probe on a worker thread. Exactly one result is posted back.
pub fn spawn_probe(request: ProbeRequest) -> Receiver<Result<f64, ProbeFailure>> {
    let (sender, receiver) = channel();
    std::thread::spawn(move || {
        log::info!("Probing frame rate of {}", request.video.display());
        let result = probe_fps(&request);
        match &result {
            Ok(fps) => log::info!("Probe found {} fps", fps),
            Err(e) => log::warn!("Probe failed: {}", e),
        }
        let _ = sender.send(result);
    });
    receiver
}

/// Blocking probe run, bounded by `request.timeout`.
pub fn probe_fps(request: &ProbeRequest) -> Result<f64, ProbeFailure> {
    let prefix = read_prefix(&request.video, request.prefix_bytes)?;

    let mut child = Command::new(&request.ffmpeg)
        .arg("-hide_banner")
        .arg("-i")
        .arg("pipe:0")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ProbeFailure::Spawn {
            program: request.ffmpeg.display().to_string(),
            reason: e.to_string(),
        })?;

    let stdin = child.stdin.take();
    let writer = std::thread::spawn(move || {
        if let Some(mut stdin) = stdin {
            // ffmpeg stops reading once it has seen the stream headers
            match stdin.write_all(&prefix) {
                Err(e) if e.kind() != ErrorKind::BrokenPipe => {
                    log::debug!("Probe input write stopped: {}", e)
                }
                _ => {}
            }
        }
    });

    let stderr = child.stderr.take();
    let reader = std::thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut text);
        }
        text
    });

    let status = child
        .wait_timeout(request.timeout)
        .map_err(|e| ProbeFailure::Io(e.to_string()))?;
    if status.is_none() {
        let _ = child.kill();
        let _ = child.wait();
        let _ = writer.join();
        let _ = reader.join();
        return Err(ProbeFailure::Timeout(request.timeout.as_secs()));
    }

    let _ = writer.join();
    let diagnostics = reader
        .join()
        .map_err(|_| ProbeFailure::Io("stderr reader panicked".to_string()))?;
    log::debug!("Probe output:\n{}", diagnostics);

    parse_fps(&diagnostics).ok_or(ProbeFailure::NoMatch)
}

fn read_prefix(path: &Path, limit: usize) -> Result<Vec<u8>, ProbeFailure> {
    let file = std::fs::File::open(path)
        .map_err(|e| ProbeFailure::Io(format!("{}: {}", path.display(), e)))?;
    let mut prefix = Vec::with_capacity(limit.min(1 << 20));
    file.take(limit as u64)
        .read_to_end(&mut prefix)
        .map_err(|e| ProbeFailure::Io(e.to_string()))?;
    Ok(prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::clock::frame_index;
    use std::io::Write;

    const MP4_OUTPUT: &str = "\
Input #0, mov,mp4,m4a,3gp,3g2,mj2, from 'pipe:0':
  Metadata:
    major_brand     : isom
  Duration: 00:00:10.01, start: 0.000000, bitrate: N/A
  Stream #0:0[0x1](und): Video: h264 (High) (avc1 / 0x31637661), yuv420p(progressive), 1920x1080 [SAR 1:1 DAR 16:9], 4987 kb/s, 29.97 fps, 29.97 tbr, 30k tbn (default)
  Stream #0:1[0x2](und): Audio: aac (LC) (mp4a / 0x6134706D), 48000 Hz, stereo, fltp, 128 kb/s (default)
At least one output file must be specified
";

    #[test]
    fn test_parse_fps_from_stream_line() {
        assert_eq!(parse_fps(MP4_OUTPUT), Some(30000.0 / 1001.0));
    }

    #[test]
    fn test_parse_ntsc_rates_exactly() {
        let line = "Stream #0:0: Video: h264 (High), yuv420p, 1920x1080, 23.98 fps, 23.98 tbr, 24k tbn";
        let fps = parse_fps(line).unwrap();
        assert_eq!(fps, 24000.0 / 1001.0);

        // One frame per 1001/24000 s: the index must not drift over an hour
        for n in [3100u64, 9000, 36000, 86313] {
            let t = n as f64 * 1001.0 / 24000.0;
            assert_eq!(frame_index(t, Some(fps)), Ok(n));
        }

        for (shown, base) in [("47.95", 48.0), ("59.94", 60.0), ("119.88", 120.0)] {
            let fps = parse_fps(&format!("Video: h264, 1280x720, {} fps", shown)).unwrap();
            assert_eq!(fps, base * 1000.0 / 1001.0);
        }
    }

    #[test]
    fn test_parse_other_fractional_rates_unchanged() {
        assert_eq!(parse_fps("Video: h264, 640x480, 12.50 fps, 12.50 tbr"), Some(12.5));
        assert_eq!(parse_fps("Video: h264, 640x480, 24 fps, 24 tbr"), Some(24.0));
    }

    #[test]
    fn test_parse_integer_fps() {
        let line = "Stream #0:0: Video: vp9 (Profile 0), yuv420p(tv), 1280x720, SAR 1:1 DAR 16:9, 25 fps, 25 tbr, 1k tbn";
        assert_eq!(parse_fps(line), Some(25.0));
    }

    #[test]
    fn test_parse_fps_miss() {
        let output = "pipe:0: Invalid data found when processing input\n";
        assert_eq!(parse_fps(output), None);
        assert_eq!(parse_fps("Stream #0:0: Video: h264, 0 fps"), None);
    }

    #[test]
    fn test_missing_video_fails() {
        let request = ProbeRequest {
            ffmpeg: PathBuf::from("ffmpeg"),
            video: PathBuf::from("/nonexistent/video.mp4"),
            prefix_bytes: 1024,
            timeout: Duration::from_secs(1),
        };
        assert!(matches!(probe_fps(&request), Err(ProbeFailure::Io(_))));
    }

    #[test]
    fn test_missing_decoder_fails() {
        let mut video = tempfile::NamedTempFile::new().unwrap();
        video.write_all(b"not really a video").unwrap();
        let request = ProbeRequest {
            ffmpeg: PathBuf::from("/nonexistent/bin/ffmpeg"),
            video: video.path().to_path_buf(),
            prefix_bytes: 1024,
            timeout: Duration::from_secs(1),
        };

        let result = spawn_probe(request).recv().unwrap();

        assert!(matches!(result, Err(ProbeFailure::Spawn { .. })));
    }

    #[test]
    fn test_read_prefix_is_bounded() {
        let mut video = tempfile::NamedTempFile::new().unwrap();
        video.write_all(&[7u8; 4096]).unwrap();
        assert_eq!(read_prefix(video.path(), 100).unwrap().len(), 100);
        assert_eq!(read_prefix(video.path(), 10_000).unwrap().len(), 4096);
    }
}
