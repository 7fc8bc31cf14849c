// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading (videos).
//!
//! This module drives the external ffmpeg utility to read video metadata,
//! decode pictures at a given time, and stream pictures in real time while
//! playing. Every decoded picture carries the `pts_time` reported by
//! ffmpeg's `showinfo` filter, which is the presented-frame timestamp the
//! frame clock prefers.

use crate::config::AppConfig;
use crate::models::annotation::NativeSize;
use crate::playback::source::{PlaybackSource, PresentedFrame};
use anyhow::{anyhow, bail, Context, Result};
use image::RgbaImage;
use regex::Regex;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::OnceLock;
use std::thread::JoinHandle;
use std::time::Instant;

/// Narrowest picture the scaler is asked for.
pub const MIN_PREVIEW_WIDTH: u32 = 2;

/// Dimensions and length read from the container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaInfo {
    pub size: NativeSize,
    pub duration: Option<f64>,
}

fn size_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Stream #.*Video:.*?\b(\d{2,5})x(\d{2,5})\b").expect("valid size pattern")
    })
}

fn duration_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Duration:\s*(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").expect("valid duration pattern")
    })
}

fn pts_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"pts_time:\s*(-?\d+(?:\.\d+)?)").expect("valid pts pattern"))
}

/// Parse the first video stream's size and the container duration from
/// ffmpeg's input description.
pub fn parse_media_info(diagnostics: &str) -> Option<MediaInfo> {
    let caps = size_pattern().captures(diagnostics)?;
    let size = NativeSize::new(caps[1].parse().ok()?, caps[2].parse().ok()?);
    if size.width == 0 || size.height == 0 {
        return None;
    }

    let duration = duration_pattern().captures(diagnostics).and_then(|caps| {
        let hours: f64 = caps[1].parse().ok()?;
        let minutes: f64 = caps[2].parse().ok()?;
        let seconds: f64 = caps[3].parse().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    });

    Some(MediaInfo { size, duration })
}

/// Presented timestamp from a `showinfo` log line.
pub fn parse_pts_time(line: &str) -> Option<f64> {
    if !line.contains("showinfo") {
        return None;
    }
    pts_pattern().captures(line)?[1].parse().ok()
}

/// Display size for decoded pictures: native size, scaled down to at most
/// `max_width` and kept even for the scaler. Zero disables downscaling.
pub fn preview_size(native: NativeSize, max_width: u32) -> NativeSize {
    if max_width == 0 || native.width <= max_width {
        return native;
    }
    let max_width = max_width.max(MIN_PREVIEW_WIDTH);
    let height = (native.height as f64 * max_width as f64 / native.width as f64).round() as u32;
    NativeSize::new(max_width & !1, (height & !1).max(2))
}

/// Read metadata by letting ffmpeg describe the input.
pub fn read_media_info(ffmpeg: &Path, path: &Path) -> Result<MediaInfo> {
    let output = Command::new(ffmpeg)
        .arg("-hide_banner")
        .arg("-nostdin")
        .arg("-i")
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .with_context(|| format!("Failed to run {}", ffmpeg.display()))?;

    // ffmpeg exits non-zero here because no output is given; only the text matters.
    let diagnostics = String::from_utf8_lossy(&output.stderr);
    parse_media_info(&diagnostics)
        .ok_or_else(|| anyhow!("No video stream found in {}", path.display()))
}

/// How ffmpeg is asked to hand pictures back.
#[derive(Debug, Clone)]
struct DecodeJob {
    ffmpeg: PathBuf,
    path: PathBuf,
    preview: NativeSize,
}

impl DecodeJob {
    fn frame_bytes(&self) -> usize {
        self.preview.width as usize * self.preview.height as usize * 4
    }

    fn command(&self, start: f64, frames: Option<usize>, realtime: bool) -> Command {
        let mut command = Command::new(&self.ffmpeg);
        command.arg("-hide_banner").arg("-nostdin").arg("-nostats");
        if realtime {
            command.arg("-re");
        }
        command
            .arg("-ss")
            .arg(format!("{:.6}", start.max(0.0)))
            .arg("-copyts")
            .arg("-i")
            .arg(&self.path)
            .arg("-an")
            .arg("-sn");
        if let Some(frames) = frames {
            command.arg("-frames:v").arg(frames.to_string());
        }
        command
            .arg("-vf")
            .arg(format!(
                "showinfo,scale={}:{}",
                self.preview.width, self.preview.height
            ))
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgba")
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    fn picture(&self, media_time: f64, pixels: Vec<u8>) -> Result<PresentedFrame> {
        let image = RgbaImage::from_raw(self.preview.width, self.preview.height, pixels)
            .ok_or_else(|| anyhow!("Decoded picture has the wrong size"))?;
        Ok(PresentedFrame { media_time, image })
    }
}

/// What a decoder run is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeMode {
    /// The picture at the start time.
    Still,
    /// The first picture strictly after the start time.
    Step,
    /// Every picture from the start time, paced in real time.
    Play,
}

impl DecodeMode {
    fn frames(self) -> Option<usize> {
        match self {
            DecodeMode::Still => Some(1),
            // The picture at the start time comes back first
            DecodeMode::Step => Some(2),
            DecodeMode::Play => None,
        }
    }

    fn wants(self, start: f64, media_time: f64) -> bool {
        self != DecodeMode::Step || media_time > start + 1e-6
    }
}

/// Pictures tagged with the seek generation that requested them, so late
/// results of an earlier seek are dropped.
type Tagged = (u64, PresentedFrame);

/// A running ffmpeg decode and its reader threads. Stopped on pause, seek,
/// step or drop; the child is always reaped.
struct DecodeStream {
    child: Child,
    threads: Vec<JoinHandle<()>>,
}

impl DecodeStream {
    fn start(
        job: &DecodeJob,
        start: f64,
        mode: DecodeMode,
        generation: u64,
        sender: Sender<Tagged>,
    ) -> Result<Self> {
        let mut child = job
            .command(start, mode.frames(), mode == DecodeMode::Play)
            .spawn()
            .with_context(|| format!("Failed to run {}", job.ffmpeg.display()))?;
        let stdout = child.stdout.take().context("ffmpeg stdout unavailable")?;
        let stderr = child.stderr.take().context("ffmpeg stderr unavailable")?;

        let (stamp_sender, stamp_receiver) = channel();
        let stamps = std::thread::spawn(move || {
            for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                if let Some(t) = parse_pts_time(&line) {
                    if stamp_sender.send(t).is_err() {
                        break;
                    }
                }
            }
        });

        let job = job.clone();
        let pictures = std::thread::spawn(move || {
            let mut stdout = stdout;
            let mut sent = 0usize;
            loop {
                let mut pixels = vec![0u8; job.frame_bytes()];
                if stdout.read_exact(&mut pixels).is_err() {
                    break;
                }
                let Ok(media_time) = stamp_receiver.recv() else {
                    break;
                };
                if !mode.wants(start, media_time) {
                    continue;
                }
                let frame = match job.picture(media_time, pixels) {
                    Ok(frame) => frame,
                    Err(e) => {
                        log::error!("{}", e);
                        break;
                    }
                };
                if sender.send((generation, frame)).is_err() {
                    break;
                }
                sent += 1;
                if mode != DecodeMode::Play {
                    break;
                }
            }
            if sent == 0 && mode != DecodeMode::Play {
                log::debug!("No picture from the {:?} decode at {:.3}s", mode, start);
            }
            log::debug!("{:?} decode from {:.3}s ended", mode, start);
        });

        Ok(Self {
            child,
            threads: vec![stamps, pictures],
        })
    }

    fn stop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
        for thread in self.threads.drain(..) {
            let _ = thread.join();
        }
    }
}

impl Drop for DecodeStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Playback source backed by ffmpeg.
///
/// Polled time follows the wall clock while playing, like a media element's
/// current time; presented pictures arrive asynchronously with their exact
/// timestamps. At most one ffmpeg decode runs at a time: starting a seek,
/// a step or playback stops the previous one.
pub struct FfmpegSource {
    job: DecodeJob,
    info: MediaInfo,
    /// Playback time when paused, or the time playback started from.
    position: f64,
    playing_since: Option<Instant>,
    last_presented: Option<f64>,
    generation: u64,
    sender: Sender<Tagged>,
    receiver: Receiver<Tagged>,
    decoder: Option<DecodeStream>,
}

impl FfmpegSource {
    /// Read metadata and queue the first picture. Blocks on ffmpeg.
    pub fn open(config: &AppConfig, path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("Video file not found: {}", path.display());
        }
        let info = read_media_info(&config.ffmpeg_path, path)?;
        log::info!(
            "Opened {} ({}x{}, duration {:?})",
            path.display(),
            info.size.width,
            info.size.height,
            info.duration
        );

        let (sender, receiver) = channel();
        let mut source = Self {
            job: DecodeJob {
                ffmpeg: config.ffmpeg_path.clone(),
                path: path.to_path_buf(),
                preview: preview_size(info.size, config.preview_max_width),
            },
            info,
            position: 0.0,
            playing_since: None,
            last_presented: None,
            generation: 0,
            sender,
            receiver,
            decoder: None,
        };
        source.start_decoder(0.0, DecodeMode::Still)?;
        Ok(source)
    }

    fn clamp(&self, time: f64) -> f64 {
        let time = time.max(0.0);
        self.info.duration.map_or(time, |d| time.min(d))
    }

    /// Replace the running decode. Results of the old one are discarded.
    fn start_decoder(&mut self, start: f64, mode: DecodeMode) -> Result<()> {
        self.stop_decoder();
        self.generation += 1;
        self.decoder = Some(DecodeStream::start(
            &self.job,
            start,
            mode,
            self.generation,
            self.sender.clone(),
        )?);
        Ok(())
    }

    fn stop_decoder(&mut self) {
        if let Some(mut decoder) = self.decoder.take() {
            decoder.stop();
        }
    }

    fn ended(&self) -> bool {
        match (self.playing_since, self.info.duration) {
            (Some(_), Some(d)) => self.current_time() >= d,
            _ => false,
        }
    }
}

impl PlaybackSource for FfmpegSource {
    fn native_size(&self) -> Option<NativeSize> {
        Some(self.info.size)
    }

    fn duration(&self) -> Option<f64> {
        self.info.duration
    }

    fn current_time(&self) -> f64 {
        match self.playing_since {
            Some(since) => self.clamp(self.position + since.elapsed().as_secs_f64()),
            None => self.position,
        }
    }

    fn seek(&mut self, time: f64) -> Result<()> {
        self.position = self.clamp(time);
        self.last_presented = None;
        if self.playing_since.is_some() {
            self.start_decoder(self.position, DecodeMode::Play)?;
            self.playing_since = Some(Instant::now());
            Ok(())
        } else {
            self.start_decoder(self.position, DecodeMode::Still)
        }
    }

    fn play(&mut self) -> Result<()> {
        if self.playing_since.is_some() {
            return Ok(());
        }
        if self.info.duration.is_some_and(|d| self.position >= d) {
            self.position = 0.0;
        }
        self.start_decoder(self.position, DecodeMode::Play)?;
        self.playing_since = Some(Instant::now());
        Ok(())
    }

    fn pause(&mut self) {
        if self.playing_since.is_none() {
            return;
        }
        self.position = self.current_time();
        self.playing_since = None;
        self.stop_decoder();
    }

    fn is_paused(&self) -> bool {
        self.playing_since.is_none()
    }

    /// Starts decoding the next picture; it is presented once ffmpeg
    /// delivers it.
    fn step_picture(&mut self) -> Result<()> {
        self.pause();
        let start = self.last_presented.unwrap_or(self.position);
        self.start_decoder(start, DecodeMode::Step)
    }

    fn take_presented(&mut self) -> Option<PresentedFrame> {
        if self.ended() {
            log::debug!("Reached end of video");
            self.pause();
        }
        while let Ok((generation, frame)) = self.receiver.try_recv() {
            if generation == self.generation {
                self.last_presented = Some(frame.media_time);
                if self.playing_since.is_none() {
                    self.position = frame.media_time;
                }
                return Some(frame);
            }
        }
        None
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.stop_decoder();
    }
}
