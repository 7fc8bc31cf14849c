// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types for the annotation core.
//!
//! Every condition here is local and recoverable: the session keeps running
//! and the user is prompted instead.

use thiserror::Error;

/// Errors raised by coordinate mapping, FPS resolution and navigation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnotateError {
    /// An operation needing a frame rate ran before one was resolved.
    #[error("frame rate is unknown; set it manually or probe the video")]
    NoFps,

    /// A zero, negative or non-finite frame rate was supplied.
    #[error("invalid frame rate: {0}")]
    InvalidFps(f64),

    /// Native width is zero or the viewport is empty.
    #[error("cannot map coordinates: video dimensions are not known yet")]
    DegenerateScale,

    /// The decode-based probe did not produce a frame rate.
    #[error("frame rate probe failed: {0}")]
    ProbeFailure(#[from] ProbeFailure),

    /// An automatic strategy tried to replace a manually entered frame rate.
    #[error("frame rate was set manually; only a manual entry can change it")]
    ManualFpsLocked,

    /// The playback source rejected a command.
    #[error("playback error: {0}")]
    Playback(String),
}

impl AnnotateError {
    pub fn playback(err: anyhow::Error) -> Self {
        AnnotateError::Playback(format!("{:#}", err))
    }
}

/// Reasons the frame rate probe can fail.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeFailure {
    /// The decode utility could not be started.
    #[error("could not run {program}: {reason}")]
    Spawn { program: String, reason: String },

    /// Reading the video or talking to the child process failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The diagnostic output had no frame rate figure.
    #[error("no frame rate found in decoder output")]
    NoMatch,

    /// The probe exceeded its time budget and was killed.
    #[error("timed out after {0} seconds")]
    Timeout(u64),
}

pub type Result<T> = std::result::Result<T, AnnotateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_failure_converts() {
        let err: AnnotateError = ProbeFailure::NoMatch.into();
        assert_eq!(err, AnnotateError::ProbeFailure(ProbeFailure::NoMatch));
        assert!(err.to_string().contains("no frame rate found"));
    }
}
