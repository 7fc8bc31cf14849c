// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Frame rate resolution.
//!
//! The video container is not queried directly. Instead a frame rate comes
//! from one of three strategies, and the value always carries where it came
//! from so the UI can warn about estimates and so automatic strategies never
//! overwrite what the user typed in.

use crate::error::{AnnotateError, ProbeFailure, Result};
use serde::{Deserialize, Serialize};

/// Which strategy produced the current frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Unknown,
    Estimated,
    Probed,
    Manual,
}

/// A frame rate and its provenance. `fps` is `None` exactly when the
/// provenance is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FpsValue {
    fps: Option<f64>,
    provenance: Provenance,
}

impl FpsValue {
    pub fn fps(&self) -> Option<f64> {
        self.fps
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// The frame rate, or `NoFps` if none has been resolved.
    pub fn require(&self) -> Result<f64> {
        self.fps.ok_or(AnnotateError::NoFps)
    }

    pub fn is_approximate(&self) -> bool {
        self.provenance == Provenance::Estimated
    }

    fn known(fps: f64, provenance: Provenance) -> Self {
        Self {
            fps: Some(fps),
            provenance,
        }
    }
}

impl std::fmt::Display for FpsValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.fps, self.provenance) {
            (Some(fps), Provenance::Estimated) => write!(f, "{:.4} (estimated)", fps),
            (Some(fps), Provenance::Probed) => write!(f, "{:.4} (probed)", fps),
            (Some(fps), _) => write!(f, "{:.4}", fps),
            (None, _) => write!(f, "unknown"),
        }
    }
}

/// One acquisition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum FpsStrategy {
    /// A value typed in by the user.
    Manual(f64),
    /// Media times observed before and after a one-picture step.
    Estimate { before: f64, after: f64 },
    /// Outcome of the decode-based probe.
    Probe(std::result::Result<f64, ProbeFailure>),
}

/// Holds the authoritative frame rate for the session.
#[derive(Debug, Default)]
pub struct FpsResolver {
    value: FpsValue,
}

impl FpsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> FpsValue {
        self.value
    }

    /// Apply a strategy. On error the previous value is kept, except that a
    /// failed probe clears any automatic value back to unknown.
    pub fn resolve(&mut self, strategy: FpsStrategy) -> Result<FpsValue> {
        let manual_locked = self.value.provenance == Provenance::Manual;

        match strategy {
            FpsStrategy::Manual(fps) => {
                self.value = FpsValue::known(validate(fps)?, Provenance::Manual);
            }
            _ if manual_locked => {
                log::info!("Keeping manual frame rate {}", self.value);
                return Err(AnnotateError::ManualFpsLocked);
            }
            FpsStrategy::Estimate { before, after } => {
                let fps = validate(1.0 / (after - before))?;
                self.value = FpsValue::known(fps, Provenance::Estimated);
            }
            FpsStrategy::Probe(Ok(fps)) => {
                self.value = FpsValue::known(validate(fps)?, Provenance::Probed);
            }
            FpsStrategy::Probe(Err(failure)) => {
                log::warn!("Frame rate probe failed: {}", failure);
                self.value = FpsValue::default();
                return Err(failure.into());
            }
        }

        log::info!("Frame rate set to {}", self.value);
        Ok(self.value)
    }

    /// Forget the frame rate. Called when the session is torn down.
    pub fn reset(&mut self) {
        self.value = FpsValue::default();
    }
}

fn validate(fps: f64) -> Result<f64> {
    if fps.is_finite() && fps > 0.0 {
        Ok(fps)
    } else {
        Err(AnnotateError::InvalidFps(fps))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unknown() {
        let resolver = FpsResolver::new();
        assert_eq!(resolver.value().provenance(), Provenance::Unknown);
        assert_eq!(resolver.value().require(), Err(AnnotateError::NoFps));
    }

    #[test]
    fn test_manual_value() {
        let mut resolver = FpsResolver::new();
        let value = resolver.resolve(FpsStrategy::Manual(29.97)).unwrap();
        assert_eq!(value.fps(), Some(29.97));
        assert_eq!(value.provenance(), Provenance::Manual);
    }

    #[test]
    fn test_invalid_manual_keeps_previous() {
        let mut resolver = FpsResolver::new();
        resolver.resolve(FpsStrategy::Manual(25.0)).unwrap();

        for bad in [0.0, -30.0, f64::NAN, f64::INFINITY] {
            let err = resolver.resolve(FpsStrategy::Manual(bad)).unwrap_err();
            assert!(matches!(err, AnnotateError::InvalidFps(_)));
        }
        assert_eq!(resolver.value().fps(), Some(25.0));
    }

    #[test]
    fn test_estimate_from_step() {
        let mut resolver = FpsResolver::new();
        let value = resolver
            .resolve(FpsStrategy::Estimate {
                before: 1.0,
                after: 1.04,
            })
            .unwrap();
        assert!((value.fps().unwrap() - 25.0).abs() < 1e-6);
        assert!(value.is_approximate());
    }

    #[test]
    fn test_estimate_without_progress_is_rejected() {
        let mut resolver = FpsResolver::new();
        let err = resolver
            .resolve(FpsStrategy::Estimate {
                before: 2.0,
                after: 2.0,
            })
            .unwrap_err();
        assert!(matches!(err, AnnotateError::InvalidFps(_)));
        assert_eq!(resolver.value().provenance(), Provenance::Unknown);
    }

    #[test]
    fn test_probe_failure_stays_unknown() {
        let mut resolver = FpsResolver::new();
        let err = resolver
            .resolve(FpsStrategy::Probe(Err(ProbeFailure::NoMatch)))
            .unwrap_err();
        assert_eq!(err, AnnotateError::ProbeFailure(ProbeFailure::NoMatch));
        assert_eq!(resolver.value().provenance(), Provenance::Unknown);
        assert_eq!(resolver.value().fps(), None);
    }

    #[test]
    fn test_probe_failure_clears_estimate() {
        let mut resolver = FpsResolver::new();
        resolver
            .resolve(FpsStrategy::Estimate {
                before: 0.0,
                after: 0.5,
            })
            .unwrap();
        let _ = resolver.resolve(FpsStrategy::Probe(Err(ProbeFailure::Timeout(20))));
        assert_eq!(resolver.value(), FpsValue::default());
    }

    #[test]
    fn test_last_automatic_writer_wins() {
        let mut resolver = FpsResolver::new();
        resolver.resolve(FpsStrategy::Probe(Ok(24.0))).unwrap();
        resolver
            .resolve(FpsStrategy::Estimate {
                before: 0.0,
                after: 0.02,
            })
            .unwrap();
        assert_eq!(resolver.value().provenance(), Provenance::Estimated);
        resolver.resolve(FpsStrategy::Probe(Ok(24.0))).unwrap();
        assert_eq!(resolver.value().provenance(), Provenance::Probed);
    }

    #[test]
    fn test_manual_is_sticky() {
        let mut resolver = FpsResolver::new();
        resolver.resolve(FpsStrategy::Manual(30.0)).unwrap();

        let err = resolver.resolve(FpsStrategy::Probe(Ok(24.0))).unwrap_err();
        assert_eq!(err, AnnotateError::ManualFpsLocked);
        let err = resolver
            .resolve(FpsStrategy::Probe(Err(ProbeFailure::NoMatch)))
            .unwrap_err();
        assert_eq!(err, AnnotateError::ManualFpsLocked);
        assert_eq!(resolver.value().fps(), Some(30.0));

        resolver.resolve(FpsStrategy::Manual(60.0)).unwrap();
        assert_eq!(resolver.value().fps(), Some(60.0));
    }

    #[test]
    fn test_reset() {
        let mut resolver = FpsResolver::new();
        resolver.resolve(FpsStrategy::Manual(30.0)).unwrap();
        resolver.reset();
        assert_eq!(resolver.value().provenance(), Provenance::Unknown);
    }
}
