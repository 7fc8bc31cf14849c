// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module provides the transformation between the on-screen overlay box
//! and pixel coordinates in the video's native resolution, plus the layout
//! helpers that keep the rendered surface and the box consistent when the
//! window is resized.

use crate::error::{AnnotateError, Result};
use crate::models::annotation::{DisplayRect, NativeCoords, NativeSize, Rect, ViewportRect};

/// Map the overlay box into native video pixels.
///
/// The viewport is assumed to share the native aspect ratio, so a single
/// scale factor covers both axes. Boxes hanging outside the viewport are
/// clamped, never rejected.
pub fn map_to_native(
    display: &DisplayRect,
    viewport: &ViewportRect,
    native: NativeSize,
) -> Result<NativeCoords> {
    if native.width == 0 {
        return Err(AnnotateError::DegenerateScale);
    }
    let scale = viewport.width / native.width as f64;
    if !scale.is_finite() || scale <= 0.0 {
        return Err(AnnotateError::DegenerateScale);
    }

    let max_x = viewport.width / scale;
    let max_y = viewport.height / scale;

    let x1 = clamp((display.x - viewport.x) / scale, 0.0, max_x).round();
    let y1 = clamp((display.y - viewport.y) / scale, 0.0, max_y).round();
    let x2 = clamp(x1 + display.width.max(0.0) / scale, 0.0, max_x).round();
    let y2 = clamp(y1 + display.height.max(0.0) / scale, 0.0, max_y).round();

    // Sub-pixel aspect drift between viewport and video must not leak out.
    let to_px = |v: f64, limit: u32| (v.max(0.0) as u32).min(limit);
    Ok(NativeCoords {
        x1: to_px(x1, native.width),
        y1: to_px(y1, native.height),
        x2: to_px(x2, native.width),
        y2: to_px(y2, native.height),
    })
}

/// Largest aspect-preserving rectangle for `native`, centred in `available`.
pub fn fit_viewport(available: &Rect, native: NativeSize) -> Option<ViewportRect> {
    let img_aspect = native.aspect()?;
    if available.is_empty() {
        return None;
    }
    let available_aspect = available.width / available.height;

    let (width, height) = if img_aspect > available_aspect {
        // Wider than the panel: fit to width
        (available.width, available.width / img_aspect)
    } else {
        (available.height * img_aspect, available.height)
    };

    Some(Rect::new(
        available.x + (available.width - width) / 2.0,
        available.y + (available.height - height) / 2.0,
        width,
        height,
    ))
}

/// Move and scale the overlay box so it covers the same picture content
/// after the viewport changes from `old` to `new`.
pub fn rescale_display(display: &DisplayRect, old: &ViewportRect, new: &ViewportRect) -> DisplayRect {
    if old.is_empty() || new.is_empty() {
        return *display;
    }
    let ratio = new.width / old.width;
    Rect::new(
        new.x + (display.x - old.x) * ratio,
        new.y + (display.y - old.y) * ratio,
        display.width * ratio,
        display.height * ratio,
    )
}

fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}
