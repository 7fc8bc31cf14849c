// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing canvas for video display and the bounding box overlay.
//!
//! The canvas lays the current picture out aspect-correct in the available
//! space, reports that layout as the viewport, and turns pointer drags on
//! the overlay into move and resize deltas.

use crate::models::annotation::{DisplayRect, NativeSize, Rect, ViewportRect};
use crate::util::geometry::fit_viewport;

/// Side of the square resize handle at the box's bottom-right corner.
const HANDLE_SIZE: f32 = 12.0;

/// What happened on the canvas this frame.
#[derive(Debug, Default)]
pub struct CanvasOutput {
    /// Where the video surface was laid out, if a video is shown.
    pub viewport: Option<ViewportRect>,
    /// Pointer movement while dragging the box body.
    pub moved: Option<egui::Vec2>,
    /// Pointer movement while dragging the resize handle.
    pub resized: Option<egui::Vec2>,
}

pub fn to_egui(rect: &Rect) -> egui::Rect {
    egui::Rect::from_min_size(
        egui::pos2(rect.x as f32, rect.y as f32),
        egui::vec2(rect.width as f32, rect.height as f32),
    )
}

pub fn from_egui(rect: egui::Rect) -> Rect {
    Rect::new(
        rect.min.x as f64,
        rect.min.y as f64,
        rect.width() as f64,
        rect.height() as f64,
    )
}

/// Display the video canvas with the box overlay.
pub fn show(
    ui: &mut egui::Ui,
    texture: Option<&egui::TextureHandle>,
    native: NativeSize,
    display: DisplayRect,
) -> CanvasOutput {
    let mut output = CanvasOutput::default();

    let available = ui.available_rect_before_wrap();
    ui.allocate_rect(available, egui::Sense::hover());
    ui.painter()
        .rect_filled(available, 0.0, egui::Color32::from_gray(40));

    let Some(viewport) = fit_viewport(&from_egui(available), native) else {
        return output;
    };
    let image_rect = to_egui(&viewport);
    output.viewport = Some(viewport);

    match texture {
        Some(texture) => {
            ui.painter().image(
                texture.id(),
                image_rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE,
            );
        }
        None => {
            ui.painter().text(
                image_rect.center(),
                egui::Align2::CENTER_CENTER,
                "Decoding...",
                egui::FontId::proportional(16.0),
                egui::Color32::from_gray(180),
            );
        }
    }

    let box_rect = to_egui(&display);
    let handle_rect = egui::Rect::from_center_size(box_rect.max, egui::vec2(HANDLE_SIZE, HANDLE_SIZE));

    let body = ui
        .interact(box_rect, ui.id().with("bounding_box"), egui::Sense::drag())
        .on_hover_cursor(egui::CursorIcon::Grab);
    // Registered after the body so it wins where they overlap.
    let handle = ui
        .interact(handle_rect, ui.id().with("resize_handle"), egui::Sense::drag())
        .on_hover_cursor(egui::CursorIcon::ResizeNwSe);

    if handle.dragged() {
        output.resized = Some(handle.drag_delta());
    } else if body.dragged() {
        output.moved = Some(body.drag_delta());
    }

    let painter = ui.painter().with_clip_rect(available);
    let color = egui::Color32::from_rgb(255, 64, 64);
    painter.rect_filled(box_rect, 0.0, egui::Color32::from_rgba_unmultiplied(255, 64, 64, 24));
    painter.rect_stroke(box_rect, 0.0, egui::Stroke::new(2.0, color));
    painter.rect_filled(handle_rect, 2.0, color);

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_conversion_roundtrip() {
        let rect = Rect::new(12.5, 30.0, 640.0, 360.0);
        assert_eq!(from_egui(to_egui(&rect)), rect);
    }
}
