// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video timeline scrubber control.
//!
//! A slider for the current frame above a strip that marks every frame
//! holding at least one label.

use crate::util::geometry;
use poseclick::viewer::GridViewer;

const STRIP_HEIGHT: f32 = 10.0;
const LABELED_COLOR: egui::Color32 = egui::Color32::from_rgb(55, 150, 255);
const CURRENT_COLOR: egui::Color32 = egui::Color32::from_rgb(255, 0, 255);

/// Display the timeline. Returns the frame to seek to, if the user picked one.
pub fn show(ui: &mut egui::Ui, viewer: &GridViewer) -> Option<usize> {
    let frame_count = viewer.frame_count();
    let last_frame = frame_count.saturating_sub(1);
    let mut seek = None;

    let mut frame = viewer.frame_number();
    ui.spacing_mut().slider_width = (ui.available_width() - 80.0).max(50.0);
    if ui
        .add(egui::Slider::new(&mut frame, 0..=last_frame).text("frame"))
        .changed()
    {
        seek = Some(frame);
    }

    let width = ui.available_width();
    let (rect, response) =
        ui.allocate_exact_size(egui::vec2(width, STRIP_HEIGHT), egui::Sense::click());
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 0.0, egui::Color32::from_gray(30));

    for labeled in viewer.labels().nonempty_frames() {
        let x = rect.left() + geometry::frame_to_offset(labeled, frame_count, width);
        painter.line_segment(
            [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
            egui::Stroke::new(1.0, LABELED_COLOR),
        );
    }
    let x = rect.left() + geometry::frame_to_offset(viewer.frame_number(), frame_count, width);
    painter.line_segment(
        [egui::pos2(x, rect.top()), egui::pos2(x, rect.bottom())],
        egui::Stroke::new(2.0, CURRENT_COLOR),
    );

    if response.clicked() {
        if let Some(pos) = response.interact_pointer_pos() {
            seek = Some(geometry::offset_to_frame(pos.x - rect.left(), frame_count, width));
        }
    }

    seek
}
