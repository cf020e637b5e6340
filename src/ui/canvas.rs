// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Canvas showing the composed video grid.
//!
//! The grid is drawn letterboxed in the central panel. Pointer input over it
//! is translated back to grid pixels and handed to the viewer as
//! [`InputEvent`]s.

use crate::util::geometry::{self, DisplayRect};
use poseclick::grid::ZoomDirection;
use poseclick::viewer::InputEvent;

/// Display the grid texture and collect pointer input over it.
pub fn show(
    ui: &mut egui::Ui,
    texture: &Option<egui::TextureHandle>,
    image_size: Option<(u32, u32)>,
) -> Vec<InputEvent> {
    let mut events = Vec::new();
    ui.style_mut().visuals.extreme_bg_color = egui::Color32::from_gray(40);
    let available_size = ui.available_size();

    egui::Frame::canvas(ui.style()).show(ui, |ui| {
        ui.set_min_size(available_size);

        let (Some(texture), Some(size)) = (texture, image_size) else {
            show_welcome(ui);
            return;
        };

        let origin = ui.min_rect().min;
        let available = ui.available_size();
        let rect = geometry::fit_rect(size, (origin.x, origin.y), (available.x, available.y));
        let image_rect = to_egui_rect(&rect);

        ui.painter().image(
            texture.id(),
            image_rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        );

        let response = ui.allocate_rect(image_rect, egui::Sense::click());
        let to_grid =
            |pos: egui::Pos2| geometry::to_image_coordinates(&rect, size, (pos.x, pos.y));

        if let Some((x, y)) = response.hover_pos().and_then(to_grid) {
            events.push(InputEvent::PointerMoved { x, y });

            let scroll = ui.input(|i| i.raw_scroll_delta.y);
            if scroll != 0.0 {
                let direction = if scroll > 0.0 {
                    ZoomDirection::In
                } else {
                    ZoomDirection::Out
                };
                events.push(InputEvent::Scroll { x, y, direction });
            }
        }

        if response.clicked() {
            if let Some((x, y)) = response.interact_pointer_pos().and_then(to_grid) {
                events.push(InputEvent::Click { x, y });
            }
        }
    });

    events
}

fn to_egui_rect(rect: &DisplayRect) -> egui::Rect {
    egui::Rect::from_min_size(
        egui::pos2(rect.x, rect.y),
        egui::vec2(rect.width, rect.height),
    )
}

fn show_welcome(ui: &mut egui::Ui) {
    ui.centered_and_justified(|ui| {
        ui.vertical_centered(|ui| {
            ui.add_space(20.0);
            ui.heading(
                egui::RichText::new("poseclick")
                    .size(32.0)
                    .color(egui::Color32::from_gray(200)),
            );
            ui.label(
                egui::RichText::new("Multi-video keypoint labeling")
                    .size(14.0)
                    .color(egui::Color32::from_gray(150)),
            );
            ui.add_space(20.0);
            ui.label(
                egui::RichText::new("Open a recording folder to begin labeling")
                    .color(egui::Color32::from_gray(180)),
            );
            ui.add_space(10.0);
            ui.label(
                egui::RichText::new("File → Open Recording...")
                    .weak()
                    .color(egui::Color32::from_gray(130)),
            );
        });
    });
}
