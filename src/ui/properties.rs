// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Tracked point panel.
//!
//! Lists every tracked point with its coordinates on the video under the
//! pointer at the current frame. Clicking a point makes it the active one.

use poseclick::viewer::GridViewer;

/// Display the panel. Returns the point the user selected, if any.
pub fn show(ui: &mut egui::Ui, viewer: &GridViewer) -> Option<String> {
    let mut selected = None;

    ui.heading("Tracked points");
    ui.separator();

    let names = viewer.video_names();
    let video = viewer
        .active_video()
        .and_then(|index| names.get(index).copied())
        .or_else(|| names.first().copied());
    let Some(video) = video else {
        ui.label(egui::RichText::new("No videos").weak());
        return None;
    };
    ui.label(egui::RichText::new(video).strong());
    ui.add_space(4.0);

    let labels = viewer.labels().get(video, viewer.frame_number());
    let active = viewer.labels().active_point();

    egui::ScrollArea::vertical().show(ui, |ui| {
        for name in viewer.labels().point_names() {
            ui.horizontal(|ui| {
                let [r, g, b] = viewer.point_color(name).0;
                let (swatch, _) =
                    ui.allocate_exact_size(egui::vec2(10.0, 10.0), egui::Sense::hover());
                ui.painter()
                    .rect_filled(swatch, 2.0, egui::Color32::from_rgb(r, g, b));

                let text = match labels.get(name) {
                    Some(coordinate) => format!("{}: {}, {}", name, coordinate.x, coordinate.y),
                    None => format!("{}: (?, ?)", name),
                };
                if ui.selectable_label(name == active, text).clicked() {
                    selected = Some(name.clone());
                }
            });
        }
    });

    ui.separator();
    match viewer.machine_labels() {
        Some(_) => ui.label("Machine labels loaded"),
        None => ui.label(egui::RichText::new("No machine labels").weak()),
    };
    if let Some(path) = viewer.last_saved() {
        ui.label(
            egui::RichText::new(format!("Saved to {}", path.display()))
                .small()
                .weak(),
        );
    }

    selected
}
