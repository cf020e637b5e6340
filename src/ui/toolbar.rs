// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Toolbar with playback controls and display toggles.
//!
//! Every button maps to a [`ViewerCommand`], so the toolbar and the keyboard
//! drive the viewer the same way.

use poseclick::viewer::{GridViewer, PlaybackState, ViewerCommand};

/// Display the toolbar. Returns the command of the button that was clicked.
pub fn show(ui: &mut egui::Ui, viewer: &GridViewer) -> Option<ViewerCommand> {
    let mut command = None;

    ui.horizontal(|ui| {
        ui.spacing_mut().item_spacing.x = 8.0;

        let playing = viewer.state() == PlaybackState::Playing;
        let play_text = if playing { "⏸ Pause" } else { "▶ Play" };
        if ui.button(play_text).on_hover_text("Space").clicked() {
            command = Some(ViewerCommand::TogglePlayback);
        }
        if ui.button("⏴").on_hover_text("Previous frame (A)").clicked() {
            command = Some(ViewerCommand::StepFrames(-1));
        }
        if ui.button("⏵").on_hover_text("Next frame (D)").clicked() {
            command = Some(ViewerCommand::StepFrames(1));
        }
        if ui.button("⏮ Labeled").on_hover_text("Previous labeled frame (F)").clicked() {
            command = Some(ViewerCommand::JumpToLabeledFrame { reverse: true });
        }
        if ui.button("Labeled ⏭").on_hover_text("Next labeled frame (G)").clicked() {
            command = Some(ViewerCommand::JumpToLabeledFrame { reverse: false });
        }

        ui.separator();

        ui.label(format!(
            "Frame {} / {}",
            viewer.frame_number(),
            viewer.frame_count().saturating_sub(1)
        ));

        ui.separator();

        let toggles = [
            (viewer.auto_next_point(), "Auto next", "C", ViewerCommand::ToggleAutoNextPoint),
            (viewer.show_point_names(), "Names", "N", ViewerCommand::TogglePointNames),
            (viewer.show_label_list(), "Label list", ",", ViewerCommand::ToggleLabelList),
            (viewer.show_machine_labels(), "Machine labels", "M", ViewerCommand::ToggleMachineLabels),
            (viewer.show_help(), "Help", "H", ViewerCommand::ToggleHelp),
        ];
        for (selected, text, key, toggle) in toggles {
            if ui.selectable_label(selected, text).on_hover_text(key).clicked() {
                command = Some(toggle);
            }
        }

        ui.separator();

        if ui.button("Reset zoom").on_hover_text("R").clicked() {
            command = Some(ViewerCommand::ResetZoom);
        }
    });

    command
}
