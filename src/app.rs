// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Main application state and egui App implementation.
//!
//! The window hosts one [`GridViewer`] at a time. Each update collects input
//! from the panels and the keyboard, runs one viewer tick, and uploads the
//! composed grid as a texture.

use crate::ui::{canvas, properties, timeline, toolbar};
use poseclick::io::media::DefaultBackend;
use poseclick::io::serialization;
use poseclick::models::SessionConfig;
use poseclick::viewer::{
    open_session, CloseOutcome, GridViewer, InputEvent, KeyCode, PlaybackState, SaveDecision,
    SavePrompt, TickOutcome,
};
use std::path::{Path, PathBuf};

/// Asks about unsaved labels with native message dialogs.
pub struct DialogSavePrompt;

impl SavePrompt for DialogSavePrompt {
    fn confirm_save(&mut self, target: &Path) -> SaveDecision {
        let answer = rfd::MessageDialog::new()
            .set_level(rfd::MessageLevel::Warning)
            .set_title("Save labels?")
            .set_description(format!(
                "There are unsaved labels. Save them to {}?",
                target.display()
            ))
            .set_buttons(rfd::MessageButtons::YesNoCancel)
            .show();
        match answer {
            rfd::MessageDialogResult::Yes => SaveDecision::Save,
            rfd::MessageDialogResult::No => {
                let confirm = rfd::MessageDialog::new()
                    .set_level(rfd::MessageLevel::Warning)
                    .set_title("Discard labels?")
                    .set_description("Unsaved labels will be lost. Are you sure?")
                    .set_buttons(rfd::MessageButtons::YesNo)
                    .show();
                if matches!(confirm, rfd::MessageDialogResult::Yes) {
                    SaveDecision::Discard
                } else {
                    SaveDecision::Cancel
                }
            }
            _ => SaveDecision::Cancel,
        }
    }
}

/// Ask for a recording folder and, if none are configured, a tracked point
/// file. Returns `false` if the user backed out.
pub fn pick_recording(config: &mut SessionConfig) -> bool {
    let Some(folder) = rfd::FileDialog::new()
        .set_title("Select recording folder")
        .pick_folder()
    else {
        return false;
    };
    config.videos.clear();
    config.video_folder = Some(folder);

    if config.tracked_points.is_none()
        && config.tracked_point_names.is_empty()
        && config.labels_csv.is_none()
    {
        match rfd::FileDialog::new()
            .set_title("Select tracked points")
            .add_filter("Tracked points", &["json", "yaml", "yml"])
            .pick_file()
        {
            Some(path) => config.tracked_points = Some(path),
            None => {
                log::warn!("No tracked points selected");
                return false;
            }
        }
    }
    true
}

/// Main application state.
pub struct PoseclickApp {
    /// Settings new sessions start from
    config: SessionConfig,

    viewer: Option<GridViewer>,

    /// Last composed grid
    grid_texture: Option<egui::TextureHandle>,
    grid_size: Option<(u32, u32)>,

    prompt: DialogSavePrompt,

    /// Message shown in the status bar
    status: Option<String>,

    /// Set once the session has closed and the window should follow
    closing: bool,
}

impl PoseclickApp {
    pub fn new(config: SessionConfig, viewer: Option<GridViewer>) -> Self {
        Self {
            config,
            viewer,
            grid_texture: None,
            grid_size: None,
            prompt: DialogSavePrompt,
            status: None,
            closing: false,
        }
    }

    fn set_status(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("{}", message);
        self.status = Some(message);
    }

    fn report_error(&mut self, context: &str, err: &poseclick::Error) {
        log::error!("{}: {}", context, err);
        self.status = Some(format!("{}: {}", context, err));
    }

    /// Close the running session, resolving unsaved labels first. Returns
    /// `false` if the user cancelled.
    fn close_session(&mut self) -> bool {
        let Some(viewer) = &mut self.viewer else {
            return true;
        };
        match viewer.close(&mut self.prompt) {
            Ok(CloseOutcome::Cancelled) => false,
            Ok(outcome) => {
                log::info!("Session ended: {:?}", outcome);
                self.viewer = None;
                self.grid_texture = None;
                self.grid_size = None;
                true
            }
            Err(e) => {
                self.report_error("Failed to save labels", &e);
                false
            }
        }
    }

    fn open_recording(&mut self, ctx: &egui::Context) {
        let mut config = self.config.clone();
        config.labels_csv = None;
        config.machine_labels_csv = None;
        if !pick_recording(&mut config) || !self.close_session() {
            return;
        }
        match open_session(&config, &DefaultBackend) {
            Ok(viewer) => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Title(viewer.window_title()));
                self.set_status(format!("Opened {} videos", viewer.video_names().len()));
                self.viewer = Some(viewer);
                self.config = config;
            }
            Err(e) => self.report_error("Failed to open recording", &e),
        }
    }

    fn load_labels(&mut self) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Label table", &["csv"])
            .pick_file()
        else {
            return;
        };
        match viewer.load_labels(&path) {
            Ok(()) => self.set_status(format!("Loaded labels from {}", path.display())),
            Err(e) => self.report_error("Failed to load labels", &e),
        }
    }

    fn save_labels(&mut self, path: Option<PathBuf>) {
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        match viewer.save_labels(path.as_deref()) {
            Ok(saved) => self.set_status(format!("Saved labels to {}", saved.display())),
            Err(e) => self.report_error("Failed to save labels", &e),
        }
    }

    fn save_labels_as(&mut self) {
        let Some(viewer) = &self.viewer else {
            return;
        };
        let default_path = viewer.default_save_path();
        let mut dialog = rfd::FileDialog::new().add_filter("Label table", &["csv"]);
        if let Some(name) = default_path.file_name() {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }
        if let Some(dir) = default_path.parent().filter(|dir| dir.is_dir()) {
            dialog = dialog.set_directory(dir);
        }
        if let Some(path) = dialog.save_file() {
            self.save_labels(Some(path));
        }
    }

    fn load_machine_labels(&mut self) {
        let min_confidence = self.config.machine_label_min_confidence;
        let Some(viewer) = &mut self.viewer else {
            return;
        };
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Label table", &["csv"])
            .pick_file()
        else {
            return;
        };
        match viewer.load_machine_labels(&path, min_confidence) {
            Ok(()) => self.set_status(format!("Loaded machine labels from {}", path.display())),
            Err(e) => self.report_error("Failed to load machine labels", &e),
        }
    }

    fn save_settings(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("Session settings", &["yaml", "yml", "json"])
            .set_file_name("poseclick_session.yaml")
            .save_file()
        else {
            return;
        };
        match serialization::export_document(&self.config, &path) {
            Ok(()) => self.set_status(format!("Saved session settings to {}", path.display())),
            Err(e) => self.report_error("Failed to save session settings", &e),
        }
    }

    fn show_menu(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open Recording...").clicked() {
                        ui.close_menu();
                        self.open_recording(ctx);
                    }
                    ui.separator();
                    let has_session = self.viewer.is_some();
                    if ui
                        .add_enabled(has_session, egui::Button::new("Load Labels..."))
                        .clicked()
                    {
                        ui.close_menu();
                        self.load_labels();
                    }
                    if ui
                        .add_enabled(has_session, egui::Button::new("Save Labels"))
                        .clicked()
                    {
                        ui.close_menu();
                        self.save_labels(None);
                    }
                    if ui
                        .add_enabled(has_session, egui::Button::new("Save Labels As..."))
                        .clicked()
                    {
                        ui.close_menu();
                        self.save_labels_as();
                    }
                    ui.separator();
                    if ui
                        .add_enabled(has_session, egui::Button::new("Load Machine Labels..."))
                        .clicked()
                    {
                        ui.close_menu();
                        self.load_machine_labels();
                    }
                    let has_machine = self
                        .viewer
                        .as_ref()
                        .is_some_and(|viewer| viewer.machine_labels().is_some());
                    if ui
                        .add_enabled(has_machine, egui::Button::new("Clear Machine Labels"))
                        .clicked()
                    {
                        ui.close_menu();
                        if let Some(viewer) = &mut self.viewer {
                            viewer.clear_machine_labels();
                        }
                    }
                    ui.separator();
                    if ui.button("Save Session Settings...").clicked() {
                        ui.close_menu();
                        self.save_settings();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ui.close_menu();
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });
    }

    fn upload_grid(&mut self, ctx: &egui::Context, grid: image::RgbImage) {
        let size = [grid.width() as usize, grid.height() as usize];
        let color_image = egui::ColorImage::from_rgb(size, grid.as_raw());
        match &mut self.grid_texture {
            Some(texture) => texture.set(color_image, egui::TextureOptions::LINEAR),
            None => {
                self.grid_texture =
                    Some(ctx.load_texture("video_grid", color_image, egui::TextureOptions::LINEAR));
            }
        }
        self.grid_size = Some((grid.width(), grid.height()));
    }
}

/// Keyboard input for the viewer. Characters arrive as text so the key map
/// sees what the user typed.
fn keyboard_events(ctx: &egui::Context) -> Vec<InputEvent> {
    if ctx.wants_keyboard_input() {
        return Vec::new();
    }
    ctx.input(|i| {
        let mut events = Vec::new();
        for event in &i.events {
            match event {
                egui::Event::Text(text) => {
                    for ch in text.chars() {
                        let key = if ch == ' ' { KeyCode::Space } else { KeyCode::Char(ch) };
                        events.push(InputEvent::Key(key));
                    }
                }
                egui::Event::Key {
                    key: egui::Key::Escape,
                    pressed: true,
                    ..
                } => events.push(InputEvent::Key(KeyCode::Escape)),
                _ => {}
            }
        }
        events
    })
}

impl eframe::App for PoseclickApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut events = Vec::new();

        // Window close runs the session's close policy first
        if ctx.input(|i| i.viewport().close_requested()) && !self.closing {
            if self.viewer.as_ref().is_some_and(|viewer| !viewer.is_closed()) {
                ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
                events.push(InputEvent::CloseRequested);
            }
        }

        self.show_menu(ctx);

        if let Some(viewer) = &mut self.viewer {
            let command = egui::TopBottomPanel::top("toolbar")
                .show(ctx, |ui| toolbar::show(ui, viewer))
                .inner;
            if let Some(command) = command {
                viewer.execute(command);
            }

            let selected = egui::SidePanel::right("tracked_points")
                .default_width(250.0)
                .show(ctx, |ui| properties::show(ui, viewer))
                .inner;
            if let Some(point) = selected {
                if let Err(e) = viewer.set_active_point(&point) {
                    log::warn!("{}", e);
                }
            }

            let seek = egui::TopBottomPanel::bottom("timeline")
                .show(ctx, |ui| timeline::show(ui, viewer))
                .inner;
            if let Some(frame) = seek {
                viewer.seek(frame);
            }
        }

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| match &self.viewer {
                Some(viewer) => {
                    ui.label(format!("Active point: {}", viewer.labels().active_point()));
                    ui.separator();
                    let failed = viewer.failed_videos();
                    if !failed.is_empty() {
                        ui.colored_label(
                            egui::Color32::LIGHT_RED,
                            format!("Decode failed: {}", failed.join(", ")),
                        );
                        ui.separator();
                    }
                    if let Some(status) = &self.status {
                        ui.label(status);
                    }
                }
                None => {
                    ui.label(self.status.as_deref().unwrap_or("No recording loaded"));
                }
            });
        });

        let canvas_events = egui::CentralPanel::default()
            .show(ctx, |ui| canvas::show(ui, &self.grid_texture, self.grid_size))
            .inner;
        events.extend(canvas_events);
        events.extend(keyboard_events(ctx));

        let Some(viewer) = &mut self.viewer else {
            return;
        };
        match viewer.tick(&events, &mut self.prompt) {
            Ok(TickOutcome::Frame(grid)) => {
                let playing = viewer.state() == PlaybackState::Playing;
                let interval = viewer.frame_interval();
                self.upload_grid(ctx, grid);
                if playing {
                    match interval {
                        Some(interval) => ctx.request_repaint_after(interval),
                        None => ctx.request_repaint(),
                    }
                }
            }
            Ok(TickOutcome::Closed(outcome)) => {
                log::info!("Session ended: {:?}", outcome);
                self.closing = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
            Ok(TickOutcome::Inactive) => {}
            Err(e) => self.report_error("Failed to close session", &e),
        }
    }
}
