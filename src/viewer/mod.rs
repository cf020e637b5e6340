// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! The interactive grid viewer.
//!
//! A [`GridViewer`] owns one session: the opened videos with their scaling,
//! zoom and image adjustments, the label table being edited, and an optional
//! read-only table of machine labels. The display feeds it [`InputEvent`]s
//! and shows the image returned by [`GridViewer::tick`].
//!
//! Videos are ordered by name; that order is both the grid order and the
//! index order of the label table.

pub mod close;
pub mod input;
pub mod session;

pub use close::{CloseOutcome, FixedDecision, SaveDecision, SavePrompt};
pub use input::{command_for_key, InputEvent, KeyCode, ViewerCommand};
pub use session::open_session;

use crate::error::{Error, Result};
use crate::grid::{GridLayout, ScalingParameters, ZoomDirection, ZoomState};
use crate::io::label_csv::CsvLoadOptions;
use crate::io::media::VideoSource;
use crate::models::labels::LabelStore;
use crate::models::project::{ClosePolicy, SessionConfig};
use crate::models::video::{common_frame_count, VideoDescriptor};
use crate::render::annotator::{AnnotationRenderer, AnnotationStyle};
use crate::render::compositor::{self, VideoAdjustments};
use image::RgbImage;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Playing,
    Paused,
    Closed,
}

/// Session behavior that is not part of the loaded data.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerOptions {
    pub max_window_size: (u32, u32),
    pub start_paused: bool,
    pub step_size: usize,
    pub auto_next_point: bool,
    pub frames_per_second: Option<f64>,
    pub on_close: ClosePolicy,
    pub output_path: Option<PathBuf>,
    pub recording_folder: PathBuf,
}

impl Default for ViewerOptions {
    fn default() -> Self {
        Self::from(&SessionConfig::default())
    }
}

impl From<&SessionConfig> for ViewerOptions {
    fn from(config: &SessionConfig) -> Self {
        Self {
            max_window_size: config.max_window_size,
            start_paused: config.start_paused,
            step_size: config.step_size.max(1),
            auto_next_point: config.auto_next_point,
            frames_per_second: config.frames_per_second,
            on_close: config.on_close,
            output_path: config.output_path.clone(),
            recording_folder: config.recording_folder(),
        }
    }
}

/// Result of one pass of the viewer loop.
#[derive(Debug)]
pub enum TickOutcome {
    Frame(RgbImage),
    Closed(CloseOutcome),
    /// The session was already closed.
    Inactive,
}

struct VideoCell {
    source: VideoSource,
    scaling: ScalingParameters,
    zoom: ZoomState,
    adjustments: VideoAdjustments,
}

pub struct GridViewer {
    /// Per-video state keyed by video name.
    cells: BTreeMap<String, VideoCell>,
    /// Video name at each grid position.
    grid_order: Vec<String>,
    layout: GridLayout,
    labels: LabelStore,
    machine_labels: Option<LabelStore>,
    renderer: AnnotationRenderer,
    manual_style: AnnotationStyle,
    machine_style: AnnotationStyle,
    frame_count: usize,
    frame_number: usize,
    state: PlaybackState,
    show_help: bool,
    show_machine_labels: bool,
    pointer: Option<(f64, f64)>,
    last_advance: Option<Instant>,
    last_saved: Option<PathBuf>,
    options: ViewerOptions,
}

impl GridViewer {
    /// Build a session from opened videos. Fails before anything is rendered
    /// if the videos disagree on their frame count.
    pub fn new(
        mut sources: Vec<VideoSource>,
        mut labels: LabelStore,
        machine_labels: Option<LabelStore>,
        options: ViewerOptions,
    ) -> Result<Self> {
        sources.sort_by(|a, b| a.name().cmp(b.name()));
        let descriptors: Vec<VideoDescriptor> =
            sources.iter().map(|s| s.descriptor().clone()).collect();
        let frame_count = common_frame_count(&descriptors)?;

        let sizes: Vec<(u32, u32)> = descriptors.iter().map(VideoDescriptor::size).collect();
        let layout = GridLayout::calculate(&sizes, options.max_window_size)?;
        let (cell_width, cell_height) = layout.cell_size();

        let names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
        labels.extend_domain(&names, frame_count);
        if let Some(machine) = &machine_labels {
            for name in machine.video_names() {
                if !names.contains(name) {
                    log::warn!("Machine labels for unknown video {} are ignored", name);
                }
            }
        }

        let cells = sources
            .into_iter()
            .map(|source| {
                let (width, height) = source.descriptor().size();
                let cell = VideoCell {
                    scaling: ScalingParameters::fit(width, height, cell_width, cell_height),
                    source,
                    zoom: ZoomState::default(),
                    adjustments: VideoAdjustments::default(),
                };
                (cell.source.name().to_string(), cell)
            })
            .collect();

        let state = if options.start_paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        };
        log::info!(
            "Session ready: {} videos, {} frames, active point {}",
            names.len(),
            frame_count,
            labels.active_point()
        );

        Ok(Self {
            cells,
            grid_order: names,
            layout,
            renderer: AnnotationRenderer::new(labels.point_names()),
            labels,
            machine_labels,
            manual_style: AnnotationStyle::manual(),
            machine_style: AnnotationStyle::machine(),
            frame_count,
            frame_number: 0,
            state,
            show_help: false,
            show_machine_labels: false,
            pointer: None,
            last_advance: None,
            last_saved: None,
            options,
        })
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn frame_number(&self) -> usize {
        self.frame_number
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == PlaybackState::Closed
    }

    pub fn labels(&self) -> &LabelStore {
        &self.labels
    }

    pub fn machine_labels(&self) -> Option<&LabelStore> {
        self.machine_labels.as_ref()
    }

    pub fn video_names(&self) -> Vec<&str> {
        self.grid_order.iter().map(String::as_str).collect()
    }

    /// Videos whose decoder has given up.
    pub fn failed_videos(&self) -> Vec<&str> {
        self.grid_order
            .iter()
            .filter(|name| {
                self.cells
                    .get(name.as_str())
                    .is_some_and(|cell| cell.source.has_failed())
            })
            .map(String::as_str)
            .collect()
    }

    pub fn zoom(&self, video: &str) -> Option<&ZoomState> {
        self.cells.get(video).map(|cell| &cell.zoom)
    }

    pub fn adjustments(&self, video: &str) -> Option<&VideoAdjustments> {
        self.cells.get(video).map(|cell| &cell.adjustments)
    }

    fn cell_at(&self, index: usize) -> Option<&VideoCell> {
        self.cells.get(self.grid_order.get(index)?)
    }

    fn cell_at_mut(&mut self, index: usize) -> Option<&mut VideoCell> {
        self.cells.get_mut(self.grid_order.get(index)?)
    }

    pub fn auto_next_point(&self) -> bool {
        self.options.auto_next_point
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn show_machine_labels(&self) -> bool {
        self.show_machine_labels
    }

    pub fn show_point_names(&self) -> bool {
        self.manual_style.show_names
    }

    pub fn show_label_list(&self) -> bool {
        self.manual_style.show_label_list
    }

    /// Marker color of a tracked point.
    pub fn point_color(&self, name: &str) -> image::Rgb<u8> {
        self.renderer.point_color(name)
    }

    pub fn last_saved(&self) -> Option<&Path> {
        self.last_saved.as_deref()
    }

    /// Playback interval, if playback is rate limited.
    pub fn frame_interval(&self) -> Option<Duration> {
        self.options
            .frames_per_second
            .map(|fps| Duration::from_secs_f64(1.0 / fps))
    }

    pub fn window_title(&self) -> String {
        let folder = self.options.recording_folder.display().to_string();
        if folder.is_empty() {
            "poseclick".to_string()
        } else {
            format!("poseclick - {}", folder)
        }
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.layout.total_width(), self.layout.total_height())
    }

    /// Video under the last known pointer position.
    pub fn active_video(&self) -> Option<usize> {
        let (x, y) = self.pointer?;
        self.locate(x, y).map(|(index, _, _)| index)
    }

    /// Video index and cell-relative position of a grid pixel.
    fn locate(&self, x: f64, y: f64) -> Option<(usize, f64, f64)> {
        if !(x >= 0.0 && y >= 0.0) {
            return None;
        }
        let (px, py) = (x.floor() as u32, y.floor() as u32);
        if px >= self.layout.total_width() || py >= self.layout.total_height() {
            return None;
        }
        let (cell, (cell_x, cell_y)) = self.layout.locate(px, py);
        let index = self.layout.index_of(cell)?;
        (index < self.grid_order.len()).then_some((index, cell_x as f64, cell_y as f64))
    }

    /// Apply one input event. Returns `true` when the session should close.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::PointerMoved { x, y } => {
                self.pointer = Some((x, y));
                false
            }
            InputEvent::Click { x, y } => {
                self.pointer = Some((x, y));
                self.click(x, y);
                false
            }
            InputEvent::Scroll { x, y, direction } => {
                self.pointer = Some((x, y));
                self.zoom_at(x, y, direction);
                false
            }
            InputEvent::Key(key) => match command_for_key(key) {
                Some(command) => self.execute(command),
                None => false,
            },
            InputEvent::CloseRequested => true,
        }
    }

    /// Run a command. Returns `true` when the session should close.
    pub fn execute(&mut self, command: ViewerCommand) -> bool {
        match command {
            ViewerCommand::Close => return true,
            ViewerCommand::TogglePlayback => self.toggle_playback(),
            ViewerCommand::ResetZoom => self.reset_zoom(),
            ViewerCommand::StepFrames(delta) => self.step_frames(delta),
            ViewerCommand::JumpToLabeledFrame { reverse } => self.jump_to_labeled_frame(reverse),
            ViewerCommand::MoveActivePoint(delta) => self.labels.move_active_point(delta),
            ViewerCommand::Zoom(direction) => {
                if let Some((x, y)) = self.pointer {
                    self.zoom_at(x, y, direction);
                }
            }
            ViewerCommand::Pan { dx, dy } => {
                if let Some(cell) = self.active_cell_mut() {
                    cell.zoom.pan(dx, dy);
                }
            }
            ViewerCommand::ClearActivePoint => self.clear_active_point(),
            ViewerCommand::CopyMachineLabels => {
                self.copy_machine_labels();
            }
            ViewerCommand::ToggleHelp => self.show_help = !self.show_help,
            ViewerCommand::ToggleAutoNextPoint => {
                self.options.auto_next_point = !self.options.auto_next_point;
                log::info!("Auto next point: {}", self.options.auto_next_point);
            }
            ViewerCommand::ToggleMachineLabels => self.toggle_machine_labels(),
            ViewerCommand::TogglePointNames => {
                let show = !self.manual_style.show_names;
                self.manual_style.show_names = show;
                self.machine_style.show_names = show;
            }
            ViewerCommand::ToggleLabelList => {
                self.manual_style.show_label_list = !self.manual_style.show_label_list;
            }
            ViewerCommand::ChangeBrightness { increase } => {
                if let Some(cell) = self.active_cell_mut() {
                    cell.adjustments.change_brightness(increase);
                }
            }
            ViewerCommand::ChangeContrast { increase } => {
                if let Some(cell) = self.active_cell_mut() {
                    cell.adjustments.change_contrast(increase);
                }
            }
            ViewerCommand::ResetAdjustments => {
                if let Some(cell) = self.active_cell_mut() {
                    cell.adjustments.reset();
                }
            }
        }
        false
    }

    fn active_cell_mut(&mut self) -> Option<&mut VideoCell> {
        let index = self.active_video()?;
        self.cell_at_mut(index)
    }

    fn click(&mut self, x: f64, y: f64) {
        let Some((index, cell_x, cell_y)) = self.locate(x, y) else {
            return;
        };
        let Some(cell) = self.cell_at(index) else {
            return;
        };
        let (video_x, video_y) = cell.zoom.video_point(cell_x, cell_y, &cell.scaling);
        let (video_x, video_y) = (video_x.floor(), video_y.floor());

        let descriptor = cell.source.descriptor();
        if video_x >= descriptor.width as f64 || video_y >= descriptor.height as f64 {
            log::debug!("Click outside {} ignored", descriptor.name);
            return;
        }
        let name = descriptor.name.clone();
        let point = self.labels.active_point().to_string();
        if self.labels.record_click(
            name.as_str(),
            self.frame_number,
            video_x,
            video_y,
            self.options.auto_next_point,
        ) {
            log::debug!(
                "Labeled {} at ({}, {}) on {} frame {}",
                point,
                video_x,
                video_y,
                name,
                self.frame_number
            );
        }
    }

    fn zoom_at(&mut self, x: f64, y: f64, direction: ZoomDirection) {
        let Some((index, cell_x, cell_y)) = self.locate(x, y) else {
            return;
        };
        let Some(cell) = self.cell_at_mut(index) else {
            return;
        };
        cell.zoom.zoom_at(cell_x, cell_y, direction, &cell.scaling);
    }

    pub fn reset_zoom(&mut self) {
        for cell in self.cells.values_mut() {
            cell.zoom.reset();
        }
    }

    pub fn toggle_playback(&mut self) {
        self.state = match self.state {
            PlaybackState::Playing => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Playing,
            PlaybackState::Closed => PlaybackState::Closed,
        };
        self.last_advance = None;
    }

    fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Pause and move to a frame, clamped to the valid range.
    pub fn seek(&mut self, frame: usize) {
        self.pause();
        self.frame_number = frame.min(self.frame_count - 1);
    }

    pub fn step_frames(&mut self, delta: i64) {
        let target = (self.frame_number as i64 + delta).max(0) as usize;
        self.seek(target);
    }

    /// Pause on the nearest labeled frame before or after the current one,
    /// wrapping around at either end.
    pub fn jump_to_labeled_frame(&mut self, reverse: bool) {
        self.pause();
        let frames = self.labels.nonempty_frames();
        let (Some(&first), Some(&last)) = (frames.first(), frames.last()) else {
            log::warn!("Jump to labeled frame pressed, but no labeled frames exist");
            return;
        };
        let current = self.frame_number;
        self.frame_number = if reverse {
            frames.iter().rev().copied().find(|&f| f < current).unwrap_or(last)
        } else {
            frames.iter().copied().find(|&f| f > current).unwrap_or(first)
        };
    }

    pub fn set_active_point(&mut self, name: &str) -> Result<()> {
        self.labels.set_active_point(name)
    }

    fn clear_active_point(&mut self) {
        let Some(index) = self.active_video() else {
            return;
        };
        let name = self.grid_order[index].clone();
        self.labels.clear(name.as_str(), self.frame_number, None);
    }

    fn toggle_machine_labels(&mut self) {
        if self.machine_labels.is_none() {
            log::warn!("No machine labels loaded");
            return;
        }
        self.show_machine_labels = !self.show_machine_labels;
        log::info!("Machine labels visible: {}", self.show_machine_labels);
    }

    /// Copy the machine labels of the video under the pointer at the current
    /// frame into the label table. Returns how many points were copied.
    pub fn copy_machine_labels(&mut self) -> usize {
        let (Some(index), Some(machine)) = (self.active_video(), self.machine_labels.as_ref()) else {
            return 0;
        };
        let name = self.grid_order[index].clone();
        let predicted = machine.get(name.as_str(), self.frame_number);

        let mut copied = 0;
        for (point, coordinate) in &predicted {
            match self.labels.try_update(
                name.as_str(),
                self.frame_number,
                coordinate.x,
                coordinate.y,
                Some(point.as_str()),
            ) {
                Ok(()) => copied += 1,
                Err(err) => log::error!("Error copying machine label {}: {}", point, err),
            }
        }
        log::info!(
            "Copied {} machine labels for {} frame {}",
            copied,
            name,
            self.frame_number
        );
        copied
    }

    /// Decode, adjust, annotate and place every video for the current frame.
    /// Videos that fail to decode leave their cell blank.
    pub fn render_grid(&mut self) -> RgbImage {
        let (width, height) = self.window_size();
        let mut canvas = RgbImage::new(width, height);
        let (cell_width, cell_height) = self.layout.cell_size();
        let frame_number = self.frame_number;
        let active_point = self.labels.active_point();

        for (index, name) in self.grid_order.iter().enumerate() {
            let Some(cell) = self.cells.get_mut(name) else {
                continue;
            };
            let Ok(mut frame) = cell.source.get_frame(frame_number) else {
                continue;
            };
            cell.adjustments.apply(&mut frame);

            let labels = self.labels.get(name.as_str(), frame_number);
            self.renderer
                .annotate(&mut frame, &labels, Some(active_point), &self.manual_style);
            if self.show_machine_labels {
                if let Some(machine) = &self.machine_labels {
                    let predicted = machine.get(name.as_str(), frame_number);
                    self.renderer
                        .annotate(&mut frame, &predicted, None, &self.machine_style);
                }
            }

            let (column, row) = self.layout.cell_of(index);
            compositor::place_in_cell(
                &mut canvas,
                &frame,
                (column * cell_width, row * cell_height),
                &cell.scaling,
                &cell.zoom,
            );
        }

        self.renderer
            .annotate_grid(&mut canvas, frame_number, active_point, self.show_help);
        canvas
    }

    /// Move playback forward by the step size if it is time to.
    pub fn advance_playback(&mut self, now: Instant) {
        if self.state != PlaybackState::Playing {
            return;
        }
        if let (Some(interval), Some(last)) = (self.frame_interval(), self.last_advance) {
            if now.duration_since(last) < interval {
                return;
            }
        }
        self.frame_number = (self.frame_number + self.options.step_size) % self.frame_count;
        self.last_advance = Some(now);
    }

    /// One pass of the viewer loop: apply input, render, advance.
    pub fn tick(&mut self, events: &[InputEvent], prompt: &mut dyn SavePrompt) -> Result<TickOutcome> {
        if self.is_closed() {
            return Ok(TickOutcome::Inactive);
        }
        let mut close_requested = false;
        for event in events {
            close_requested |= self.handle_event(event);
        }
        if close_requested {
            match self.close(prompt)? {
                CloseOutcome::Cancelled => {}
                outcome => return Ok(TickOutcome::Closed(outcome)),
            }
        }
        let image = self.render_grid();
        self.advance_playback(Instant::now());
        Ok(TickOutcome::Frame(image))
    }

    /// Write the label table. Without a path the configured output path or
    /// the default timestamped location is used.
    pub fn save_labels(&mut self, path: Option<&Path>) -> Result<PathBuf> {
        let target = match path {
            Some(path) => path.to_path_buf(),
            None => self.default_save_path(),
        };
        close::create_parent_dir(&target)?;
        self.labels.save(&target)?;
        self.last_saved = Some(target.clone());
        Ok(target)
    }

    pub fn default_save_path(&self) -> PathBuf {
        close::resolve_save_path(
            self.options.output_path.as_deref(),
            &self.options.recording_folder,
            chrono::Local::now(),
        )
    }

    /// Replace the label table with one loaded from disk. Its points become
    /// the session's tracked points.
    pub fn load_labels(&mut self, path: &Path) -> Result<()> {
        let mut labels = LabelStore::load(path)?;
        let names: Vec<String> = self.video_names().into_iter().map(String::from).collect();
        labels.extend_domain(&names, self.frame_count);
        if labels.frame_count() > self.frame_count {
            return Err(Error::data_format(format!(
                "{} has labels up to frame {} but the videos have {} frames",
                path.display(),
                labels.frame_count() - 1,
                self.frame_count
            )));
        }
        self.renderer = AnnotationRenderer::new(labels.point_names());
        self.labels = labels;
        Ok(())
    }

    pub fn load_machine_labels(&mut self, path: &Path, min_confidence: Option<f64>) -> Result<()> {
        let options = CsvLoadOptions { min_confidence };
        self.machine_labels = Some(LabelStore::load_with(path, &options)?);
        self.show_machine_labels = true;
        Ok(())
    }

    pub fn clear_machine_labels(&mut self) {
        self.machine_labels = None;
        self.show_machine_labels = false;
    }

    /// End the session. Unsaved labels are resolved through the close policy
    /// first; a cancelled prompt leaves the session running. Every video
    /// handle is released once the session is closed.
    pub fn close(&mut self, prompt: &mut dyn SavePrompt) -> Result<CloseOutcome> {
        if self.is_closed() {
            return Ok(CloseOutcome::NothingToSave);
        }
        let outcome = if !self.labels.has_unsaved_changes() {
            CloseOutcome::NothingToSave
        } else {
            match self.options.on_close {
                ClosePolicy::AutoSave => CloseOutcome::Saved(self.save_labels(None)?),
                ClosePolicy::Discard => {
                    log::warn!("Discarding unsaved labels");
                    CloseOutcome::Discarded
                }
                ClosePolicy::Prompt => {
                    let target = self.default_save_path();
                    match prompt.confirm_save(&target) {
                        SaveDecision::Save => CloseOutcome::Saved(self.save_labels(Some(&target))?),
                        SaveDecision::Discard => {
                            log::info!("Data not saved.");
                            CloseOutcome::Discarded
                        }
                        SaveDecision::Cancel => {
                            log::info!("Close cancelled");
                            return Ok(CloseOutcome::Cancelled);
                        }
                    }
                }
            }
        };

        for cell in self.cells.values_mut() {
            cell.source.close();
        }
        self.state = PlaybackState::Closed;
        log::info!("Session closed");
        Ok(outcome)
    }
}

/// A viewer over in-memory videos for tests elsewhere in the crate.
#[cfg(test)]
pub(crate) fn test_viewer(sizes: &[(u32, u32)], frames: usize, points: &[&str]) -> GridViewer {
    use crate::io::media::testing;
    use crate::models::annotation::TrackedPointSet;

    let sources: Vec<VideoSource> = sizes
        .iter()
        .enumerate()
        .map(|(i, &(w, h))| testing::source(&format!("cam_{}.mp4", i), w, h, frames))
        .collect();
    let names: Vec<String> = sources.iter().map(|s| s.name().to_string()).collect();
    let labels = LabelStore::new(
        TrackedPointSet::new(points.iter().copied()).unwrap(),
        &names,
        frames,
    );
    let options = ViewerOptions {
        start_paused: true,
        frames_per_second: None,
        on_close: ClosePolicy::Prompt,
        ..ViewerOptions::default()
    };
    GridViewer::new(sources, labels, None, options).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::testing::{self, SyntheticReader};
    use crate::models::annotation::{Coordinate, TrackedPointSet};

    const HD_HALF: (u32, u32) = (960, 540);

    fn three_cameras() -> GridViewer {
        test_viewer(&[HD_HALF, HD_HALF, HD_HALF], 100, &["nose", "left_eye", "tail"])
    }

    fn key(ch: char) -> InputEvent {
        InputEvent::Key(KeyCode::Char(ch))
    }

    fn run(viewer: &mut GridViewer, events: &[InputEvent]) -> RgbImage {
        match viewer.tick(events, &mut FixedDecision(SaveDecision::Cancel)).unwrap() {
            TickOutcome::Frame(image) => image,
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    #[test]
    fn test_click_then_scroll_on_first_cell() {
        let mut viewer = three_cameras();
        assert!(matches!(viewer.layout().capacity(), 3 | 4));

        let image = run(&mut viewer, &[InputEvent::Click { x: 50.0, y: 50.0 }]);
        assert_eq!(image.dimensions(), (1920, 1080));
        let labels = viewer.labels().get(0usize, 0);
        assert_eq!(labels.get("nose"), Some(&Coordinate::new(50.0, 50.0)));

        run(
            &mut viewer,
            &[InputEvent::Scroll {
                x: 50.0,
                y: 50.0,
                direction: ZoomDirection::In,
            }],
        );
        let zoom = viewer.zoom("cam_0.mp4").unwrap();
        assert!((zoom.scale - 1.1).abs() < 1e-12);
        assert_eq!((zoom.center_x, zoom.center_y), (50.0, 50.0));
        assert_eq!(viewer.zoom("cam_1.mp4").unwrap(), &ZoomState::default());
    }

    #[test]
    fn test_cell_state_follows_video_name() {
        let sources = vec![
            testing::source("side.mp4", 640, 480, 10),
            testing::source("front.mp4", 640, 480, 10),
        ];
        let names = vec!["side.mp4".to_string(), "front.mp4".to_string()];
        let labels = LabelStore::new(TrackedPointSet::new(["nose"]).unwrap(), &names, 10);
        let mut viewer = GridViewer::new(sources, labels, None, ViewerOptions::default()).unwrap();
        assert_eq!(viewer.video_names(), ["front.mp4", "side.mp4"]);

        let (column, row) = viewer.layout().cell_of(1);
        let (cell_width, cell_height) = viewer.layout().cell_size();
        let (x, y) = ((column * cell_width + 10) as f64, (row * cell_height + 10) as f64);
        viewer.handle_event(&InputEvent::Scroll {
            x,
            y,
            direction: ZoomDirection::In,
        });
        assert!(viewer.zoom("side.mp4").unwrap().is_zoomed());
        assert_eq!(viewer.zoom("front.mp4").unwrap(), &ZoomState::default());
        assert!(viewer.zoom("missing.mp4").is_none());
    }

    #[test]
    fn test_mismatched_frame_counts_fail_before_rendering() {
        let sources = vec![
            testing::source("a.mp4", 640, 480, 100),
            testing::source("b.mp4", 640, 480, 100),
            testing::source("c.mp4", 640, 480, 99),
        ];
        let labels = LabelStore::new(TrackedPointSet::new(["nose"]).unwrap(), &[], 100);
        let err = GridViewer::new(sources, labels, None, ViewerOptions::default())
            .err()
            .unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_click_maps_through_scaling() {
        // 1920x1080 videos are shrunk into their cells
        let mut viewer = test_viewer(&[(1920, 1080), (1920, 1080)], 10, &["nose"]);
        let (cell_width, cell_height) = viewer.layout().cell_size();
        let scaling = ScalingParameters::fit(1920, 1080, cell_width, cell_height);
        let (column, row) = viewer.layout().cell_of(1);
        let x = (column * cell_width + scaling.x_offset) as f64 + 100.0;
        let y = (row * cell_height + scaling.y_offset) as f64 + 40.0;
        viewer.handle_event(&InputEvent::Click { x, y });

        let expected = Coordinate::new(
            (100.0 * 1920.0 / scaling.scaled_width as f64).floor(),
            (40.0 * 1080.0 / scaling.scaled_height as f64).floor(),
        );
        let labels = viewer.labels().get("cam_1.mp4", 0);
        assert_eq!(labels.get("nose"), Some(&expected));
        assert!(viewer.labels().get("cam_0.mp4", 0).is_empty());
    }

    #[test]
    fn test_click_on_padding_is_rejected() {
        // 4:3 video in a 16:9 cell has side padding
        let mut viewer = test_viewer(&[(640, 480)], 10, &["nose"]);
        viewer.handle_event(&InputEvent::Click { x: 5.0, y: 100.0 });
        assert!(viewer.labels().nonempty_frames().is_empty());
        assert!(!viewer.labels().has_unsaved_changes());
    }

    #[test]
    fn test_click_on_empty_cell_is_ignored() {
        let mut viewer = three_cameras();
        viewer.handle_event(&InputEvent::Click { x: 1500.0, y: 800.0 });
        assert!(viewer.labels().nonempty_frames().is_empty());
    }

    #[test]
    fn test_auto_next_point() {
        let mut viewer = three_cameras();
        viewer.handle_event(&InputEvent::Click { x: 10.0, y: 10.0 });
        assert_eq!(viewer.labels().active_point(), "left_eye");

        viewer.handle_event(&key('c'));
        viewer.handle_event(&InputEvent::Click { x: 20.0, y: 20.0 });
        assert_eq!(viewer.labels().active_point(), "left_eye");
        assert_eq!(viewer.labels().get(0usize, 0).len(), 2);
    }

    #[test]
    fn test_playback_and_frame_steps() {
        let mut viewer = three_cameras();
        assert_eq!(viewer.state(), PlaybackState::Paused);

        run(&mut viewer, &[InputEvent::Key(KeyCode::Space)]);
        assert_eq!(viewer.state(), PlaybackState::Playing);
        assert_eq!(viewer.frame_number(), 1);

        viewer.handle_event(&key('a'));
        assert_eq!(viewer.state(), PlaybackState::Paused);
        assert_eq!(viewer.frame_number(), 0);
        viewer.handle_event(&key('a'));
        assert_eq!(viewer.frame_number(), 0);

        viewer.seek(500);
        assert_eq!(viewer.frame_number(), 99);
        viewer.handle_event(&key('d'));
        assert_eq!(viewer.frame_number(), 99);
    }

    #[test]
    fn test_playback_wraps() {
        let mut viewer = test_viewer(&[(64, 48)], 3, &["nose"]);
        viewer.toggle_playback();
        for expected in [1, 2, 0, 1] {
            viewer.advance_playback(Instant::now());
            assert_eq!(viewer.frame_number(), expected);
        }
    }

    #[test]
    fn test_jump_to_labeled_frames_wraps() {
        let mut viewer = three_cameras();
        for frame in [10, 40] {
            viewer.seek(frame);
            viewer.handle_event(&InputEvent::Click { x: 5.0, y: 5.0 });
        }
        viewer.seek(20);
        viewer.handle_event(&key('g'));
        assert_eq!(viewer.frame_number(), 40);
        viewer.handle_event(&key('g'));
        assert_eq!(viewer.frame_number(), 10);
        viewer.handle_event(&key('f'));
        assert_eq!(viewer.frame_number(), 40);
    }

    #[test]
    fn test_jump_without_labels_stays() {
        let mut viewer = three_cameras();
        viewer.seek(7);
        viewer.handle_event(&key('g'));
        assert_eq!(viewer.frame_number(), 7);
    }

    #[test]
    fn test_keyboard_zoom_pan_and_reset() {
        let mut viewer = three_cameras();
        viewer.handle_event(&key('e'));
        assert_eq!(viewer.zoom("cam_0.mp4").unwrap(), &ZoomState::default());

        viewer.handle_event(&InputEvent::PointerMoved { x: 1000.0, y: 100.0 });
        viewer.handle_event(&key('e'));
        let zoom = *viewer.zoom("cam_1.mp4").unwrap();
        assert!(zoom.is_zoomed());
        assert_eq!((zoom.center_x, zoom.center_y), (40.0, 100.0));

        viewer.handle_event(&key('l'));
        viewer.handle_event(&key('i'));
        let zoom = *viewer.zoom("cam_1.mp4").unwrap();
        assert_eq!((zoom.center_x, zoom.center_y), (50.0, 90.0));

        viewer.handle_event(&key('q'));
        viewer.handle_event(&key('r'));
        assert_eq!(viewer.zoom("cam_1.mp4").unwrap(), &ZoomState::default());
    }

    #[test]
    fn test_active_point_keys_and_clear() {
        let mut viewer = three_cameras();
        viewer.handle_event(&key('w'));
        assert_eq!(viewer.labels().active_point(), "tail");
        viewer.handle_event(&key('s'));
        assert_eq!(viewer.labels().active_point(), "nose");

        viewer.handle_event(&key('c'));
        viewer.handle_event(&InputEvent::Click { x: 30.0, y: 30.0 });
        assert_eq!(viewer.labels().get(0usize, 0).len(), 1);
        viewer.handle_event(&key('u'));
        assert!(viewer.labels().get(0usize, 0).is_empty());

        assert!(viewer.set_active_point("elbow").is_err());
        viewer.set_active_point("tail").unwrap();
        assert_eq!(viewer.labels().active_point(), "tail");
    }

    #[test]
    fn test_brightness_applies_to_video_under_pointer() {
        let mut viewer = three_cameras();
        viewer.handle_event(&InputEvent::PointerMoved { x: 100.0, y: 600.0 });
        viewer.handle_event(&key('2'));
        viewer.handle_event(&key('4'));
        let adjustments = viewer.adjustments("cam_2.mp4").unwrap();
        assert_eq!(adjustments.brightness, 10);
        assert_eq!(adjustments.contrast, 2.0);
        assert!(viewer.adjustments("cam_0.mp4").unwrap().is_identity());

        viewer.handle_event(&key('5'));
        assert!(viewer.adjustments("cam_2.mp4").unwrap().is_identity());
    }

    #[test]
    fn test_toggles() {
        let mut viewer = three_cameras();
        viewer.handle_event(&key('h'));
        viewer.handle_event(&key('n'));
        viewer.handle_event(&key(','));
        assert!(viewer.show_help());
        assert!(!viewer.show_point_names());
        assert!(!viewer.show_label_list());
        viewer.handle_event(&key('m'));
        assert!(!viewer.show_machine_labels());
    }

    #[test]
    fn test_copy_machine_labels() {
        let mut viewer = three_cameras();
        let names: Vec<String> = viewer.video_names().into_iter().map(String::from).collect();
        let mut machine = LabelStore::new(
            TrackedPointSet::new(["nose", "tail", "paw"]).unwrap(),
            &names,
            100,
        );
        machine.update("cam_0.mp4", 0, 12.0, 34.0, Some("nose"));
        machine.update("cam_0.mp4", 0, 56.0, 78.0, Some("paw"));
        viewer.machine_labels = Some(machine);

        viewer.handle_event(&InputEvent::PointerMoved { x: 5.0, y: 5.0 });
        viewer.handle_event(&key('v'));
        let labels = viewer.labels().get(0usize, 0);
        assert_eq!(labels.len(), 1);
        assert_eq!(labels.get("nose"), Some(&Coordinate::new(12.0, 34.0)));

        viewer.handle_event(&key('m'));
        assert!(viewer.show_machine_labels());
        run(&mut viewer, &[]);
    }

    #[test]
    fn test_decode_failure_leaves_cell_blank() {
        let mut failing = SyntheticReader::new(960, 540, 10);
        failing.failing_frames.insert(0);
        let sources = vec![
            VideoSource::from_reader(Path::new("bad.mp4"), Box::new(failing)),
            testing::source("good.mp4", 960, 540, 10),
        ];
        let labels = LabelStore::new(TrackedPointSet::new(["nose"]).unwrap(), &[], 10);
        let options = ViewerOptions {
            start_paused: true,
            ..ViewerOptions::default()
        };
        let mut viewer = GridViewer::new(sources, labels, None, options).unwrap();
        let image = viewer.render_grid();
        // bad.mp4 sorts first and renders black; good.mp4 carries the test color
        let (cell_width, cell_height) = viewer.layout().cell_size();
        let pixel_in = |index: usize| {
            let (column, row) = viewer.layout().cell_of(index);
            (column * cell_width + cell_width / 2, row * cell_height + 20)
        };
        let (x, y) = pixel_in(0);
        assert_eq!(image.get_pixel(x, y), &image::Rgb([0, 0, 0]));
        let (x, y) = pixel_in(1);
        assert_eq!(image.get_pixel(x, y), &image::Rgb([0, 100, 100]));
    }

    #[test]
    fn test_close_without_changes_releases_videos() {
        let mut viewer = three_cameras();
        let outcome = viewer
            .tick(&[InputEvent::Key(KeyCode::Escape)], &mut FixedDecision(SaveDecision::Cancel))
            .unwrap();
        assert!(matches!(outcome, TickOutcome::Closed(CloseOutcome::NothingToSave)));
        assert!(viewer.is_closed());
        assert!(viewer.cells.values().all(|cell| !cell.source.is_open()));
        assert!(matches!(
            viewer.tick(&[], &mut FixedDecision(SaveDecision::Save)).unwrap(),
            TickOutcome::Inactive
        ));
    }

    #[test]
    fn test_cancelled_close_keeps_session() {
        let mut viewer = three_cameras();
        viewer.handle_event(&InputEvent::Click { x: 5.0, y: 5.0 });
        let outcome = viewer.close(&mut FixedDecision(SaveDecision::Cancel)).unwrap();
        assert_eq!(outcome, CloseOutcome::Cancelled);
        assert!(!viewer.is_closed());
        assert!(viewer.labels().has_unsaved_changes());
        run(&mut viewer, &[]);
    }

    #[test]
    fn test_prompted_save_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = three_cameras();
        viewer.options.output_path = Some(dir.path().join("labels.csv"));
        viewer.handle_event(&InputEvent::Click { x: 5.0, y: 5.0 });

        let outcome = viewer.close(&mut FixedDecision(SaveDecision::Save)).unwrap();
        let path = dir.path().join("labels.csv");
        assert_eq!(outcome, CloseOutcome::Saved(path.clone()));
        let saved = LabelStore::load(&path).unwrap();
        assert_eq!(saved.get("cam_0.mp4", 0).get("nose"), Some(&Coordinate::new(5.0, 5.0)));
        assert_eq!(saved.video_names().len(), 3);
        assert_eq!(saved.frame_count(), 100);
    }

    #[test]
    fn test_auto_save_and_discard_policies() {
        let dir = tempfile::tempdir().unwrap();
        let mut viewer = three_cameras();
        viewer.options.on_close = ClosePolicy::AutoSave;
        viewer.options.recording_folder = dir.path().join("videos");
        viewer.handle_event(&InputEvent::Click { x: 5.0, y: 5.0 });
        let CloseOutcome::Saved(path) = viewer.close(&mut FixedDecision(SaveDecision::Cancel)).unwrap()
        else {
            panic!("expected an automatic save");
        };
        assert!(path.starts_with(dir.path().join(close::OUTPUT_DIR_NAME)));
        assert!(path.exists());

        let mut viewer = three_cameras();
        viewer.options.on_close = ClosePolicy::Discard;
        viewer.handle_event(&InputEvent::Click { x: 5.0, y: 5.0 });
        let outcome = viewer.close(&mut FixedDecision(SaveDecision::Save)).unwrap();
        assert_eq!(outcome, CloseOutcome::Discarded);
    }

    #[test]
    fn test_load_labels_replaces_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labels.csv");
        std::fs::write(&path, "video,frame,paw_x,paw_y\ncam_1.mp4,3,7,8\n").unwrap();

        let mut viewer = three_cameras();
        viewer.load_labels(&path).unwrap();
        assert_eq!(viewer.labels().point_names(), ["paw"]);
        assert_eq!(viewer.labels().frame_count(), 100);
        assert_eq!(viewer.labels().video_names().len(), 3);
        assert_eq!(viewer.labels().nonempty_frames(), vec![3]);

        std::fs::write(&path, "video,frame,paw_x,paw_y\ncam_1.mp4,300,7,8\n").unwrap();
        assert!(viewer.load_labels(&path).is_err());
        assert_eq!(viewer.labels().nonempty_frames(), vec![3]);
    }
}
