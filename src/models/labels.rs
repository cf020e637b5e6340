// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label table: per video, per frame, per tracked point coordinates.
//!
//! Logically the table is dense over every `video x frame` pair with an
//! `_x`/`_y` column pair per tracked point. Physically only rows that have
//! been touched are stored; everything else reads as absent.

use super::annotation::{Coordinate, LabelMap, TrackedPointSet};
use crate::error::{Error, Result};
use crate::io::label_csv::{self, CsvLoadOptions};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

/// One point's two coordinate cells. Either may be absent.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct PointCells {
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl PointCells {
    fn coordinate(&self) -> Option<Coordinate> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Coordinate::new(x, y)),
            _ => None,
        }
    }

    fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }
}

/// A video addressed by its position in the table's sorted video list or by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoRef<'a> {
    Index(usize),
    Name(&'a str),
}

impl From<usize> for VideoRef<'_> {
    fn from(index: usize) -> Self {
        VideoRef::Index(index)
    }
}

impl<'a> From<&'a str> for VideoRef<'a> {
    fn from(name: &'a str) -> Self {
        VideoRef::Name(name)
    }
}

impl<'a> From<&'a String> for VideoRef<'a> {
    fn from(name: &'a String) -> Self {
        VideoRef::Name(name.as_str())
    }
}

/// Sparse label table with an active-point cursor.
#[derive(Debug, Clone)]
pub struct LabelStore {
    points: TrackedPointSet,
    video_names: Vec<String>,
    frame_count: usize,
    rows: HashMap<String, BTreeMap<usize, Vec<PointCells>>>,
    active: usize,
    unsaved: bool,
}

impl LabelStore {
    /// Create an empty table over `video_names x 0..frame_count`.
    pub fn new(points: TrackedPointSet, video_names: &[String], frame_count: usize) -> Self {
        let mut names = video_names.to_vec();
        names.sort();
        names.dedup();
        Self {
            points,
            video_names: names,
            frame_count,
            rows: HashMap::new(),
            active: 0,
            unsaved: false,
        }
    }

    /// Load a label table from CSV, inferring the tracked points from its header.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with(path, &CsvLoadOptions::default())
    }

    pub fn load_with(path: &Path, options: &CsvLoadOptions) -> Result<Self> {
        let store = label_csv::read_labels(path, options)?;
        log::info!(
            "Loaded labels for {} videos x {} frames ({} points) from {}",
            store.video_names.len(),
            store.frame_count,
            store.points.len(),
            path.display()
        );
        Ok(store)
    }

    /// Write the full `video x frame` table to CSV.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        label_csv::write_labels(self, path)?;
        self.unsaved = false;
        log::info!("Saved csv data to {}", path.display());
        Ok(())
    }

    pub fn tracked_points(&self) -> &TrackedPointSet {
        &self.points
    }

    pub fn point_names(&self) -> &[String] {
        self.points.names()
    }

    pub fn video_names(&self) -> &[String] {
        &self.video_names
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Make sure the table covers the given videos and frame range.
    pub fn extend_domain(&mut self, video_names: &[String], frame_count: usize) {
        for name in video_names {
            if !self.video_names.contains(name) {
                self.video_names.push(name.clone());
            }
        }
        self.video_names.sort();
        self.frame_count = self.frame_count.max(frame_count);
    }

    pub fn active_point(&self) -> &str {
        &self.points.names()[self.active]
    }

    pub fn set_active_point(&mut self, name: &str) -> Result<()> {
        let index = self.points.index_of(name).ok_or_else(|| {
            Error::validation(format!(
                "point '{}' is not in the tracked points {:?}",
                name,
                self.points.names()
            ))
        })?;
        self.active = index;
        log::debug!("Active point set to {}", self.active_point());
        Ok(())
    }

    /// Shift the active point cyclically by `delta` positions.
    pub fn move_active_point(&mut self, delta: i32) {
        let len = self.points.len() as i64;
        self.active = (self.active as i64 + delta as i64).rem_euclid(len) as usize;
        log::debug!("Active point set to {}", self.active_point());
    }

    /// Write a coordinate, returning whether it was stored. Rejected writes
    /// are logged and leave the table untouched.
    pub fn update<'a>(
        &mut self,
        video: impl Into<VideoRef<'a>>,
        frame: usize,
        x: f64,
        y: f64,
        point: Option<&str>,
    ) -> bool {
        match self.try_update(video, frame, x, y, point) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("Label write ignored: {}", err);
                false
            }
        }
    }

    pub fn try_update<'a>(
        &mut self,
        video: impl Into<VideoRef<'a>>,
        frame: usize,
        x: f64,
        y: f64,
        point: Option<&str>,
    ) -> Result<()> {
        if !(x.is_finite() && y.is_finite() && x >= 0.0 && y >= 0.0) {
            return Err(Error::validation(format!(
                "coordinate ({}, {}) must be finite and non-negative",
                x, y
            )));
        }
        let (name, point_index) = self.resolve(video.into(), frame, point)?;
        let row = self.row_mut(&name, frame);
        row[point_index] = PointCells {
            x: Some(x),
            y: Some(y),
        };
        self.unsaved = true;
        Ok(())
    }

    /// Write a click for the active point, then optionally advance to the next point.
    pub fn record_click<'a>(
        &mut self,
        video: impl Into<VideoRef<'a>>,
        frame: usize,
        x: f64,
        y: f64,
        auto_advance: bool,
    ) -> bool {
        let stored = self.update(video, frame, x, y, None);
        if stored && auto_advance {
            self.move_active_point(1);
        }
        stored
    }

    /// Mark a point absent on one frame. Returns whether anything was cleared.
    pub fn clear<'a>(&mut self, video: impl Into<VideoRef<'a>>, frame: usize, point: Option<&str>) -> bool {
        let (name, point_index) = match self.resolve(video.into(), frame, point) {
            Ok(resolved) => resolved,
            Err(err) => {
                log::warn!("Label clear ignored: {}", err);
                return false;
            }
        };
        let Some(row) = self.rows.get_mut(&name).and_then(|frames| frames.get_mut(&frame)) else {
            return false;
        };
        let cleared = !row[point_index].is_empty();
        row[point_index] = PointCells::default();
        if cleared {
            self.unsaved = true;
            log::debug!(
                "Cleared point {} for video {}, frame {}",
                self.points.names()[point_index],
                name,
                frame
            );
        }
        cleared
    }

    /// Points with both coordinates present on one frame.
    pub fn get<'a>(&self, video: impl Into<VideoRef<'a>>, frame: usize) -> LabelMap {
        let mut labels = LabelMap::new();
        let Some(name) = self.video_name(video.into()) else {
            return labels;
        };
        let Some(row) = self.rows.get(name).and_then(|frames| frames.get(&frame)) else {
            return labels;
        };
        for (point, cells) in self.points.names().iter().zip(row) {
            if let Some(coordinate) = cells.coordinate() {
                labels.insert(point.clone(), coordinate);
            }
        }
        labels
    }

    /// Sorted frame numbers that have any coordinate on any video.
    pub fn nonempty_frames(&self) -> Vec<usize> {
        let frames: BTreeSet<usize> = self
            .rows
            .values()
            .flat_map(|frames| frames.iter())
            .filter(|(_, row)| row.iter().any(|cells| !cells.is_empty()))
            .map(|(&frame, _)| frame)
            .collect();
        frames.into_iter().collect()
    }

    /// Raw cells for one row, used by the CSV writer.
    pub(crate) fn row(&self, video: &str, frame: usize) -> Option<&[PointCells]> {
        self.rows
            .get(video)
            .and_then(|frames| frames.get(&frame))
            .map(Vec::as_slice)
    }

    /// Assemble a table from parsed rows, used by the CSV reader.
    pub(crate) fn from_parts(
        points: TrackedPointSet,
        video_names: Vec<String>,
        frame_count: usize,
        rows: HashMap<String, BTreeMap<usize, Vec<PointCells>>>,
    ) -> Self {
        let mut store = Self::new(points, &video_names, frame_count);
        store.rows = rows;
        store
    }

    fn video_name(&self, video: VideoRef<'_>) -> Option<&str> {
        match video {
            VideoRef::Index(index) => self.video_names.get(index).map(String::as_str),
            VideoRef::Name(name) => self
                .video_names
                .iter()
                .find(|known| known.as_str() == name)
                .map(String::as_str),
        }
    }

    fn resolve(&self, video: VideoRef<'_>, frame: usize, point: Option<&str>) -> Result<(String, usize)> {
        let name = self
            .video_name(video)
            .ok_or_else(|| Error::validation(format!("unknown video {:?}", video)))?
            .to_string();
        if frame >= self.frame_count {
            return Err(Error::validation(format!(
                "frame {} is outside 0..{}",
                frame, self.frame_count
            )));
        }
        let point_index = match point {
            Some(point) => self
                .points
                .index_of(point)
                .ok_or_else(|| Error::validation(format!("unknown point '{}'", point)))?,
            None => self.active,
        };
        Ok((name, point_index))
    }

    fn row_mut(&mut self, video: &str, frame: usize) -> &mut Vec<PointCells> {
        let width = self.points.len();
        self.rows
            .entry(video.to_string())
            .or_default()
            .entry(frame)
            .or_insert_with(|| vec![PointCells::default(); width])
    }
}
