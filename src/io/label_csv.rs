// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label table CSV reading and writing.
//!
//! The table has two index columns, `video` and `frame`, followed by one
//! `<point>_x`, `<point>_y` pair per tracked point. Missing coordinates are
//! empty cells (`NaN` is accepted on input). Prediction tables may also carry
//! a `<point>_likelihood` or `<point>_confidence` column.

use crate::error::{Error, Result};
use crate::models::annotation::{point_name_of_column, TrackedPointSet};
use crate::models::labels::{LabelStore, PointCells};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ffi::OsString;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub const VIDEO_COLUMN: &str = "video";
pub const FRAME_COLUMN: &str = "frame";

/// Options for reading a label table.
#[derive(Debug, Clone, Default)]
pub struct CsvLoadOptions {
    /// Drop points whose confidence column is below this value.
    pub min_confidence: Option<f64>,
}

/// Column indices for one tracked point.
#[derive(Debug, Clone, Copy, Default)]
struct PointColumns {
    x: Option<usize>,
    y: Option<usize>,
    confidence: Option<usize>,
}

/// Read a label table, inferring tracked points from the header.
pub fn read_labels(path: &Path, options: &CsvLoadOptions) -> Result<LabelStore> {
    let file = File::open(path).map_err(|e| Error::resource(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| Error::from_csv(path, e))?
        .clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| {
                Error::data_format(format!(
                    "{} is missing the '{}' index column",
                    path.display(),
                    name
                ))
            })
    };
    let video_column = column(VIDEO_COLUMN)?;
    let frame_column = column(FRAME_COLUMN)?;

    let points = TrackedPointSet::from_columns(
        headers
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != video_column && i != frame_column)
            .map(|(_, h)| h.trim()),
    )?;
    let columns = point_columns(&headers, &points);

    let mut rows: HashMap<String, BTreeMap<usize, Vec<PointCells>>> = HashMap::new();
    let mut videos = BTreeSet::new();
    let mut frame_count = 0;
    let mut seen = HashSet::new();
    let mut duplicates = 0usize;
    let mut negatives = 0usize;

    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::from_csv(path, e))?;
        let line = index + 2;

        let video = record.get(video_column).unwrap_or("").trim();
        if video.is_empty() {
            return Err(Error::data_format(format!("line {}: empty video name", line)));
        }
        let frame = parse_frame(record.get(frame_column).unwrap_or(""), line)?;
        videos.insert(video.to_string());
        let end = frame.checked_add(1).ok_or_else(|| {
            Error::data_format(format!("line {}: frame number {} is out of range", line, frame))
        })?;
        frame_count = frame_count.max(end);

        if !seen.insert((video.to_string(), frame)) {
            if duplicates == 0 {
                log::warn!(
                    "Duplicate row for video {} frame {} (line {}), keeping the first occurrence",
                    video,
                    frame,
                    line
                );
            }
            duplicates += 1;
            continue;
        }

        let mut cells = vec![PointCells::default(); points.len()];
        for (cell, columns) in cells.iter_mut().zip(&columns) {
            let x = parse_cell(&record, columns.x, line)?;
            let y = parse_cell(&record, columns.y, line)?;
            if x.is_some_and(|v| v < 0.0) || y.is_some_and(|v| v < 0.0) {
                negatives += 1;
                continue;
            }
            if let Some(min_confidence) = options.min_confidence {
                let confidence = parse_cell(&record, columns.confidence, line)?;
                if confidence.is_some_and(|c| c < min_confidence) {
                    continue;
                }
            }
            *cell = PointCells { x, y };
        }

        if cells.iter().any(|c| c.x.is_some() || c.y.is_some()) {
            rows.entry(video.to_string()).or_default().insert(frame, cells);
        }
    }

    if duplicates > 0 {
        log::warn!("{} duplicate rows in {} were ignored", duplicates, path.display());
    }
    if negatives > 0 {
        log::warn!(
            "{} negative coordinates in {} were treated as missing",
            negatives,
            path.display()
        );
    }

    Ok(LabelStore::from_parts(
        points,
        videos.into_iter().collect(),
        frame_count,
        rows,
    ))
}

/// Write the full `video x frame` table. The file is closed on every path.
/// The table is written to a sibling file first and renamed over `path`, so
/// a failed write leaves any existing table untouched.
pub fn write_labels(store: &LabelStore, path: &Path) -> Result<()> {
    let staging = staging_path(path);
    let result = write_table(store, &staging, path)
        .and_then(|()| fs::rename(&staging, path).map_err(|e| Error::resource(path, e)));
    if result.is_err() {
        let _ = fs::remove_file(&staging);
    }
    result
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("labels.csv"));
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_table(store: &LabelStore, staging: &Path, path: &Path) -> Result<()> {
    let file = File::create(staging).map_err(|e| Error::resource(path, e))?;
    let mut writer = csv::Writer::from_writer(file);

    let mut header = vec![VIDEO_COLUMN.to_string(), FRAME_COLUMN.to_string()];
    for point in store.point_names() {
        header.push(format!("{}_x", point));
        header.push(format!("{}_y", point));
    }
    writer
        .write_record(&header)
        .map_err(|e| Error::from_csv(path, e))?;

    let width = store.point_names().len();
    let mut record = Vec::with_capacity(2 + 2 * width);
    for video in store.video_names() {
        for frame in 0..store.frame_count() {
            record.clear();
            record.push(video.clone());
            record.push(frame.to_string());
            match store.row(video, frame) {
                Some(cells) => {
                    for cell in cells {
                        record.push(format_cell(cell.x));
                        record.push(format_cell(cell.y));
                    }
                }
                None => record.resize(2 + 2 * width, String::new()),
            }
            writer
                .write_record(&record)
                .map_err(|e| Error::from_csv(path, e))?;
        }
    }

    writer.flush().map_err(|e| Error::resource(path, e))?;
    let file = writer
        .into_inner()
        .map_err(|e| Error::resource(path, e.into_error()))?;
    file.sync_all().map_err(|e| Error::resource(path, e))?;
    Ok(())
}

fn point_columns(headers: &csv::StringRecord, points: &TrackedPointSet) -> Vec<PointColumns> {
    let mut columns = vec![PointColumns::default(); points.len()];
    for (i, header) in headers.iter().enumerate() {
        let header = header.trim();
        if let Some(name) = point_name_of_column(header) {
            if let Some(p) = points.index_of(name) {
                if header.ends_with("_x") {
                    columns[p].x = Some(i);
                } else {
                    columns[p].y = Some(i);
                }
            }
        } else if let Some(name) = header
            .strip_suffix("_likelihood")
            .or_else(|| header.strip_suffix("_confidence"))
        {
            if let Some(p) = points.index_of(name) {
                columns[p].confidence = Some(i);
            }
        }
    }
    columns
}

fn parse_frame(value: &str, line: usize) -> Result<usize> {
    let value = value.trim();
    if let Ok(frame) = value.parse::<usize>() {
        return Ok(frame);
    }
    match value.parse::<f64>() {
        Ok(frame) if frame >= 0.0 && frame.fract() == 0.0 && frame < usize::MAX as f64 => {
            Ok(frame as usize)
        }
        _ => Err(Error::data_format(format!(
            "line {}: invalid frame number '{}'",
            line, value
        ))),
    }
}

fn parse_cell(record: &csv::StringRecord, column: Option<usize>, line: usize) -> Result<Option<f64>> {
    let Some(value) = column.and_then(|c| record.get(c)) else {
        return Ok(None);
    };
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    let parsed = value.parse::<f64>().map_err(|_| {
        Error::data_format(format!("line {}: invalid coordinate '{}'", line, value))
    })?;
    Ok(Some(parsed).filter(|v| !v.is_nan()))
}

fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
