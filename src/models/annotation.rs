// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Annotation data structures.
//!
//! This module defines labeled keypoint coordinates and the ordered set
//! of tracked point names a label table is built around.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// A labeled keypoint in native video pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Labels present on one frame of one video, keyed by point name.
pub type LabelMap = BTreeMap<String, Coordinate>;

/// Tracked-point configuration document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackedPointConfig {
    pub tracked_point_names: Vec<String>,
}

/// Ordered, duplicate-free list of tracked point names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedPointSet {
    names: Vec<String>,
}

impl TrackedPointSet {
    /// Build a point set, collapsing duplicates and keeping first-seen order.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for name in names {
            let name: String = name.into();
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(Error::configuration("tracked point names must not be empty"));
            }
            if seen.insert(name.clone()) {
                ordered.push(name);
            } else {
                log::warn!("Duplicate tracked point name '{}' ignored", name);
            }
        }
        if ordered.is_empty() {
            return Err(Error::configuration("at least one tracked point is required"));
        }
        Ok(Self { names: ordered })
    }

    /// Infer point names from label-table column headers such as `nose_x`.
    ///
    /// Columns without an `_x`/`_y` suffix are not points and are skipped.
    pub fn from_columns<'a, I>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for column in columns {
            let Some(name) = point_name_of_column(column) else {
                continue;
            };
            if seen.insert(name) {
                ordered.push(name.to_string());
            }
        }
        if ordered.is_empty() {
            return Err(Error::data_format(
                "label table has no '<point>_x' / '<point>_y' columns",
            ));
        }
        log::debug!("Found tracked point names in table: {:?}", ordered);
        Ok(Self { names: ordered })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }
}

impl TryFrom<TrackedPointConfig> for TrackedPointSet {
    type Error = Error;

    fn try_from(config: TrackedPointConfig) -> Result<Self> {
        Self::new(config.tracked_point_names)
    }
}

/// Point name for an `_x`/`_y` coordinate column.
pub fn point_name_of_column(column: &str) -> Option<&str> {
    column
        .strip_suffix("_x")
        .or_else(|| column.strip_suffix("_y"))
        .filter(|name| !name.is_empty())
}
