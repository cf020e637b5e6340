// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Resolving unsaved labels when a session ends.

use crate::error::{Error, Result};
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Directory created next to the recording folder for label files.
pub const OUTPUT_DIR_NAME: &str = "poseclick_data";
pub const OUTPUT_FILE_SUFFIX: &str = "_poseclick_labels.csv";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveDecision {
    Save,
    Discard,
    /// Keep the session open.
    Cancel,
}

/// Asks the user what to do with unsaved labels.
pub trait SavePrompt {
    fn confirm_save(&mut self, target: &Path) -> SaveDecision;
}

/// Answers every prompt the same way. Used headless and in tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecision(pub SaveDecision);

impl SavePrompt for FixedDecision {
    fn confirm_save(&mut self, _target: &Path) -> SaveDecision {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    Saved(PathBuf),
    Discarded,
    NothingToSave,
    Cancelled,
}

pub fn timestamped_file_name(now: DateTime<Local>) -> String {
    format!("{}{}", now.format("%Y-%m-%d_%H-%M-%S"), OUTPUT_FILE_SUFFIX)
}

/// Where labels are written: an explicit file, a timestamped file inside an
/// explicit directory, or a timestamped file in [`OUTPUT_DIR_NAME`] beside
/// the recording folder.
pub fn resolve_save_path(
    output_path: Option<&Path>,
    recording_folder: &Path,
    now: DateTime<Local>,
) -> PathBuf {
    match output_path {
        Some(path) if path.is_dir() || path.extension().is_none() => {
            path.join(timestamped_file_name(now))
        }
        Some(path) => path.to_path_buf(),
        None => recording_folder
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or(Path::new("."))
            .join(OUTPUT_DIR_NAME)
            .join(timestamped_file_name(now)),
    }
}

pub(crate) fn create_parent_dir(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(|e| Error::resource(parent, e))
        }
        _ => Ok(()),
    }
}
