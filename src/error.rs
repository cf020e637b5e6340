// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Error types shared by the labeling engine.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or missing input at session setup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single frame could not be read.
    #[error("Decode error in {video} at frame {frame}: {reason}")]
    Decode {
        video: String,
        frame: usize,
        reason: String,
    },

    /// A label table is missing required columns or has malformed cells.
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// A rejected label write (negative coordinate, unknown point, ...).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Filesystem failure while loading or saving.
    #[error("Resource error at {}: {source}", path.display())]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn data_format(msg: impl Into<String>) -> Self {
        Self::DataFormat(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn decode(video: impl Into<String>, frame: usize, reason: impl Into<String>) -> Self {
        Self::Decode {
            video: video.into(),
            frame,
            reason: reason.into(),
        }
    }

    pub fn resource(path: &Path, source: std::io::Error) -> Self {
        Self::Resource {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Split a csv error into the I/O case (a resource problem) and the
    /// record case (a format problem).
    pub fn from_csv(path: &Path, err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(source) => Self::resource(path, source),
                other => Self::DataFormat(format!("{:?}", other)),
            }
        } else {
            Self::Csv(err)
        }
    }
}
