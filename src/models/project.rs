// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Labeling session settings.
//!
//! A session is described by a YAML or JSON document (see
//! [`crate::io::serialization`]) and may be overridden from the command line.
//! [`SessionConfig::validate`] is run before any video is opened.

use super::annotation::{TrackedPointConfig, TrackedPointSet};
use crate::error::{Error, Result};
use crate::io::{media, serialization};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_MAX_WINDOW_SIZE: (u32, u32) = (1920, 1080);

/// What happens to unsaved labels when the session closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClosePolicy {
    /// Ask through the save prompt.
    #[default]
    Prompt,
    AutoSave,
    /// Drop unsaved labels. Must be chosen explicitly.
    Discard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Video files or image-sequence directories.
    pub videos: Vec<PathBuf>,
    /// Folder to search for recordings when `videos` is empty.
    pub video_folder: Option<PathBuf>,
    pub max_window_size: (u32, u32),
    /// Path to a tracked-point document.
    pub tracked_points: Option<PathBuf>,
    pub tracked_point_names: Vec<String>,
    /// Existing label table to continue from.
    pub labels_csv: Option<PathBuf>,
    pub machine_labels_csv: Option<PathBuf>,
    pub machine_label_min_confidence: Option<f64>,
    pub start_paused: bool,
    pub step_size: usize,
    pub auto_next_point: bool,
    /// Playback rate; `None` advances on every tick.
    pub frames_per_second: Option<f64>,
    pub on_close: ClosePolicy,
    /// Label file, or directory for timestamped label files.
    pub output_path: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            videos: Vec::new(),
            video_folder: None,
            max_window_size: DEFAULT_MAX_WINDOW_SIZE,
            tracked_points: None,
            tracked_point_names: Vec::new(),
            labels_csv: None,
            machine_labels_csv: None,
            machine_label_min_confidence: None,
            start_paused: false,
            step_size: 1,
            auto_next_point: true,
            frames_per_second: Some(30.0),
            on_close: ClosePolicy::Prompt,
            output_path: None,
        }
    }
}

impl SessionConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config: Self = serialization::import_document(path)?;
        log::info!("Loaded session config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.videos.is_empty() && self.video_folder.is_none() {
            return Err(Error::configuration("no videos or video folder given"));
        }
        if !self.videos.is_empty() && self.video_folder.is_some() {
            return Err(Error::configuration(
                "give either videos or a video folder, not both",
            ));
        }
        let (width, height) = self.max_window_size;
        if width == 0 || height == 0 {
            return Err(Error::configuration(format!(
                "max window size {}x{} must be positive",
                width, height
            )));
        }
        if self.step_size == 0 {
            return Err(Error::configuration("step size must be at least 1"));
        }
        if let Some(fps) = self.frames_per_second {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(Error::configuration(format!(
                    "frames per second must be positive, got {}",
                    fps
                )));
            }
        }
        if let Some(confidence) = self.machine_label_min_confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(Error::configuration(format!(
                    "machine label confidence threshold {} is outside 0..1",
                    confidence
                )));
            }
        }
        if self.tracked_points.is_some() && !self.tracked_point_names.is_empty() {
            return Err(Error::configuration(
                "give either a tracked point file or inline point names, not both",
            ));
        }
        if self.tracked_points.is_none()
            && self.tracked_point_names.is_empty()
            && self.labels_csv.is_none()
        {
            return Err(Error::configuration(
                "no tracked points: give a tracked point file, point names, or a labels csv",
            ));
        }
        Ok(())
    }

    /// Recording paths in display order.
    pub fn recording_paths(&self) -> Result<Vec<PathBuf>> {
        if let Some(folder) = &self.video_folder {
            return media::find_recordings(folder);
        }
        let mut paths = self.videos.clone();
        paths.sort();
        Ok(paths)
    }

    /// Folder the recordings live in, used to place default label files.
    pub fn recording_folder(&self) -> PathBuf {
        self.video_folder.clone().unwrap_or_else(|| {
            self.videos
                .iter()
                .min()
                .and_then(|path| path.parent())
                .map(Path::to_path_buf)
                .unwrap_or_default()
        })
    }

    /// Tracked points from the config, if it names any.
    pub fn tracked_point_set(&self) -> Result<Option<TrackedPointSet>> {
        if let Some(path) = &self.tracked_points {
            let config: TrackedPointConfig = serialization::import_document(path)?;
            return TrackedPointSet::try_from(config).map(Some);
        }
        if self.tracked_point_names.is_empty() {
            return Ok(None);
        }
        TrackedPointSet::new(self.tracked_point_names.iter().cloned()).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            videos: vec!["/data/session/cam_1.mp4".into(), "/data/session/cam_0.mp4".into()],
            tracked_point_names: vec!["nose".into()],
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validate().is_ok());
    }

    #[test]
    fn test_rejects_missing_inputs() {
        let err = SessionConfig::default().validate().unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));

        let no_points = SessionConfig {
            tracked_point_names: Vec::new(),
            ..config()
        };
        assert!(no_points.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_values() {
        for bad in [
            SessionConfig { step_size: 0, ..config() },
            SessionConfig { max_window_size: (0, 1080), ..config() },
            SessionConfig { frames_per_second: Some(0.0), ..config() },
            SessionConfig { machine_label_min_confidence: Some(1.5), ..config() },
            SessionConfig { video_folder: Some("/data".into()), ..config() },
        ] {
            assert!(bad.validate().is_err(), "{:?}", bad);
        }
    }

    #[test]
    fn test_recording_paths_are_sorted() {
        let config = config();
        let paths = config.recording_paths().unwrap();
        assert_eq!(paths[0], PathBuf::from("/data/session/cam_0.mp4"));
        assert_eq!(config.recording_folder(), PathBuf::from("/data/session"));
    }

    #[test]
    fn test_inline_points() {
        let points = config().tracked_point_set().unwrap().unwrap();
        assert_eq!(points.names(), ["nose"]);
        let none = SessionConfig {
            tracked_point_names: Vec::new(),
            ..config()
        };
        assert!(none.tracked_point_set().unwrap().is_none());
    }

    #[test]
    fn test_close_policy_names() {
        let yaml = "on_close: auto_save\nvideos: [a.mp4]\ntracked_point_names: [nose]\n";
        let config: SessionConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.on_close, ClosePolicy::AutoSave);
        assert_eq!(config.step_size, 1);
        assert_eq!(config.max_window_size, (1920, 1080));
    }
}
