// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Config document serialization and deserialization.
//!
//! Session configs and tracked-point lists are stored as YAML or JSON;
//! the format is chosen by file extension.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(Error::configuration(format!(
                "{} is not a .yaml, .yml or .json file",
                path.display()
            ))),
        }
    }
}

/// Export a document to YAML format.
pub fn export_yaml<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let yaml = serde_yaml::to_string(data).map_err(|e| Error::data_format(e.to_string()))?;
    std::fs::write(path, yaml).map_err(|e| Error::resource(path, e))
}

/// Export a document to JSON format.
pub fn export_json<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(|e| Error::data_format(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| Error::resource(path, e))
}

/// Import a document from YAML format.
pub fn import_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let yaml = std::fs::read_to_string(path).map_err(|e| Error::resource(path, e))?;
    serde_yaml::from_str(&yaml)
        .map_err(|e| Error::configuration(format!("{}: {}", path.display(), e)))
}

/// Import a document from JSON format.
pub fn import_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::resource(path, e))?;
    serde_json::from_str(&json)
        .map_err(|e| Error::configuration(format!("{}: {}", path.display(), e)))
}

/// Import a document, picking the format from the extension.
pub fn import_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    match DocumentFormat::from_path(path)? {
        DocumentFormat::Yaml => import_yaml(path),
        DocumentFormat::Json => import_json(path),
    }
}

/// Export a document, picking the format from the extension.
pub fn export_document<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    match DocumentFormat::from_path(path)? {
        DocumentFormat::Yaml => export_yaml(data, path),
        DocumentFormat::Json => export_json(data, path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::TrackedPointConfig;
    use crate::models::project::{ClosePolicy, SessionConfig};

    #[test]
    fn test_tracked_points_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracked_points.json");
        std::fs::write(&path, r#"{"tracked_point_names": ["nose", "tail"]}"#).unwrap();

        let config: TrackedPointConfig = import_document(&path).unwrap();
        assert_eq!(config.tracked_point_names, ["nose", "tail"]);
    }

    #[test]
    fn test_session_round_trip_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let config = SessionConfig {
            videos: vec!["cam_0.mp4".into()],
            tracked_point_names: vec!["nose".into()],
            on_close: ClosePolicy::Discard,
            ..SessionConfig::default()
        };
        for name in ["session.yaml", "session.json"] {
            let path = dir.path().join(name);
            export_document(&config, &path).unwrap();
            let loaded: SessionConfig = import_document(&path).unwrap();
            assert_eq!(loaded, config);
        }
    }

    #[test]
    fn test_unknown_extension() {
        let err = DocumentFormat::from_path(Path::new("points.toml")).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.json");
        let err = import_document::<TrackedPointConfig>(&missing).unwrap_err();
        assert!(matches!(err, Error::Resource { .. }));

        let bad = dir.path().join("bad.yaml");
        std::fs::write(&bad, "tracked_point_names: 3").unwrap();
        let err = import_document::<TrackedPointConfig>(&bad).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }
}
