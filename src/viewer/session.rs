// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Opening a labeling session from its config.

use super::{GridViewer, ViewerOptions};
use crate::error::{Error, Result};
use crate::io::label_csv::CsvLoadOptions;
use crate::io::media::{VideoBackend, VideoSource};
use crate::models::labels::LabelStore;
use crate::models::project::SessionConfig;
use crate::models::video::{common_frame_count, VideoDescriptor};

/// Validate the config, open every recording, and load the label tables.
///
/// Video handles opened here are released again if any later step fails.
pub fn open_session(config: &SessionConfig, backend: &dyn VideoBackend) -> Result<GridViewer> {
    config.validate()?;

    let paths = config.recording_paths()?;
    let sources = paths
        .iter()
        .map(|path| VideoSource::open(path, backend))
        .collect::<Result<Vec<_>>>()?;

    let descriptors: Vec<VideoDescriptor> =
        sources.iter().map(|s| s.descriptor().clone()).collect();
    let frame_count = common_frame_count(&descriptors)?;
    let names: Vec<String> = descriptors.into_iter().map(|d| d.name).collect();

    let labels = load_label_store(config, &names, frame_count)?;
    let machine_labels = match &config.machine_labels_csv {
        Some(path) => {
            let options = CsvLoadOptions {
                min_confidence: config.machine_label_min_confidence,
            };
            Some(LabelStore::load_with(path, &options)?)
        }
        None => None,
    };

    GridViewer::new(sources, labels, machine_labels, ViewerOptions::from(config))
}

/// Continue from an existing label table or start an empty one over the
/// configured tracked points.
fn load_label_store(
    config: &SessionConfig,
    video_names: &[String],
    frame_count: usize,
) -> Result<LabelStore> {
    let configured = config.tracked_point_set()?;

    let Some(path) = &config.labels_csv else {
        let points = configured
            .ok_or_else(|| Error::configuration("no tracked points configured"))?;
        return Ok(LabelStore::new(points, video_names, frame_count));
    };

    let mut store = LabelStore::load(path)?;
    if let Some(points) = configured {
        if &points != store.tracked_points() {
            log::warn!(
                "{} tracks {:?}; using those instead of the configured {:?}",
                path.display(),
                store.point_names(),
                points.names()
            );
        }
    }
    for name in store.video_names() {
        if !video_names.contains(name) {
            log::warn!("{} has labels for {}, which is not in this session", path.display(), name);
        }
    }
    if store.frame_count() > frame_count {
        return Err(Error::data_format(format!(
            "{} has labels up to frame {} but the videos have {} frames",
            path.display(),
            store.frame_count() - 1,
            frame_count
        )));
    }
    store.extend_domain(video_names, frame_count);
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::media::testing::SyntheticReader;
    use crate::io::media::FrameReader;
    use crate::models::annotation::Coordinate;
    use std::path::{Path, PathBuf};

    /// Frame count is taken from the file stem, e.g. `cam_99.mp4` has 99 frames.
    struct StemBackend;

    impl VideoBackend for StemBackend {
        fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>> {
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
            let frames = stem
                .rsplit('_')
                .next()
                .and_then(|n| n.parse().ok())
                .ok_or_else(|| Error::configuration(format!("cannot open {}", path.display())))?;
            Ok(Box::new(SyntheticReader::new(960, 540, frames)))
        }
    }

    fn config(videos: &[&str]) -> SessionConfig {
        SessionConfig {
            videos: videos.iter().map(PathBuf::from).collect(),
            tracked_point_names: vec!["nose".into(), "tail".into()],
            start_paused: true,
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_open_session() {
        let config = config(&["/rec/c_100.mp4", "/rec/a_100.mp4", "/rec/b_100.mp4"]);
        let viewer = open_session(&config, &StemBackend).unwrap();
        assert_eq!(viewer.video_names(), ["a_100.mp4", "b_100.mp4", "c_100.mp4"]);
        assert_eq!(viewer.frame_count(), 100);
        assert_eq!(viewer.labels().point_names(), ["nose", "tail"]);
        assert_eq!(viewer.window_size(), (1920, 1080));
    }

    #[test]
    fn test_mismatched_frame_counts() {
        let config = config(&["/rec/a_100.mp4", "/rec/b_100.mp4", "/rec/c_99.mp4"]);
        let err = open_session(&config, &StemBackend).err().unwrap();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_invalid_config_opens_nothing() {
        let mut config = config(&["/rec/a_100.mp4"]);
        config.step_size = 0;
        assert!(matches!(
            open_session(&config, &StemBackend).err().unwrap(),
            Error::Configuration(_)
        ));
    }

    #[test]
    fn test_continue_from_labels_csv() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("labels.csv");
        std::fs::write(&labels, "video,frame,paw_x,paw_y\na_10.mp4,4,1,2\n").unwrap();
        let machine = dir.path().join("machine.csv");
        std::fs::write(
            &machine,
            "video,frame,paw_x,paw_y,paw_likelihood\na_10.mp4,4,3,4,0.2\nb_10.mp4,4,5,6,0.9\n",
        )
        .unwrap();

        let mut config = config(&["/rec/a_10.mp4", "/rec/b_10.mp4"]);
        config.tracked_point_names.clear();
        config.labels_csv = Some(labels);
        config.machine_labels_csv = Some(machine);
        config.machine_label_min_confidence = Some(0.5);

        let viewer = open_session(&config, &StemBackend).unwrap();
        assert_eq!(viewer.labels().point_names(), ["paw"]);
        assert_eq!(viewer.labels().frame_count(), 10);
        assert_eq!(
            viewer.labels().get("a_10.mp4", 4).get("paw"),
            Some(&Coordinate::new(1.0, 2.0))
        );
        let machine = viewer.machine_labels().unwrap();
        assert!(machine.get("a_10.mp4", 4).is_empty());
        assert_eq!(machine.get("b_10.mp4", 4).len(), 1);
    }

    #[test]
    fn test_labels_beyond_video_length() {
        let dir = tempfile::tempdir().unwrap();
        let labels = dir.path().join("labels.csv");
        std::fs::write(&labels, "video,frame,paw_x,paw_y\na_10.mp4,40,1,2\n").unwrap();
        let mut config = config(&["/rec/a_10.mp4"]);
        config.tracked_point_names.clear();
        config.labels_csv = Some(labels);
        assert!(matches!(
            open_session(&config, &StemBackend).err().unwrap(),
            Error::DataFormat(_)
        ));
    }
}
