// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Video metadata.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Immutable description of one opened video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoDescriptor {
    pub path: PathBuf,
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub frame_count: usize,
}

impl VideoDescriptor {
    pub fn new(path: &Path, width: u32, height: u32, frame_count: usize) -> Self {
        Self {
            path: path.to_path_buf(),
            name: video_name(path),
            width,
            height,
            frame_count,
        }
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Stable key for a video: its file (or image-sequence directory) name.
pub fn video_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Check that every video in a session has the same number of frames.
pub fn common_frame_count(videos: &[VideoDescriptor]) -> Result<usize> {
    let first = videos
        .first()
        .ok_or_else(|| Error::configuration("a session needs at least one video"))?;
    if let Some(other) = videos.iter().find(|v| v.frame_count != first.frame_count) {
        return Err(Error::configuration(format!(
            "all videos must have the same number of frames: {} has {}, {} has {}",
            first.name, first.frame_count, other.name, other.frame_count
        )));
    }
    if first.frame_count == 0 {
        return Err(Error::configuration(format!("{} has no frames", first.name)));
    }
    Ok(first.frame_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, frames: usize) -> VideoDescriptor {
        VideoDescriptor::new(Path::new(&format!("/recordings/session/{}", name)), 640, 480, frames)
    }

    #[test]
    fn test_name_is_file_name() {
        assert_eq!(descriptor("cam_0.mp4", 10).name, "cam_0.mp4");
    }

    #[test]
    fn test_common_frame_count() {
        let videos = vec![descriptor("a.mp4", 100), descriptor("b.mp4", 100)];
        assert_eq!(common_frame_count(&videos).unwrap(), 100);
    }

    #[test]
    fn test_mismatched_frame_counts() {
        let videos = vec![
            descriptor("a.mp4", 100),
            descriptor("b.mp4", 100),
            descriptor("c.mp4", 99),
        ];
        let err = common_frame_count(&videos).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_empty_and_frameless() {
        assert!(common_frame_count(&[]).is_err());
        assert!(common_frame_count(&[descriptor("a.mp4", 0)]).is_err());
    }
}
