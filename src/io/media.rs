// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media file loading (videos and image sequences).
//!
//! This module opens recordings, reads frames by number, and converts
//! them to RGB images for the grid renderer. Image-sequence directories
//! are always supported; video files need the `video-opencv` feature.

use crate::error::{Error, Result};
use crate::models::video::VideoDescriptor;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Consecutive read failures after which a source is reported as broken.
pub const MAX_CONSECUTIVE_DECODE_FAILURES: u32 = 30;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov", "mkv", "m4v", "webm"];
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tif", "tiff"];

/// An open decode handle with random access by frame number.
pub trait FrameReader {
    fn dimensions(&self) -> (u32, u32);
    fn frame_count(&self) -> usize;
    fn read_frame(&mut self, frame_number: usize) -> Result<RgbImage>;
    /// Release the handle. Called once; reads after closing are not made.
    fn close(&mut self) {}
}

/// Opens decode handles for recording paths.
pub trait VideoBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>>;
}

/// Picks image sequences for directories and OpenCV for files.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultBackend;

impl VideoBackend for DefaultBackend {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>> {
        if !path.exists() {
            return Err(Error::configuration(format!(
                "File {} does not exist",
                path.display()
            )));
        }
        if path.is_dir() {
            return Ok(Box::new(ImageSequenceReader::open(path)?));
        }
        open_video_file(path)
    }
}

#[cfg(feature = "video-opencv")]
fn open_video_file(path: &Path) -> Result<Box<dyn FrameReader>> {
    Ok(Box::new(opencv_reader::OpenCvReader::open(path)?))
}

#[cfg(not(feature = "video-opencv"))]
fn open_video_file(path: &Path) -> Result<Box<dyn FrameReader>> {
    Err(Error::configuration(format!(
        "cannot open {}: built without the video-opencv feature (image-sequence folders still work)",
        path.display()
    )))
}

/// One video of a session: metadata plus its exclusive decode handle.
pub struct VideoSource {
    descriptor: VideoDescriptor,
    reader: Option<Box<dyn FrameReader>>,
    consecutive_failures: u32,
}

impl VideoSource {
    pub fn open(path: &Path, backend: &dyn VideoBackend) -> Result<Self> {
        let reader = backend.open(path)?;
        let source = Self::from_reader(path, reader);
        log::info!(
            "Opened {} ({}x{}, {} frames)",
            source.descriptor.name,
            source.descriptor.width,
            source.descriptor.height,
            source.descriptor.frame_count
        );
        Ok(source)
    }

    pub fn from_reader(path: &Path, reader: Box<dyn FrameReader>) -> Self {
        let (width, height) = reader.dimensions();
        let descriptor = VideoDescriptor::new(path, width, height, reader.frame_count());
        Self {
            descriptor,
            reader: Some(reader),
            consecutive_failures: 0,
        }
    }

    pub fn descriptor(&self) -> &VideoDescriptor {
        &self.descriptor
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// True once reads have failed [`MAX_CONSECUTIVE_DECODE_FAILURES`] times in a row.
    pub fn has_failed(&self) -> bool {
        self.consecutive_failures >= MAX_CONSECUTIVE_DECODE_FAILURES
    }

    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Read one frame. Failures are logged individually until the source is
    /// considered broken, which is reported once.
    pub fn get_frame(&mut self, frame_number: usize) -> Result<RgbImage> {
        let name = self.descriptor.name.clone();
        let result = match self.reader.as_mut() {
            None => Err(Error::decode(&name, frame_number, "video is closed")),
            Some(_) if frame_number >= self.descriptor.frame_count => Err(Error::decode(
                &name,
                frame_number,
                format!("frame is outside 0..{}", self.descriptor.frame_count),
            )),
            Some(reader) => reader.read_frame(frame_number),
        };

        match result {
            Ok(image) => {
                self.consecutive_failures = 0;
                Ok(image)
            }
            Err(err) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures < MAX_CONSECUTIVE_DECODE_FAILURES {
                    log::warn!("{}", err);
                } else if self.consecutive_failures == MAX_CONSECUTIVE_DECODE_FAILURES {
                    log::error!(
                        "{} failed to decode {} frames in a row, last error: {}",
                        name,
                        MAX_CONSECUTIVE_DECODE_FAILURES,
                        err
                    );
                }
                Err(err)
            }
        }
    }

    /// Release the decode handle. Safe to call more than once.
    pub fn close(&mut self) {
        if let Some(mut reader) = self.reader.take() {
            reader.close();
            log::debug!("Closed {}", self.descriptor.name);
        }
    }
}

impl Drop for VideoSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// List the recordings in a folder: video files if there are any, otherwise
/// sub-directories holding image sequences. Sorted by path.
pub fn find_recordings(folder: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(folder).map_err(|e| Error::resource(folder, e))?;
    let mut videos = Vec::new();
    let mut sequences = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::resource(folder, e))?.path();
        if path.is_dir() {
            if !list_images(&path)?.is_empty() {
                sequences.push(path);
            }
        } else if has_extension(&path, VIDEO_EXTENSIONS) {
            videos.push(path);
        }
    }
    let mut found = if videos.is_empty() { sequences } else { videos };
    found.sort();
    if found.is_empty() {
        return Err(Error::configuration(format!(
            "no videos or image sequences found in {}",
            folder.display()
        )));
    }
    log::info!("Found {} recordings in {}", found.len(), folder.display());
    Ok(found)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn list_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::resource(dir, e))? {
        let path = entry.map_err(|e| Error::resource(dir, e))?.path();
        if path.is_file() && has_extension(&path, IMAGE_EXTENSIONS) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// A directory of numbered frame images treated as one video.
pub struct ImageSequenceReader {
    name: String,
    frames: Vec<PathBuf>,
    width: u32,
    height: u32,
}

impl ImageSequenceReader {
    pub fn open(dir: &Path) -> Result<Self> {
        let frames = list_images(dir)?;
        let first = frames.first().ok_or_else(|| {
            Error::configuration(format!("{} contains no frame images", dir.display()))
        })?;
        let (width, height) = image::image_dimensions(first).map_err(|e| {
            Error::configuration(format!("could not read {}: {}", first.display(), e))
        })?;
        Ok(Self {
            name: crate::models::video::video_name(dir),
            frames,
            width,
            height,
        })
    }
}

impl FrameReader for ImageSequenceReader {
    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn read_frame(&mut self, frame_number: usize) -> Result<RgbImage> {
        let path = self.frames.get(frame_number).ok_or_else(|| {
            Error::decode(&self.name, frame_number, "no such frame image")
        })?;
        let image = image::open(path)
            .map_err(|e| Error::decode(&self.name, frame_number, e.to_string()))?
            .to_rgb8();
        if image.dimensions() != (self.width, self.height) {
            return Err(Error::decode(
                &self.name,
                frame_number,
                format!(
                    "frame is {}x{}, expected {}x{}",
                    image.width(),
                    image.height(),
                    self.width,
                    self.height
                ),
            ));
        }
        Ok(image)
    }
}

#[cfg(feature = "video-opencv")]
mod opencv_reader {
    use super::FrameReader;
    use crate::error::{Error, Result};
    use image::RgbImage;
    use opencv::{
        core::Mat,
        imgproc,
        prelude::*,
        videoio::{self, VideoCapture},
    };
    use std::path::Path;

    /// Video file decoded through OpenCV's `VideoCapture`.
    pub struct OpenCvReader {
        name: String,
        capture: VideoCapture,
        width: u32,
        height: u32,
        frame_count: usize,
        /// Frame the capture will return next without seeking.
        next_frame: Option<usize>,
    }

    impl OpenCvReader {
        pub fn open(path: &Path) -> Result<Self> {
            let open_error = |e: opencv::Error| {
                Error::configuration(format!("Could not open video {}: {}", path.display(), e))
            };
            let path_str = path.to_string_lossy();
            let capture = VideoCapture::from_file(&path_str, videoio::CAP_ANY).map_err(open_error)?;
            if !capture.is_opened().map_err(open_error)? {
                return Err(Error::configuration(format!(
                    "Could not open video: {}",
                    path.display()
                )));
            }

            let width = capture.get(videoio::CAP_PROP_FRAME_WIDTH).map_err(open_error)? as u32;
            let height = capture.get(videoio::CAP_PROP_FRAME_HEIGHT).map_err(open_error)? as u32;
            let frame_count =
                capture.get(videoio::CAP_PROP_FRAME_COUNT).map_err(open_error)? as usize;

            Ok(Self {
                name: crate::models::video::video_name(path),
                capture,
                width,
                height,
                frame_count,
                next_frame: Some(0),
            })
        }

        fn decode(&mut self, frame_number: usize) -> opencv::Result<Option<RgbImage>> {
            if self.next_frame != Some(frame_number) {
                self.capture
                    .set(videoio::CAP_PROP_POS_FRAMES, frame_number as f64)?;
            }
            let mut bgr = Mat::default();
            if !self.capture.read(&mut bgr)? || bgr.empty() {
                self.next_frame = None;
                return Ok(None);
            }
            self.next_frame = Some(frame_number + 1);

            let mut rgb = Mat::default();
            imgproc::cvt_color(&bgr, &mut rgb, imgproc::COLOR_BGR2RGB, 0)?;
            let data = rgb.data_bytes()?.to_vec();
            Ok(RgbImage::from_raw(rgb.cols() as u32, rgb.rows() as u32, data))
        }
    }

    impl FrameReader for OpenCvReader {
        fn dimensions(&self) -> (u32, u32) {
            (self.width, self.height)
        }

        fn frame_count(&self) -> usize {
            self.frame_count
        }

        fn read_frame(&mut self, frame_number: usize) -> Result<RgbImage> {
            match self.decode(frame_number) {
                Ok(Some(image)) => Ok(image),
                Ok(None) => Err(Error::decode(&self.name, frame_number, "no image returned")),
                Err(e) => Err(Error::decode(&self.name, frame_number, e.to_string())),
            }
        }

        fn close(&mut self) {
            if let Err(e) = self.capture.release() {
                log::warn!("Failed to release {}: {}", self.name, e);
            }
        }
    }
}
