// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-video image adjustments and placement of frames into grid cells.

use crate::grid::{ScalingParameters, ZoomState};
use image::imageops::{self, FilterType};
use image::RgbImage;

pub const BRIGHTNESS_STEP: i32 = 10;
pub const BRIGHTNESS_LIMIT: i32 = 120;
pub const CONTRAST_MAX: f64 = 10.0;

/// Brightness offset and contrast gain applied to one video before annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoAdjustments {
    pub brightness: i32,
    pub contrast: f64,
}

impl Default for VideoAdjustments {
    fn default() -> Self {
        Self {
            brightness: 0,
            contrast: 1.0,
        }
    }
}

impl VideoAdjustments {
    pub fn is_identity(&self) -> bool {
        self.brightness == 0 && self.contrast == 1.0
    }

    pub fn change_brightness(&mut self, increase: bool) {
        let step = if increase { BRIGHTNESS_STEP } else { -BRIGHTNESS_STEP };
        self.brightness = (self.brightness + step).clamp(-BRIGHTNESS_LIMIT, BRIGHTNESS_LIMIT);
    }

    /// Contrast moves in tenths below 1.0 and in whole steps above it.
    pub fn change_contrast(&mut self, increase: bool) {
        let contrast = self.contrast;
        let next = if (contrast - 1.0).abs() < 1e-9 {
            if increase {
                2.0
            } else {
                0.9
            }
        } else if contrast < 1.0 {
            let tenths = (contrast * 10.0).round() + if increase { 1.0 } else { -1.0 };
            (tenths / 10.0).clamp(0.0, 1.0)
        } else if increase {
            (contrast + 1.0).min(CONTRAST_MAX)
        } else {
            (contrast - 1.0).max(1.0)
        };
        self.contrast = next;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// `pixel * contrast + brightness`, saturated to `0..=255`.
    pub fn apply(&self, image: &mut RgbImage) {
        if self.is_identity() {
            return;
        }
        let lut: Vec<u8> = (0..=255u32)
            .map(|v| (v as f64 * self.contrast + self.brightness as f64).round().clamp(0.0, 255.0) as u8)
            .collect();
        for value in image.iter_mut() {
            *value = lut[*value as usize];
        }
    }
}

/// Scale a native frame into its cell through the zoom window and copy it
/// onto the grid canvas at `cell_origin`.
///
/// When zoomed, only the native region behind the visible window is
/// resized. The region is trimmed at zoomed resolution so the view lines up
/// with [`ZoomState::video_point`] to within one zoomed pixel.
pub fn place_in_cell(
    canvas: &mut RgbImage,
    frame: &RgbImage,
    cell_origin: (u32, u32),
    scaling: &ScalingParameters,
    zoom: &ZoomState,
) {
    let window = zoom.visible_window(scaling);
    let view = if zoom.is_zoomed() {
        let x = native_span(window.x, window.width, window.zoomed_width, frame.width());
        let y = native_span(window.y, window.height, window.zoomed_height, frame.height());
        let region = imageops::crop_imm(frame, x.start, y.start, x.len, y.len).to_image();
        let resized = imageops::resize(&region, x.resized, y.resized, FilterType::Triangle);
        imageops::crop_imm(&resized, x.trim, y.trim, window.width, window.height).to_image()
    } else if frame.dimensions() == (window.width, window.height) {
        frame.clone()
    } else {
        imageops::resize(frame, window.width, window.height, FilterType::Triangle)
    };

    imageops::replace(
        canvas,
        &view,
        (cell_origin.0 + scaling.x_offset) as i64,
        (cell_origin.1 + scaling.y_offset) as i64,
    );
}

/// Native pixels behind one axis of the visible window.
struct NativeSpan {
    start: u32,
    len: u32,
    /// Length of the span at zoomed resolution.
    resized: u32,
    /// Zoomed pixels between the span start and the window start.
    trim: u32,
}

fn native_span(start: u32, len: u32, zoomed: u32, native: u32) -> NativeSpan {
    let ratio = native as f64 / zoomed as f64;
    let src_start = ((start as f64 * ratio).floor() as u32).min(native - 1);
    let src_end = (((start + len) as f64 * ratio).ceil() as u32).clamp(src_start + 1, native);
    let trim = (start as f64 - src_start as f64 / ratio).round().max(0.0) as u32;
    let resized = (((src_end - src_start) as f64 / ratio).round() as u32).max(trim + len);
    NativeSpan {
        start: src_start,
        len: src_end - src_start,
        resized,
        trim,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ZoomDirection;
    use image::Rgb;

    #[test]
    fn test_brightness_is_clamped() {
        let mut adjustments = VideoAdjustments::default();
        for _ in 0..20 {
            adjustments.change_brightness(true);
        }
        assert_eq!(adjustments.brightness, 120);
        for _ in 0..30 {
            adjustments.change_brightness(false);
        }
        assert_eq!(adjustments.brightness, -120);
    }

    #[test]
    fn test_contrast_steps() {
        let mut adjustments = VideoAdjustments::default();
        adjustments.change_contrast(true);
        assert_eq!(adjustments.contrast, 2.0);
        adjustments.change_contrast(false);
        assert_eq!(adjustments.contrast, 1.0);
        adjustments.change_contrast(false);
        assert_eq!(adjustments.contrast, 0.9);
        for _ in 0..20 {
            adjustments.change_contrast(false);
        }
        assert_eq!(adjustments.contrast, 0.0);
        adjustments.change_contrast(true);
        assert_eq!(adjustments.contrast, 0.1);
        for _ in 0..30 {
            adjustments.change_contrast(true);
        }
        assert_eq!(adjustments.contrast, CONTRAST_MAX);
        adjustments.reset();
        assert!(adjustments.is_identity());
    }

    #[test]
    fn test_apply_saturates() {
        let mut image = RgbImage::from_pixel(2, 2, Rgb([100, 200, 5]));
        VideoAdjustments {
            brightness: 10,
            contrast: 2.0,
        }
        .apply(&mut image);
        assert_eq!(image.get_pixel(0, 0), &Rgb([210, 255, 20]));

        let mut dark = RgbImage::from_pixel(1, 1, Rgb([50, 50, 50]));
        VideoAdjustments {
            brightness: -120,
            contrast: 1.0,
        }
        .apply(&mut dark);
        assert_eq!(dark.get_pixel(0, 0), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_place_unzoomed_with_padding() {
        let mut canvas = RgbImage::new(200, 100);
        let frame = RgbImage::from_pixel(40, 40, Rgb([9, 9, 9]));
        let scaling = ScalingParameters::fit(40, 40, 100, 100);
        place_in_cell(&mut canvas, &frame, (100, 0), &scaling, &ZoomState::default());

        assert_eq!(scaling.x_offset, 0);
        assert_eq!(canvas.get_pixel(150, 50), &Rgb([9, 9, 9]));
        assert_eq!(canvas.get_pixel(50, 50), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_place_zoomed_fills_video_area() {
        let mut frame = RgbImage::new(100, 50);
        for (x, _, pixel) in frame.enumerate_pixels_mut() {
            *pixel = if x < 50 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) };
        }
        let scaling = ScalingParameters::fit(100, 50, 100, 50);
        let mut zoom = ZoomState::default();
        for _ in 0..10 {
            zoom.zoom_at(90.0, 25.0, ZoomDirection::In, &scaling);
        }

        let mut canvas = RgbImage::new(100, 50);
        place_in_cell(&mut canvas, &frame, (0, 0), &scaling, &zoom);
        // zoomed into the right half, so the blue side fills the cell
        assert_eq!(canvas.get_pixel(99, 25), &Rgb([0, 0, 255]));
        assert_eq!(canvas.get_pixel(80, 10), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_zoomed_view_lines_up_with_click_mapping() {
        let mut frame = RgbImage::new(100, 50);
        for (x, _, pixel) in frame.enumerate_pixels_mut() {
            if (47..=53).contains(&x) {
                *pixel = Rgb([255, 255, 255]);
            }
        }
        let scaling = ScalingParameters::fit(100, 50, 100, 50);
        let mut zoom = ZoomState::default();
        for _ in 0..10 {
            zoom.zoom_at(50.0, 25.0, ZoomDirection::In, &scaling);
        }

        let mut canvas = RgbImage::new(100, 50);
        place_in_cell(&mut canvas, &frame, (0, 0), &scaling, &zoom);
        for x in 0..100 {
            let native = zoom.video_point(x as f64, 25.0, &scaling).0.floor() as i64;
            let value = canvas.get_pixel(x, 25)[0];
            if (48..=51).contains(&native) {
                assert!(value > 250, "cell x {} over native {} is {}", x, native, value);
            } else if native <= 44 || native >= 56 {
                assert!(value < 5, "cell x {} over native {} is {}", x, native, value);
            }
        }
    }
}
