// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Geometric utility functions.
//!
//! This module maps between window coordinates, where the composed grid is
//! shown letterboxed, and grid pixel coordinates.

/// Where the grid image is drawn inside the available area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Fit an image into the available area, preserving aspect ratio and
/// centering it. The image is never scaled up past its native size.
pub fn fit_rect(image_size: (u32, u32), origin: (f32, f32), available: (f32, f32)) -> DisplayRect {
    let (img_width, img_height) = (image_size.0 as f32, image_size.1 as f32);
    if img_width <= 0.0 || img_height <= 0.0 {
        return DisplayRect { x: origin.0, y: origin.1, width: 0.0, height: 0.0 };
    }
    let scale = (available.0 / img_width)
        .min(available.1 / img_height)
        .min(1.0)
        .max(0.0);
    let (width, height) = (img_width * scale, img_height * scale);
    DisplayRect {
        x: origin.0 + (available.0 - width) / 2.0,
        y: origin.1 + (available.1 - height) / 2.0,
        width,
        height,
    }
}

/// Convert a window position to grid pixel coordinates. Positions outside the
/// drawn image give `None`.
pub fn to_image_coordinates(
    rect: &DisplayRect,
    image_size: (u32, u32),
    pos: (f32, f32),
) -> Option<(f64, f64)> {
    if rect.width <= 0.0 || rect.height <= 0.0 {
        return None;
    }
    let rel_x = (pos.0 - rect.x) / rect.width;
    let rel_y = (pos.1 - rect.y) / rect.height;
    if !(0.0..1.0).contains(&rel_x) || !(0.0..1.0).contains(&rel_y) {
        return None;
    }
    Some((
        rel_x as f64 * image_size.0 as f64,
        rel_y as f64 * image_size.1 as f64,
    ))
}

/// Horizontal offset of a frame's center on a strip `width` wide.
pub fn frame_to_offset(frame: usize, frame_count: usize, width: f32) -> f32 {
    if frame_count == 0 {
        return 0.0;
    }
    (frame as f32 + 0.5) * width / frame_count as f32
}

/// Frame under a horizontal offset on a strip `width` wide.
pub fn offset_to_frame(offset: f32, frame_count: usize, width: f32) -> usize {
    if frame_count == 0 || width <= 0.0 {
        return 0;
    }
    let frame = (offset * frame_count as f32 / width).floor().max(0.0) as usize;
    frame.min(frame_count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_wide_image_is_letterboxed() {
        let rect = fit_rect((1920, 1080), (0.0, 0.0), (960.0, 960.0));
        assert_eq!(rect.width, 960.0);
        assert_eq!(rect.height, 540.0);
        assert_eq!(rect.x, 0.0);
        assert_eq!(rect.y, 210.0);
    }

    #[test]
    fn test_fit_does_not_upscale() {
        let rect = fit_rect((640, 480), (10.0, 20.0), (1280.0, 960.0));
        assert_eq!((rect.width, rect.height), (640.0, 480.0));
        assert_eq!((rect.x, rect.y), (330.0, 260.0));
    }

    #[test]
    fn test_window_to_image() {
        let rect = fit_rect((1920, 1080), (0.0, 0.0), (960.0, 960.0));
        assert_eq!(
            to_image_coordinates(&rect, (1920, 1080), (480.0, 480.0)),
            Some((960.0, 540.0))
        );
        assert_eq!(
            to_image_coordinates(&rect, (1920, 1080), (0.0, 210.0)),
            Some((0.0, 0.0))
        );
        // In the letterbox bars
        assert_eq!(to_image_coordinates(&rect, (1920, 1080), (480.0, 100.0)), None);
        assert_eq!(to_image_coordinates(&rect, (1920, 1080), (960.0, 480.0)), None);
    }

    #[test]
    fn test_timeline_offsets() {
        assert_eq!(frame_to_offset(0, 10, 100.0), 5.0);
        assert_eq!(frame_to_offset(9, 10, 100.0), 95.0);
        assert_eq!(offset_to_frame(95.0, 10, 100.0), 9);
        assert_eq!(offset_to_frame(100.0, 10, 100.0), 9);
        assert_eq!(offset_to_frame(-3.0, 10, 100.0), 0);
        assert_eq!(offset_to_frame(50.0, 0, 100.0), 0);
    }
}
