// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Per-video zoom and pan.
//!
//! Three coordinate spaces are involved:
//!
//! * **cell space**: pixels relative to the top-left of the grid cell,
//!   including the padding added by [`ScalingParameters`];
//! * **scaled space**: the same pixels, which is where the zoom center is
//!   stored (so the center carries the cell offsets);
//! * **zoomed space**: pixels of the scaled video after it has been resized
//!   again by the zoom factor. Only a `scaled_width x scaled_height` window of
//!   this image is shown in the cell.
//!
//! The forward transform picks that window; the inverse transforms turn a
//! pointer position back into a new zoom center or into native video pixels.

use super::scaling::ScalingParameters;

pub const ZOOM_STEP: f64 = 1.1;
pub const ZOOM_MIN: f64 = 1.0;
pub const ZOOM_MAX: f64 = 10.0;

/// Center moves smaller than this are dropped as float noise.
pub const POSITION_EPSILON: f64 = 1e-6;

/// Keyboard pan distance in scaled pixels.
pub const PAN_STEP: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Region of the zoomed image that is visible in the cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleWindow {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub zoomed_width: u32,
    pub zoomed_height: u32,
}

/// Zoom factor and center of one video.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomState {
    pub scale: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            scale: ZOOM_MIN,
            center_x: 0.0,
            center_y: 0.0,
        }
    }
}

impl ZoomState {
    pub fn is_zoomed(&self) -> bool {
        self.scale > ZOOM_MIN
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Shift the center by whole pan steps, e.g. `(0, -1)` pans up.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.center_x += dx as f64 * PAN_STEP;
        self.center_y += dy as f64 * PAN_STEP;
    }

    /// Forward transform: which part of the zoomed image fills the cell.
    pub fn visible_window(&self, scaling: &ScalingParameters) -> VisibleWindow {
        let (width, height) = (scaling.scaled_width, scaling.scaled_height);
        if !self.is_zoomed() {
            return VisibleWindow {
                x: 0,
                y: 0,
                width,
                height,
                zoomed_width: width,
                zoomed_height: height,
            };
        }

        let zoomed_width = ((width as f64 * self.scale).floor() as u32).max(width);
        let zoomed_height = ((height as f64 * self.scale).floor() as u32).max(height);

        VisibleWindow {
            x: window_origin(self.center_x, scaling.x_offset, width, zoomed_width),
            y: window_origin(self.center_y, scaling.y_offset, height, zoomed_height),
            width,
            height,
            zoomed_width,
            zoomed_height,
        }
    }

    /// Inverse transform for a wheel or key zoom at cell pixel `(cell_x, cell_y)`.
    ///
    /// The first zoom centers on the pointer. Once zoomed, the pointer is
    /// mapped through the visible window into zoomed space and divided back
    /// into scaled space; the center only moves if that differs from the
    /// current center by more than [`POSITION_EPSILON`].
    pub fn zoom_at(
        &mut self,
        cell_x: f64,
        cell_y: f64,
        direction: ZoomDirection,
        scaling: &ScalingParameters,
    ) {
        if self.is_zoomed() {
            let window = self.visible_window(scaling);
            let x_offset = scaling.x_offset as f64;
            let y_offset = scaling.y_offset as f64;

            let new_center_x = window.x as f64 + (cell_x - x_offset);
            let new_center_y = window.y as f64 + (cell_y - y_offset);

            let candidate_x = x_offset + new_center_x / self.scale;
            let candidate_y = y_offset + new_center_y / self.scale;

            if (candidate_x - self.center_x).abs() > POSITION_EPSILON {
                self.center_x = candidate_x;
            }
            if (candidate_y - self.center_y).abs() > POSITION_EPSILON {
                self.center_y = candidate_y;
            }
        } else {
            self.center_x = cell_x;
            self.center_y = cell_y;
        }

        let scale = match direction {
            ZoomDirection::In => self.scale * ZOOM_STEP,
            ZoomDirection::Out => self.scale / ZOOM_STEP,
        };
        self.scale = clamp_scale(scale);
    }

    /// Map a cell pixel to native video pixels under the current zoom.
    ///
    /// Points on the cell padding map outside `0..original_width` (possibly
    /// negative); callers decide whether to keep them.
    pub fn video_point(&self, cell_x: f64, cell_y: f64, scaling: &ScalingParameters) -> (f64, f64) {
        let window = self.visible_window(scaling);
        let zoomed_x = window.x as f64 + (cell_x - scaling.x_offset as f64);
        let zoomed_y = window.y as f64 + (cell_y - scaling.y_offset as f64);
        (
            zoomed_x * scaling.original_width as f64 / window.zoomed_width as f64,
            zoomed_y * scaling.original_height as f64 / window.zoomed_height as f64,
        )
    }
}

/// Origin of the visible window along one axis, shifted back inside the
/// zoomed image when the centered window would overrun it.
fn window_origin(center: f64, offset: u32, visible: u32, zoomed: u32) -> u32 {
    let relative = (center - offset as f64) / visible as f64;
    let center_in_zoomed = (relative * zoomed as f64).floor() as i64;

    let start = (center_in_zoomed - (visible / 2) as i64).max(0);
    let end = (start + visible as i64).min(zoomed as i64);
    if end == zoomed as i64 {
        zoomed - visible
    } else {
        start as u32
    }
}

fn clamp_scale(scale: f64) -> f64 {
    let scale = scale.clamp(ZOOM_MIN, ZOOM_MAX);
    // Zooming out through repeated divisions lands a hair above 1.0.
    if scale - ZOOM_MIN < 1e-9 {
        ZOOM_MIN
    } else {
        scale
    }
}
