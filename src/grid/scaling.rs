// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Aspect-preserving placement of a video inside its grid cell.

/// How one video is resized and padded to fit its grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalingParameters {
    pub scale: f64,
    pub x_offset: u32,
    pub y_offset: u32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub original_width: u32,
    pub original_height: u32,
}

impl ScalingParameters {
    /// Uniformly scale `(width, height)` to fit `(cell_width, cell_height)` and
    /// center it. Small videos are scaled up.
    pub fn fit(width: u32, height: u32, cell_width: u32, cell_height: u32) -> Self {
        let scale = f64::min(
            cell_width as f64 / width as f64,
            cell_height as f64 / height as f64,
        );

        let scaled_width = ((width as f64 * scale).round() as u32).clamp(1, cell_width.max(1));
        let scaled_height = ((height as f64 * scale).round() as u32).clamp(1, cell_height.max(1));

        Self {
            scale,
            x_offset: (cell_width - scaled_width) / 2,
            y_offset: (cell_height - scaled_height) / 2,
            scaled_width,
            scaled_height,
            original_width: width,
            original_height: height,
        }
    }

    /// Whether a cell-relative pixel lands on the video rather than the padding.
    pub fn contains(&self, cell_x: f64, cell_y: f64) -> bool {
        let left = self.x_offset as f64;
        let top = self.y_offset as f64;
        cell_x >= left
            && cell_y >= top
            && cell_x < left + self.scaled_width as f64
            && cell_y < top + self.scaled_height as f64
    }
}
