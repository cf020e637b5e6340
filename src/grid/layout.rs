// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Grid layout for N videos inside a bounded window.
//!
//! The layout picks a row/column count that fits every video while
//! wasting as few cells as possible. Videos that are wider than tall
//! prefer extra rows, tall videos prefer extra columns.

use crate::error::{Error, Result};

/// Rows, columns, and cell size of the video grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub rows: u32,
    pub columns: u32,
    pub cell_width: u32,
    pub cell_height: u32,
}

impl GridLayout {
    /// Calculate the layout for videos of the given `(width, height)` sizes.
    pub fn calculate(video_sizes: &[(u32, u32)], max_window_size: (u32, u32)) -> Result<Self> {
        let count = video_sizes.len() as u32;
        if count == 0 {
            return Err(Error::configuration("cannot lay out a grid with no videos"));
        }
        if video_sizes.iter().any(|&(w, h)| w == 0 || h == 0) {
            return Err(Error::configuration("video dimensions must be non-zero"));
        }

        let (max_width, max_height) = max_window_size;
        let mean_width =
            video_sizes.iter().map(|&(w, _)| w as f64).sum::<f64>() / count as f64;
        let mean_height =
            video_sizes.iter().map(|&(_, h)| h as f64).sum::<f64>() / count as f64;
        let aspect_ratio = mean_width / mean_height;

        // Initial estimate
        let mut rows = ((count as f64 * aspect_ratio).sqrt().round() as u32).max(1);
        let mut columns = count.div_ceil(rows);

        // Make sure every video has a cell
        while rows * columns < count {
            if aspect_ratio > 1.0 {
                rows += 1;
            } else {
                columns += 1;
            }
        }

        // Remove empty cells where possible
        while rows * columns > count {
            let fewer_rows = (rows - 1) * columns >= count;
            let fewer_columns = rows * (columns - 1) >= count;
            if aspect_ratio < 1.0 {
                if fewer_rows {
                    rows -= 1;
                } else if fewer_columns {
                    columns -= 1;
                } else {
                    break;
                }
            } else if fewer_columns {
                columns -= 1;
            } else if fewer_rows {
                rows -= 1;
            } else {
                break;
            }
        }

        let layout = Self {
            rows,
            columns,
            cell_width: max_width / columns,
            cell_height: max_height / rows,
        };
        if layout.cell_width == 0 || layout.cell_height == 0 {
            return Err(Error::configuration(format!(
                "window {}x{} is too small for a {}x{} grid",
                max_width, max_height, rows, columns
            )));
        }
        log::debug!(
            "Grid layout for {} videos: {} rows x {} columns, cells {}x{}",
            count,
            rows,
            columns,
            layout.cell_width,
            layout.cell_height
        );
        Ok(layout)
    }

    pub fn capacity(&self) -> u32 {
        self.rows * self.columns
    }

    pub fn cell_size(&self) -> (u32, u32) {
        (self.cell_width, self.cell_height)
    }

    pub fn total_width(&self) -> u32 {
        self.cell_width * self.columns
    }

    pub fn total_height(&self) -> u32 {
        self.cell_height * self.rows
    }

    /// Grid cell `(column, row)` holding the video at `index`.
    pub fn cell_of(&self, index: usize) -> (u32, u32) {
        let index = index as u32;
        (index % self.columns, index / self.columns)
    }

    /// Video index shown in cell `(column, row)`, if the cell is inside the grid.
    pub fn index_of(&self, cell: (u32, u32)) -> Option<usize> {
        let (column, row) = cell;
        if column >= self.columns || row >= self.rows {
            return None;
        }
        Some((row * self.columns + column) as usize)
    }

    /// Cell containing the window pixel and the pixel's offset inside it.
    pub fn locate(&self, x: u32, y: u32) -> ((u32, u32), (u32, u32)) {
        (
            (x / self.cell_width, y / self.cell_height),
            (x % self.cell_width, y % self.cell_height),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HD: (u32, u32) = (1920, 1080);

    #[test]
    fn test_empty_video_list_is_rejected() {
        let err = GridLayout::calculate(&[], HD).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_three_landscape_videos() {
        let layout = GridLayout::calculate(&[(1280, 720); 3], HD).unwrap();
        assert_eq!((layout.rows, layout.columns), (2, 2));
        assert_eq!(layout.cell_size(), (960, 540));
        assert_eq!(layout.total_width(), 1920);
        assert_eq!(layout.total_height(), 1080);
    }

    #[test]
    fn test_single_video_fills_window() {
        let layout = GridLayout::calculate(&[(640, 480)], HD).unwrap();
        assert_eq!(layout.capacity(), 1);
        assert_eq!(layout.cell_size(), HD);
    }

    #[test]
    fn test_very_tall_single_video_still_gets_a_row() {
        let layout = GridLayout::calculate(&[(100, 1000)], HD).unwrap();
        assert_eq!((layout.rows, layout.columns), (1, 1));
    }

    #[test]
    fn test_portrait_videos_prefer_columns() {
        let layout = GridLayout::calculate(&[(720, 1280); 4], HD).unwrap();
        assert!(layout.columns >= layout.rows);
        assert_eq!(layout.capacity(), 4);
    }

    #[test]
    fn test_capacity_is_sufficient_and_minimal() {
        for count in 1..=24usize {
            for &size in &[(1280u32, 720u32), (720, 1280), (640, 640), (1920, 1200)] {
                let sizes = vec![size; count];
                let layout = GridLayout::calculate(&sizes, HD).unwrap();
                let n = count as u32;
                assert!(layout.capacity() >= n, "{} videos of {:?}", count, size);
                // No single row or column can be dropped without losing a cell.
                assert!((layout.rows - 1) * layout.columns < n || layout.rows == 1);
                assert!(layout.rows * (layout.columns - 1) < n || layout.columns == 1);
            }
        }
    }

    #[test]
    fn test_layout_is_deterministic() {
        let sizes = [(1920, 1080), (1280, 720), (640, 480), (1280, 1024), (800, 600)];
        let first = GridLayout::calculate(&sizes, HD).unwrap();
        let second = GridLayout::calculate(&sizes, HD).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_locate_and_index() {
        let layout = GridLayout::calculate(&[(1280, 720); 3], HD).unwrap();
        assert_eq!(layout.locate(50, 50), ((0, 0), (50, 50)));
        assert_eq!(layout.locate(1000, 600), ((1, 1), (40, 60)));
        assert_eq!(layout.index_of((1, 1)), Some(3));
        assert_eq!(layout.index_of((2, 0)), None);
        assert_eq!(layout.cell_of(2), (0, 1));
    }
}
