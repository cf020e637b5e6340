// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Label overlays: point markers, names, the per-video label list, and the
//! grid-wide status and help text.
//!
//! Markers are drawn on native-resolution frames before they are scaled
//! into the grid, so label coordinates are used as-is.

use super::text::{self, draw_outlined_text, draw_text_block};
use crate::models::annotation::LabelMap;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;
use std::collections::HashMap;

pub const SHORT_HELP_TEXT: &str = "H for Help, \nEsc to Quit";

pub const FULL_HELP_TEXT: &str = "Click on the video to add a point.\n\
Use 'a' and 'd' to navigate through frames.\n\
Press 'f' and 'g' to jump through labeled frames.\n\
Use 'w' and 's' to change the active point.\n\
Use 'e' to zoom in and 'q' to zoom out.\n\
Use 'r' to reset the zoom.\n\
Use 'j', 'i', 'k', 'l' to pan.\n\
Press 'u' to clear the active point\n\
for the current frame.\n\
Press 'c' to toggle auto next point.\n\
Press 'm' to toggle machine labels.\n\
Press 'v' to copy machine labels to labeled data.\n\
Press 'n' to toggle point names.\n\
Press ',' to toggle the label list.\n\
Press '1'/'2' for brightness, '3'/'4' for contrast,\n\
'5' to reset them.\n\
Press 'h' to toggle help text.\n\
Press 'Esc' to quit.";

const MARKER_OUTLINE: Rgb<u8> = Rgb([1, 1, 1]);
const UNKNOWN_POINT_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const LABEL_LIST_COLOR: Rgb<u8> = Rgb([55, 150, 255]);
const STATUS_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
const HELP_COLOR: Rgb<u8> = Rgb([40, 115, 215]);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    Diamond,
    Cross,
}

/// How one label table is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationStyle {
    pub marker: MarkerShape,
    pub marker_size: u32,
    pub marker_thickness: u32,
    /// Draw a dark, slightly larger marker underneath.
    pub outline: bool,
    pub show_names: bool,
    /// List every tracked point with its coordinates in the corner.
    pub show_label_list: bool,
}

impl AnnotationStyle {
    /// Human labels.
    pub fn manual() -> Self {
        Self {
            marker: MarkerShape::Diamond,
            marker_size: 15,
            marker_thickness: 1,
            outline: true,
            show_names: true,
            show_label_list: true,
        }
    }

    /// Model predictions shown next to the human labels.
    pub fn machine() -> Self {
        Self {
            marker: MarkerShape::Cross,
            marker_size: 10,
            marker_thickness: 1,
            outline: false,
            show_names: true,
            show_label_list: false,
        }
    }
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self::manual()
    }
}

/// Draws label overlays. Holds only the tracked-point order and the colors
/// derived from it.
#[derive(Debug, Clone)]
pub struct AnnotationRenderer {
    tracked_points: Vec<String>,
    colors: HashMap<String, Rgb<u8>>,
}

impl AnnotationRenderer {
    pub fn new(tracked_points: &[String]) -> Self {
        let count = tracked_points.len().max(1) as f64;
        let colors = tracked_points
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), hsv_to_rgb(i as f64 / count, 1.0, 0.95)))
            .collect();
        Self {
            tracked_points: tracked_points.to_vec(),
            colors,
        }
    }

    pub fn tracked_points(&self) -> &[String] {
        &self.tracked_points
    }

    /// Color for a point. Names outside the tracked set get a stable hashed hue.
    pub fn point_color(&self, name: &str) -> Rgb<u8> {
        self.colors.get(name).copied().unwrap_or_else(|| {
            if name.is_empty() {
                UNKNOWN_POINT_COLOR
            } else {
                hsv_to_rgb((fnv1a(name) % 360) as f64 / 360.0, 1.0, 0.95)
            }
        })
    }

    /// Draw the labels of one frame onto it.
    pub fn annotate(
        &self,
        image: &mut RgbImage,
        labels: &LabelMap,
        active_point: Option<&str>,
        style: &AnnotationStyle,
    ) {
        let text_scale = text_scale_for(image.height());

        for (name, coordinate) in labels {
            let (x, y) = (coordinate.x as f32, coordinate.y as f32);
            let color = self.point_color(name);
            if style.outline {
                let size = (style.marker_size as f32 * 1.3) as u32;
                let thickness = ((style.marker_thickness as f32 * 1.3) as u32).max(1);
                draw_marker(image, x, y, style.marker, size, thickness, MARKER_OUTLINE);
            }
            draw_marker(image, x, y, style.marker, style.marker_size, style.marker_thickness, color);

            if style.show_names {
                let name_scale = text_scale.saturating_sub(1).max(1);
                draw_outlined_text(
                    image,
                    name,
                    x as i32 + style.marker_size as i32,
                    y as i32 - style.marker_size as i32 - (text::GLYPH_SIZE * name_scale) as i32,
                    name_scale,
                    color,
                );
            }
        }

        if style.show_label_list {
            let offset = (image.height() as f64 * 0.05) as i32;
            let list = self.label_list(labels, active_point);
            draw_text_block(image, &list, offset, offset, text_scale, LABEL_LIST_COLOR);
        }
    }

    /// One line per tracked point: its coordinates or `(?, ?)`, flagging the active one.
    pub fn label_list(&self, labels: &LabelMap, active_point: Option<&str>) -> String {
        let mut lines = Vec::with_capacity(self.tracked_points.len());
        for point in &self.tracked_points {
            let mut line = match labels.get(point) {
                Some(c) => format!("{}: {}, {} ", point, c.x as i64, c.y as i64),
                None => format!("{}: (?, ?) ", point),
            };
            if active_point == Some(point.as_str()) {
                line.push_str(" <-(active)");
            }
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Status and help text on the composed grid.
    pub fn annotate_grid(
        &self,
        image: &mut RgbImage,
        frame_number: usize,
        active_point: &str,
        show_help: bool,
    ) {
        let (width, height) = image.dimensions();
        let scale = (height / 540).max(1);

        let status = format!("Frame Number: {}\n {}", frame_number, active_point);
        let status_y = (height / 10 * 9) as i32 - text::line_height(scale) as i32;
        draw_text_block(image, &status, (width / 10 * 8) as i32, status_y, scale, STATUS_COLOR);

        let help = if show_help { FULL_HELP_TEXT } else { SHORT_HELP_TEXT };
        draw_text_block(image, help, 10, (height / 10 * 3) as i32, scale, HELP_COLOR);
    }
}

/// Glyph scale that keeps text legible once a frame is shrunk into the grid.
fn text_scale_for(height: u32) -> u32 {
    (height / 360).max(1)
}

fn draw_marker(
    image: &mut RgbImage,
    x: f32,
    y: f32,
    shape: MarkerShape,
    size: u32,
    thickness: u32,
    color: Rgb<u8>,
) {
    let half = size as f32 / 2.0;
    for layer in 0..thickness.max(1) {
        let shift = layer as f32 - (thickness.max(1) - 1) as f32 / 2.0;
        match shape {
            MarkerShape::Diamond => {
                let h = half + shift;
                let corners = [(x, y - h), (x + h, y), (x, y + h), (x - h, y)];
                for i in 0..corners.len() {
                    draw_line_segment_mut(image, corners[i], corners[(i + 1) % corners.len()], color);
                }
            }
            MarkerShape::Cross => {
                draw_line_segment_mut(image, (x - half, y + shift), (x + half, y + shift), color);
                draw_line_segment_mut(image, (x + shift, y - half), (x + shift, y + half), color);
            }
        }
    }
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb<u8> {
    let sector = hue * 6.0;
    let f = sector - sector.floor();
    let p = value * (1.0 - saturation);
    let q = value * (1.0 - f * saturation);
    let t = value * (1.0 - (1.0 - f) * saturation);
    let (r, g, b) = match (sector.floor() as i64).rem_euclid(6) {
        0 => (value, t, p),
        1 => (q, value, p),
        2 => (p, value, t),
        3 => (p, q, value),
        4 => (t, p, value),
        _ => (value, p, q),
    };
    Rgb([(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8])
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::annotation::Coordinate;

    fn renderer() -> AnnotationRenderer {
        AnnotationRenderer::new(&["nose".to_string(), "left_eye".to_string(), "tail".to_string()])
    }

    fn labels(entries: &[(&str, f64, f64)]) -> LabelMap {
        entries
            .iter()
            .map(|(name, x, y)| (name.to_string(), Coordinate::new(*x, *y)))
            .collect()
    }

    #[test]
    fn test_palette_is_distinct_and_deterministic() {
        let a = renderer();
        let b = renderer();
        assert_eq!(a.point_color("nose"), Rgb([242, 0, 0]));
        assert_ne!(a.point_color("nose"), a.point_color("left_eye"));
        assert_ne!(a.point_color("left_eye"), a.point_color("tail"));
        assert_eq!(a.point_color("tail"), b.point_color("tail"));
        assert_eq!(a.point_color("elbow"), b.point_color("elbow"));
    }

    #[test]
    fn test_marker_is_drawn_at_label() {
        let renderer = renderer();
        let mut image = RgbImage::new(200, 200);
        let style = AnnotationStyle {
            marker_size: 16,
            show_names: false,
            show_label_list: false,
            ..AnnotationStyle::manual()
        };
        renderer.annotate(&mut image, &labels(&[("nose", 100.0, 100.0)]), None, &style);

        let color = renderer.point_color("nose");
        // top corners of the diamond and its outline
        assert_eq!(image.get_pixel(100, 92), &color);
        assert_eq!(image.get_pixel(100, 90), &MARKER_OUTLINE);
        assert_eq!(image.get_pixel(100, 100), &Rgb([0, 0, 0]));
        assert_eq!(image.get_pixel(10, 10), &Rgb([0, 0, 0]));
    }

    #[test]
    fn test_cross_marker() {
        let renderer = renderer();
        let mut image = RgbImage::new(50, 50);
        let style = AnnotationStyle {
            show_names: false,
            ..AnnotationStyle::machine()
        };
        renderer.annotate(&mut image, &labels(&[("tail", 20.0, 20.0)]), None, &style);
        let color = renderer.point_color("tail");
        assert_eq!(image.get_pixel(20, 20), &color);
        assert_eq!(image.get_pixel(17, 20), &color);
        assert_eq!(image.get_pixel(20, 23), &color);
    }

    #[test]
    fn test_markers_near_edges_are_clipped() {
        let renderer = renderer();
        let mut image = RgbImage::new(20, 20);
        let labels = labels(&[("nose", 0.0, 0.0), ("tail", 19.0, 19.0), ("elbow", 500.0, 2.0)]);
        renderer.annotate(&mut image, &labels, Some("nose"), &AnnotationStyle::manual());
    }

    #[test]
    fn test_label_list() {
        let renderer = renderer();
        let list = renderer.label_list(&labels(&[("nose", 50.0, 60.7)]), Some("left_eye"));
        assert_eq!(
            list,
            "nose: 50, 60 \nleft_eye: (?, ?)  <-(active)\ntail: (?, ?) "
        );
    }

    #[test]
    fn test_empty_labels_leave_image_untouched() {
        let renderer = renderer();
        let mut image = RgbImage::new(40, 40);
        let style = AnnotationStyle {
            show_label_list: false,
            ..AnnotationStyle::manual()
        };
        renderer.annotate(&mut image, &LabelMap::new(), Some("nose"), &style);
        assert!(image.pixels().all(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn test_grid_overlay_draws_text() {
        let renderer = renderer();
        let mut image = RgbImage::new(960, 540);
        renderer.annotate_grid(&mut image, 12, "nose", false);
        assert!(image.pixels().any(|p| *p == STATUS_COLOR));
        assert!(image.pixels().any(|p| *p == HELP_COLOR));
    }

    #[test]
    fn test_hsv_primaries() {
        assert_eq!(hsv_to_rgb(0.0, 1.0, 1.0), Rgb([255, 0, 0]));
        assert_eq!(hsv_to_rgb(0.5, 1.0, 1.0), Rgb([0, 255, 255]));
        assert_eq!(hsv_to_rgb(0.25, 0.0, 1.0), Rgb([255, 255, 255]));
    }
}
