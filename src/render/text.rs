// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Bitmap text drawn straight into RGB frames.

use font8x8::legacy::BASIC_LEGACY;
use image::{Rgb, RgbImage};

/// Width and height of one glyph at scale 1.
pub const GLYPH_SIZE: u32 = 8;

const OUTLINE_COLOR: Rgb<u8> = Rgb([0, 0, 0]);

fn glyph(ch: char) -> [u8; 8] {
    let index = ch as usize;
    if index < BASIC_LEGACY.len() {
        BASIC_LEGACY[index]
    } else {
        BASIC_LEGACY[b'?' as usize]
    }
}

/// Vertical distance between lines of text at `scale`.
pub fn line_height(scale: u32) -> u32 {
    (GLYPH_SIZE + 4) * scale
}

pub fn text_width(text: &str, scale: u32) -> u32 {
    text.chars().count() as u32 * GLYPH_SIZE * scale
}

fn fill_block(img: &mut RgbImage, x: i64, y: i64, size: u32, color: Rgb<u8>) {
    let (width, height) = (img.width() as i64, img.height() as i64);
    for py in y.max(0)..(y + size as i64).min(height) {
        for px in x.max(0)..(x + size as i64).min(width) {
            img.put_pixel(px as u32, py as u32, color);
        }
    }
}

/// Draw one line of text with its top-left corner at `(x, y)`, clipped to the image.
pub fn draw_text(img: &mut RgbImage, text: &str, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let scale = scale.max(1);
    let advance = (GLYPH_SIZE * scale) as i64;
    for (i, ch) in text.chars().enumerate() {
        let origin_x = x as i64 + i as i64 * advance;
        if origin_x >= img.width() as i64 {
            break;
        }
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH_SIZE {
                // least significant bit is the leftmost pixel
                if (bits >> col) & 1 == 1 {
                    fill_block(
                        img,
                        origin_x + (col * scale) as i64,
                        y as i64 + (row as u32 * scale) as i64,
                        scale,
                        color,
                    );
                }
            }
        }
    }
}

/// Text with a dark outline so it stays readable on any frame.
pub fn draw_outlined_text(img: &mut RgbImage, text: &str, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let step = scale.max(1) as i32;
    for (dx, dy) in [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)] {
        draw_text(img, text, x + dx * step, y + dy * step, scale, OUTLINE_COLOR);
    }
    draw_text(img, text, x, y, scale, color);
}

/// Draw `\n`-separated lines starting at `(x, y)`. Empty lines only advance.
pub fn draw_text_block(img: &mut RgbImage, text: &str, x: i32, y: i32, scale: u32, color: Rgb<u8>) {
    let mut line_y = y;
    for line in text.split('\n') {
        if !line.is_empty() {
            draw_outlined_text(img, line, x, line_y, scale, color);
        }
        line_y += line_height(scale.max(1)) as i32;
    }
}
