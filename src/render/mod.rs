// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Drawing labels and composing the video grid.

pub mod annotator;
pub mod compositor;
pub mod text;

pub use annotator::{AnnotationRenderer, AnnotationStyle, MarkerShape};
pub use compositor::VideoAdjustments;
