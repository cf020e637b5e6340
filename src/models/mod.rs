// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Data models for labels, videos, and sessions.

pub mod annotation;
pub mod labels;
pub mod project;
pub mod video;

pub use annotation::{Coordinate, LabelMap, TrackedPointConfig, TrackedPointSet};
pub use labels::{LabelStore, VideoRef};
pub use project::{ClosePolicy, SessionConfig};
pub use video::VideoDescriptor;
