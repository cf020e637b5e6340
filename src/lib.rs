// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! poseclick - multi-video keypoint labeling
//!
//! Synchronized recordings are shown side by side in a grid. Clicking a video
//! records the active tracked point at the clicked pixel for the current
//! frame, and the label table is saved as CSV.

pub mod error;
pub mod grid;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod viewer;

pub use error::{Error, Result};
pub use models::{LabelStore, SessionConfig};
pub use viewer::{open_session, GridViewer};
