// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Grid geometry: cell layout, per-video scaling, and zoom transforms.

pub mod layout;
pub mod scaling;
pub mod zoom;

pub use layout::GridLayout;
pub use scaling::ScalingParameters;
pub use zoom::{ZoomDirection, ZoomState};
