// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! UI components for the poseclick window.

pub mod canvas;
pub mod properties;
pub mod timeline;
pub mod toolbar;
