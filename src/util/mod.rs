// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Helpers for the desktop shell.

pub mod geometry;
