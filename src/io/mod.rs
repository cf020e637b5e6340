// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! I/O operations for media, label tables, and config files.

pub mod label_csv;
pub mod media;
pub mod serialization;
