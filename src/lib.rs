// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! YAICT: Yet Another Image Captioning Tool
//!
//! Manages a local image dataset: images are copied into a per-group folder
//! layout under generated ids, thumbnailed, and optionally captioned.

pub mod config;
pub mod dataset;
pub mod error;
pub mod web;

pub use config::AppConfig;
pub use dataset::DatasetManager;
pub use error::{Result, YaictError};
