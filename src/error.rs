// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for yaict

use thiserror::Error;

/// Result type alias for yaict operations
pub type Result<T> = std::result::Result<T, YaictError>;

/// yaict error types
#[derive(Error, Debug)]
pub enum YaictError {
    /// A source file or identifier the caller named does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The dataset cannot accept the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl YaictError {
    /// True for errors a front end should report as "not found"
    pub fn is_not_found(&self) -> bool {
        match self {
            YaictError::NotFound(_) => true,
            YaictError::FileSystem(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
