// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! In-memory metadata for one managed image

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Metadata for an image stored in the dataset.
///
/// All paths are derived from the group name, the identifier and the stored
/// extensions; nothing else is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: String,
    /// Subfolder under `images/`, taken from the source file stem
    pub group: String,
    /// Extension of the stored image, leading dot included
    pub image_extension: String,
    pub thumbnail_extension: String,
    pub caption_extension: Option<String>,
}

impl ImageRecord {
    pub fn new(
        id: impl Into<String>,
        group: impl Into<String>,
        image_extension: impl Into<String>,
        thumbnail_extension: impl Into<String>,
        caption_extension: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            group: group.into(),
            image_extension: image_extension.into(),
            thumbnail_extension: thumbnail_extension.into(),
            caption_extension,
        }
    }

    pub fn image_path(&self, image_dir: &Path) -> PathBuf {
        self.containing_folder(image_dir)
            .join(format!("{}{}", self.id, self.image_extension))
    }

    /// Caption path, or `None` while the image has no caption
    pub fn caption_path(&self, image_dir: &Path) -> Option<PathBuf> {
        self.caption_extension
            .as_ref()
            .map(|ext| self.caption_path_with(image_dir, ext))
    }

    /// Caption path for an arbitrary extension
    pub(crate) fn caption_path_with(&self, image_dir: &Path, extension: &str) -> PathBuf {
        self.containing_folder(image_dir)
            .join(format!("{}{}", self.id, extension))
    }

    pub fn thumbnail_file_name(&self) -> String {
        format!("{}{}", self.id, self.thumbnail_extension)
    }

    pub fn containing_folder(&self, image_dir: &Path) -> PathBuf {
        image_dir.join(&self.group)
    }

    pub fn has_caption(&self) -> bool {
        self.caption_extension.is_some()
    }
}
