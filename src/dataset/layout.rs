// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! On-disk dataset layout
//!
//! ```text
//! <root>/images/<group>/<id><ext>
//! <root>/images/<group>/<id>.txt
//! <root>/thumbnails/<id>.jpg
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::record::ImageRecord;
use super::{CAPTION_EXTENSIONS, IMAGE_EXTENSIONS, THUMBNAIL_EXTENSION};
use crate::Result;

pub const IMAGE_DIR: &str = "images";
pub const THUMBNAIL_DIR: &str = "thumbnails";

/// Directory tree owned by a dataset
#[derive(Debug, Clone)]
pub struct Layout {
    root: PathBuf,
    image_dir: PathBuf,
    thumbnail_dir: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            image_dir: root.join(IMAGE_DIR),
            thumbnail_dir: root.join(THUMBNAIL_DIR),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn image_dir(&self) -> &Path {
        &self.image_dir
    }

    pub fn thumbnail_dir(&self) -> &Path {
        &self.thumbnail_dir
    }

    /// Create root, image and thumbnail directories if they don't exist
    pub fn setup_folders(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        fs::create_dir_all(&self.image_dir)?;
        fs::create_dir_all(&self.thumbnail_dir)?;
        info!(
            "Dataset folders ready: {:?}, {:?}, {:?}",
            self.root, self.image_dir, self.thumbnail_dir
        );
        Ok(())
    }

    /// Create the group folder for `group` if needed and return its path
    pub fn ensure_group(&self, group: &str) -> Result<PathBuf> {
        let folder = self.image_dir.join(group);
        fs::create_dir_all(&folder)?;
        debug!("Group folder ready: {:?}", folder);
        Ok(folder)
    }

    /// Rebuild records from the group folders under `images/`.
    ///
    /// Groups and files are visited in lexical order so the resulting
    /// listing order is stable across restarts.
    pub fn scan(&self) -> Result<Vec<ImageRecord>> {
        let mut records: Vec<ImageRecord> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for folder in sorted_entries(&self.image_dir)? {
            if !folder.is_dir() {
                continue;
            }
            let group = match folder.file_name() {
                Some(name) => name.to_string_lossy().into_owned(),
                None => continue,
            };

            for file in sorted_entries(&folder)? {
                if !file.is_file() || !has_extension(&file, IMAGE_EXTENSIONS) {
                    continue;
                }
                let (id, image_extension) = match (file_stem(&file), extension_of(&file)) {
                    (Some(id), Some(ext)) => (id, ext),
                    _ => continue,
                };

                if !seen.insert(id.clone()) {
                    warn!("Duplicate image id {} in group {}, skipping {:?}", id, group, file);
                    continue;
                }

                let caption_extension = find_file_with_extensions(&folder, &id, CAPTION_EXTENSIONS)
                    .and_then(|caption| extension_of(&caption));

                records.push(ImageRecord::new(
                    id,
                    group.clone(),
                    image_extension,
                    THUMBNAIL_EXTENSION,
                    caption_extension,
                ));
            }
        }

        info!("Loaded {} existing images from {:?}", records.len(), self.image_dir);
        Ok(records)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    Ok(entries)
}

/// Extension of `path` with its leading dot, original case preserved
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

pub fn file_stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Case-insensitive suffix check on the file name, so multi-part entries
/// like `.tar.gz` match too. Entries in `extensions` may be given with or
/// without the leading dot. A name made only of the suffix never matches.
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(n) => n.to_ascii_lowercase(),
        None => return false,
    };
    extensions.iter().any(|candidate| {
        let suffix = format!(".{}", candidate.as_ref().trim_start_matches('.').to_ascii_lowercase());
        name.len() > suffix.len() && name.ends_with(&suffix)
    })
}

/// Probe `folder` for `<name><ext>` in the order `extensions` lists them
pub fn find_file_with_extensions(folder: &Path, name: &str, extensions: &[&str]) -> Option<PathBuf> {
    extensions
        .iter()
        .map(|ext| folder.join(format!("{}{}", name, ext)))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_extension_case_insensitive() {
        let exts = [".jpg", ".jpeg", ".png"];
        assert!(has_extension(Path::new("a/photo.JPG"), &exts));
        assert!(has_extension(Path::new("a/photo.Png"), &exts));
        assert!(!has_extension(Path::new("a/photo.txt"), &exts));
        assert!(!has_extension(Path::new("a/photo"), &exts));
        assert!(!has_extension(Path::new("a/.jpg"), &exts));
        assert!(has_extension(Path::new("a/photo.jpeg"), &["jpeg"]));
        assert!(!has_extension(Path::new("a/photojpg"), &exts));
    }

    #[test]
    fn test_has_extension_multi_part() {
        let exts = [".tar.gz"];
        assert!(has_extension(Path::new("a/backup.tar.gz"), &exts));
        assert!(has_extension(Path::new("a/BACKUP.TAR.GZ"), &["tar.gz"]));
        assert!(!has_extension(Path::new("a/backup.gz"), &exts));
        assert!(!has_extension(Path::new("a/.tar.gz"), &exts));
    }

    #[test]
    fn test_extension_of_keeps_case() {
        assert_eq!(extension_of(Path::new("x/IMG.JPG")), Some(".JPG".to_string()));
        assert_eq!(extension_of(Path::new("x/noext")), None);
    }

    #[test]
    fn test_find_file_respects_preference_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cat.caption"), "b").unwrap();
        assert_eq!(
            find_file_with_extensions(dir.path(), "cat", CAPTION_EXTENSIONS),
            Some(dir.path().join("cat.caption"))
        );

        fs::write(dir.path().join("cat.txt"), "a").unwrap();
        assert_eq!(
            find_file_with_extensions(dir.path(), "cat", CAPTION_EXTENSIONS),
            Some(dir.path().join("cat.txt"))
        );
        assert_eq!(find_file_with_extensions(dir.path(), "dog", CAPTION_EXTENSIONS), None);
    }

    #[test]
    fn test_setup_folders_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path().join("data"));
        layout.setup_folders().unwrap();
        fs::write(layout.thumbnail_dir().join("keep.jpg"), b"x").unwrap();
        layout.setup_folders().unwrap();

        assert!(layout.image_dir().is_dir());
        assert_eq!(fs::read(layout.thumbnail_dir().join("keep.jpg")).unwrap(), b"x");
    }

    #[test]
    fn test_scan_reconstructs_records() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.setup_folders().unwrap();

        let banana = layout.ensure_group("banana").unwrap();
        fs::write(banana.join("id-b.png"), b"png").unwrap();
        fs::write(banana.join("id-b.caption"), "ripe").unwrap();
        fs::write(banana.join("notes.md"), "ignored").unwrap();
        let apple = layout.ensure_group("apple").unwrap();
        fs::write(apple.join("id-a.JPG"), b"jpg").unwrap();
        fs::write(layout.image_dir().join("stray.jpg"), b"top-level").unwrap();

        let records = layout.scan().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].id, "id-a");
        assert_eq!(records[0].group, "apple");
        assert_eq!(records[0].image_extension, ".JPG");
        assert_eq!(records[0].caption_extension, None);

        assert_eq!(records[1].id, "id-b");
        assert_eq!(records[1].caption_extension.as_deref(), Some(".caption"));
        assert_eq!(records[1].thumbnail_extension, ".jpg");
    }

    #[test]
    fn test_scan_skips_duplicate_ids() {
        let dir = tempfile::tempdir().unwrap();
        let layout = Layout::new(dir.path());
        layout.setup_folders().unwrap();
        fs::write(layout.ensure_group("a").unwrap().join("same.jpg"), b"1").unwrap();
        fs::write(layout.ensure_group("b").unwrap().join("same.png"), b"2").unwrap();

        let records = layout.scan().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].group, "a");
    }
}
