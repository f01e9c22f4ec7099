// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Flat image store without ids or thumbnails
//!
//! Each image lives in `<base>/<stem>/<file name>`. There is no registry:
//! listing walks the base directory every time.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use super::layout::{file_stem, has_extension};
use crate::{Result, YaictError};

#[derive(Debug, Clone)]
pub struct ImageManager {
    base_dir: PathBuf,
}

impl ImageManager {
    /// Create a manager rooted at `base_dir`, creating the directory
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let manager = Self {
            base_dir: base_dir.into(),
        };
        info!("ImageManager initialized with base directory: {:?}", manager.base_dir);
        manager.setup_folders()?;
        Ok(manager)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn setup_folders(&self) -> Result<()> {
        fs::create_dir_all(&self.base_dir)?;
        debug!("Base directory ready: {:?}", self.base_dir);
        Ok(())
    }

    /// Copy `image_path` into its own folder. Returns that folder.
    pub fn add_image(&self, image_path: &Path) -> Result<PathBuf> {
        info!("Attempting to add image: {:?}", image_path);
        if !image_path.exists() {
            error!("Image {:?} does not exist.", image_path);
            return Err(YaictError::NotFound(format!("Image {:?} does not exist", image_path)));
        }

        let (folder_name, file_name) = match (file_stem(image_path), image_path.file_name()) {
            (Some(stem), Some(name)) => (stem, name),
            _ => {
                return Err(YaictError::InvalidState(format!(
                    "Cannot derive a folder name from {:?}",
                    image_path
                )))
            }
        };

        let destination_folder = self.base_dir.join(folder_name);
        fs::create_dir_all(&destination_folder)?;

        let destination = destination_folder.join(file_name);
        fs::copy(image_path, &destination)?;
        info!("Copied image to: {:?}", destination);

        Ok(destination_folder)
    }

    /// Add every matching file in `folder`, in name order
    pub fn add_images_from_folder<S: AsRef<str>>(
        &self,
        folder: &Path,
        extensions: &[S],
    ) -> Result<Vec<PathBuf>> {
        info!("Loading images from folder: {:?}", folder);

        let mut files: Vec<PathBuf> = fs::read_dir(folder)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        files.sort();

        let mut added = Vec::new();
        for file in files {
            if file.is_file() && has_extension(&file, extensions) {
                added.push(self.add_image(&file)?);
                debug!("Added image: {:?}", file);
            }
        }

        info!("Added {} images", added.len());
        Ok(added)
    }

    /// One image per group folder: `<group>/<group><ext>`, trying
    /// `extensions` in order.
    pub fn all_images<S: AsRef<str>>(&self, extensions: &[S]) -> Result<Vec<PathBuf>> {
        let mut folders: Vec<PathBuf> = fs::read_dir(&self.base_dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        folders.sort();

        let images: Vec<PathBuf> = folders
            .iter()
            .filter_map(|folder| {
                let name = folder.file_name()?.to_string_lossy().into_owned();
                extensions
                    .iter()
                    .map(|ext| format!("{}.{}", name, ext.as_ref().trim_start_matches('.')))
                    .map(|file| folder.join(file))
                    .find(|candidate| candidate.is_file())
            })
            .collect();

        debug!("Retrieved {} image files", images.len());
        Ok(images)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::IMAGE_EXTENSIONS;

    #[test]
    fn test_setup_creates_base() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ImageManager::new(dir.path().join("flat")).unwrap();
        assert!(manager.base_dir().is_dir());
        manager.setup_folders().unwrap();

        let copy = manager.clone();
        assert_eq!(copy.base_dir(), manager.base_dir());
        assert!(format!("{:?}", copy).contains("flat"));
    }

    #[test]
    fn test_add_image_into_stem_folder() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("banana.jpg");
        fs::write(&source, b"\xff\xd8banana").unwrap();
        let manager = ImageManager::new(dir.path().join("flat")).unwrap();

        let folder = manager.add_image(&source).unwrap();
        assert_eq!(folder, dir.path().join("flat").join("banana"));
        assert_eq!(fs::read(folder.join("banana.jpg")).unwrap(), b"\xff\xd8banana");
    }

    #[test]
    fn test_add_missing_image() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ImageManager::new(dir.path().join("flat")).unwrap();
        let result = manager.add_image(&dir.path().join("nope.png"));
        assert!(matches!(result, Err(YaictError::NotFound(_))));
    }

    #[test]
    fn test_folder_import_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        fs::write(src.join("pineapple.jpg"), b"p").unwrap();
        fs::write(src.join("mango.png"), b"m").unwrap();
        fs::write(src.join("readme.txt"), b"r").unwrap();

        let manager = ImageManager::new(dir.path().join("flat")).unwrap();
        let added = manager.add_images_from_folder(&src, IMAGE_EXTENSIONS).unwrap();
        assert_eq!(added.len(), 2);

        let images = manager.all_images(IMAGE_EXTENSIONS).unwrap();
        assert_eq!(
            images,
            vec![
                dir.path().join("flat/mango/mango.png"),
                dir.path().join("flat/pineapple/pineapple.jpg"),
            ]
        );
    }
}
