// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Dataset store: ingestion, captions and lookups over the managed layout
//!
//! The registry lives in memory only. Opening a dataset over an existing
//! directory rebuilds it from file names, so everything the store knows must
//! be recoverable from the layout described in [`layout`].

pub mod image_manager;
pub mod layout;
pub mod record;
pub mod registry;
pub mod thumbnail;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use image_manager::ImageManager;
pub use layout::Layout;
pub use record::ImageRecord;
pub use registry::Registry;

use layout::{extension_of, file_stem, find_file_with_extensions, has_extension};
use crate::{Result, YaictError};

/// Image extensions recognised when scanning and importing by default
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];

/// Caption extensions probed for sibling captions, in preference order
pub const CAPTION_EXTENSIONS: &[&str] = &[".txt", ".caption"];

/// Extension used by [`DatasetManager::set_caption`]
pub const DEFAULT_CAPTION_EXTENSION: &str = ".txt";

pub const THUMBNAIL_EXTENSION: &str = ".jpg";

/// Owns a dataset directory and the registry describing it.
///
/// Not synchronised: callers sharing one manager across threads must wrap
/// it in a mutex.
#[derive(Debug)]
pub struct DatasetManager {
    layout: Layout,
    registry: Registry,
}

impl DatasetManager {
    /// Open the dataset at `root`, creating the layout when absent and
    /// rebuilding the registry when the root already exists.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let layout = Layout::new(root);
        let existed = layout.root().exists();

        let mut manager = Self {
            layout,
            registry: Registry::new(),
        };
        manager.setup_folders()?;
        if existed {
            manager.load_existing()?;
        }

        info!("Dataset opened at {:?} ({} images)", manager.root(), manager.len());
        Ok(manager)
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn image_dir(&self) -> &Path {
        self.layout.image_dir()
    }

    pub fn thumbnail_dir(&self) -> &Path {
        self.layout.thumbnail_dir()
    }

    /// Ensure the root, `images/` and `thumbnails/` directories exist
    pub fn setup_folders(&self) -> Result<()> {
        self.layout.setup_folders()
    }

    /// Scan the layout and register any record not already known.
    /// Returns the number of records added.
    pub fn load_existing(&mut self) -> Result<usize> {
        let mut added = 0;
        for record in self.layout.scan()? {
            if self.registry.insert(record) {
                added += 1;
            }
        }
        debug!("Registered {} images from disk", added);
        Ok(added)
    }

    /// Generate a new unique image id
    pub fn new_image_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Copy `source` into the dataset, optionally with its sibling caption,
    /// and generate its thumbnail. Returns the new image id.
    ///
    /// On failure every file written by this call is removed again and the
    /// registry is left unchanged. The group folder may remain.
    pub fn add_image(&mut self, source: &Path, match_caption: bool) -> Result<String> {
        info!("Attempting to add image: {:?}", source);
        if !source.exists() {
            error!("Image {:?} does not exist.", source);
            return Err(YaictError::NotFound(format!("Image {:?} does not exist", source)));
        }

        let group = file_stem(source).ok_or_else(|| {
            YaictError::InvalidState(format!("Cannot derive a group name from {:?}", source))
        })?;
        let id = Self::new_image_id();

        let mut written = Vec::new();
        let record = match self.ingest(source, &id, &group, match_caption, &mut written) {
            Ok(record) => record,
            Err(e) => {
                error!("Failed to add image {:?}: {}", source, e);
                remove_written(&written);
                return Err(e);
            }
        };

        self.registry.insert(record);
        info!("Image added successfully with id: {}", id);
        Ok(id)
    }

    /// Filesystem side of [`add_image`](Self::add_image). Every path is
    /// pushed to `written` before it is created.
    fn ingest(
        &self,
        source: &Path,
        id: &str,
        group: &str,
        match_caption: bool,
        written: &mut Vec<PathBuf>,
    ) -> Result<ImageRecord> {
        let image_extension = extension_of(source).unwrap_or_default();
        let destination_folder = self.layout.ensure_group(group)?;

        let destination_image = destination_folder.join(format!("{}{}", id, image_extension));
        written.push(destination_image.clone());
        fs::copy(source, &destination_image)?;
        info!("Copied image to: {:?}", destination_image);

        let mut caption_extension = None;
        if match_caption {
            let source_folder = source.parent().unwrap_or_else(|| Path::new("."));
            match find_file_with_extensions(source_folder, group, CAPTION_EXTENSIONS) {
                Some(caption_source) => {
                    info!("Caption file found: {:?}", caption_source);
                    let ext = extension_of(&caption_source).unwrap_or_default();
                    let destination_caption = destination_folder.join(format!("{}{}", id, ext));
                    written.push(destination_caption.clone());
                    fs::copy(&caption_source, &destination_caption)?;
                    caption_extension = Some(ext);
                }
                None => info!("No caption file found for image: {}", group),
            }
        }

        let thumbnail_path = self
            .layout
            .thumbnail_dir()
            .join(format!("{}{}", id, THUMBNAIL_EXTENSION));
        written.push(thumbnail_path.clone());
        thumbnail::generate_thumbnail(&destination_image, &thumbnail_path)?;
        info!("Created thumbnail at: {:?}", thumbnail_path);

        Ok(ImageRecord::new(
            id,
            group,
            image_extension,
            THUMBNAIL_EXTENSION,
            caption_extension,
        ))
    }

    /// Add every file in `folder` whose extension is listed in `extensions`.
    ///
    /// Entries are processed in name order; subdirectories and other files
    /// are skipped. Stops at the first failing image.
    pub fn add_images_from_folder<S: AsRef<str>>(
        &mut self,
        folder: &Path,
        extensions: &[S],
        include_captions: bool,
    ) -> Result<Vec<String>> {
        info!("Loading images from folder: {:?}", folder);
        if !folder.is_dir() {
            return Err(YaictError::NotFound(format!("Folder {:?} does not exist", folder)));
        }

        let mut files: Vec<PathBuf> = fs::read_dir(folder)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .collect();
        files.sort();

        let mut added_ids = Vec::new();
        for file in files {
            debug!("Processing file: {:?}", file);
            if file.is_file() && has_extension(&file, extensions) {
                let id = self.add_image(&file, include_captions)?;
                debug!("Added image with id: {}", id);
                added_ids.push(id);
            }
        }

        info!("Added {} images", added_ids.len());
        Ok(added_ids)
    }

    /// Write `caption` verbatim to `<id>.txt` next to the image
    pub fn set_caption(&mut self, id: &str, caption: &str) -> Result<()> {
        let path = self
            .registry
            .get(id)
            .map(|record| record.caption_path_with(self.layout.image_dir(), DEFAULT_CAPTION_EXTENSION))
            .ok_or_else(|| unknown_image(id))?;

        fs::write(&path, caption)?;
        self.record_caption(id, DEFAULT_CAPTION_EXTENSION);
        info!("Caption set for image {}: {:?}", id, caption);
        Ok(())
    }

    /// Copy an existing caption file for `id`, keeping the source extension
    pub fn copy_caption_file(&mut self, id: &str, source: &Path) -> Result<()> {
        if !source.is_file() {
            error!("Source file {:?} does not exist.", source);
            return Err(YaictError::NotFound(format!("Source file {:?} does not exist", source)));
        }
        let record = self.registry.get(id).ok_or_else(|| unknown_image(id))?;
        let extension = extension_of(source).ok_or_else(|| {
            YaictError::InvalidState(format!("Caption file {:?} has no extension", source))
        })?;
        if extension.eq_ignore_ascii_case(&record.image_extension)
            || IMAGE_EXTENSIONS.iter().any(|ext| ext.eq_ignore_ascii_case(&extension))
        {
            error!("Refusing caption file {:?} with an image extension", source);
            return Err(YaictError::InvalidState(format!(
                "Caption file {:?} uses image extension {}",
                source, extension
            )));
        }

        let destination = record.caption_path_with(self.layout.image_dir(), &extension);
        if !is_same_file(source, &destination) {
            fs::copy(source, &destination)?;
        }
        self.record_caption(id, &extension);
        info!("Copied caption file to: {:?}", destination);
        Ok(())
    }

    /// Point the record at its new caption file and drop a caption left
    /// behind under a different extension.
    fn record_caption(&mut self, id: &str, extension: &str) {
        let image_dir = self.layout.image_dir().to_path_buf();
        let Some(record) = self.registry.get_mut(id) else {
            return;
        };

        let stale = record
            .caption_extension
            .as_deref()
            .filter(|previous| *previous != extension)
            .map(|previous| record.caption_path_with(&image_dir, previous));
        if let Some(stale) = stale {
            match fs::remove_file(&stale) {
                Ok(()) => debug!("Removed previous caption: {:?}", stale),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove previous caption {:?}: {}", stale, e),
            }
        }

        record.caption_extension = Some(extension.to_string());
    }

    /// Caption text for `id`, `None` when the image has no caption
    pub fn caption(&self, id: &str) -> Result<Option<String>> {
        let record = self.registry.get(id).ok_or_else(|| unknown_image(id))?;
        match record.caption_path(self.layout.image_dir()) {
            Some(path) => Ok(Some(fs::read_to_string(path)?)),
            None => Ok(None),
        }
    }

    // === Lookups ===

    /// All image ids in insertion order
    pub fn all_images(&self) -> Vec<String> {
        self.registry.ids().to_vec()
    }

    /// All records in insertion order
    pub fn records(&self) -> impl Iterator<Item = &ImageRecord> {
        self.registry.iter()
    }

    pub fn info_by_id(&self, id: &str) -> Option<&ImageRecord> {
        self.registry.get(id)
    }

    pub fn image_path(&self, id: &str) -> Option<PathBuf> {
        self.info_by_id(id)
            .map(|record| record.image_path(self.layout.image_dir()))
    }

    /// Like [`image_path`](Self::image_path) but unknown ids are an error
    pub fn image_path_by_id(&self, id: &str) -> Result<PathBuf> {
        self.image_path(id).ok_or_else(|| unknown_image(id))
    }

    pub fn caption_path(&self, id: &str) -> Option<PathBuf> {
        self.info_by_id(id)
            .and_then(|record| record.caption_path(self.layout.image_dir()))
    }

    /// Expected thumbnail location; the file itself is not checked
    pub fn thumbnail_path(&self, id: &str) -> Option<PathBuf> {
        self.info_by_id(id)
            .map(|record| self.layout.thumbnail_dir().join(record.thumbnail_file_name()))
    }

    /// Thumbnail location relative to the dataset root
    pub fn relative_thumbnail_path(&self, id: &str) -> Option<PathBuf> {
        self.info_by_id(id)
            .map(|record| Path::new(layout::THUMBNAIL_DIR).join(record.thumbnail_file_name()))
    }

    /// Thumbnail location, only when the file is actually present
    pub fn thumbnail_path_by_id(&self, id: &str) -> Option<PathBuf> {
        self.thumbnail_path(id).filter(|path| path.is_file())
    }

    pub fn containing_folder(&self, id: &str) -> Option<PathBuf> {
        self.info_by_id(id)
            .map(|record| record.containing_folder(self.layout.image_dir()))
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }
}

fn unknown_image(id: &str) -> YaictError {
    error!("Image {} not found.", id);
    YaictError::NotFound(format!("Image {} not found", id))
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn remove_written(paths: &[PathBuf]) {
    for path in paths.iter().rev() {
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed partial file: {:?}", path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove partial file {:?}: {}", path, e),
        }
    }
}
