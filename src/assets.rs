//! Read-only reference assets injected into the split engine
//!
//! Some bundles need images that are not in the source sheet at all, such as
//! the held-item sprites appended to firearm bundles. They come from an
//! [`AssetProvider`] so the engine never touches fixed paths.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::error::Result;
use crate::output::load_png;

/// Source of named reference images.
pub trait AssetProvider {
    /// Load the image called `name`, or `None` if this provider does not have it.
    fn load(&self, name: &str) -> Result<Option<RgbaImage>>;
}

/// Provider with no assets.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAssets;

impl AssetProvider for NoAssets {
    fn load(&self, _name: &str) -> Result<Option<RgbaImage>> {
        Ok(None)
    }
}

/// Reads `<dir>/<name>.png`.
#[derive(Debug, Clone)]
pub struct DirAssetProvider {
    dir: PathBuf,
}

impl DirAssetProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl AssetProvider for DirAssetProvider {
    fn load(&self, name: &str) -> Result<Option<RgbaImage>> {
        let path = self.dir.join(format!("{}.png", name));
        if !path.is_file() {
            return Ok(None);
        }
        load_png(&path).map(Some)
    }
}

/// In-memory provider, mostly for tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryAssets {
    images: HashMap<String, RgbaImage>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, image: RgbaImage) -> Self {
        self.images.insert(name.into(), image);
        self
    }
}

impl AssetProvider for MemoryAssets {
    fn load(&self, name: &str) -> Result<Option<RgbaImage>> {
        Ok(self.images.get(name).cloned())
    }
}
