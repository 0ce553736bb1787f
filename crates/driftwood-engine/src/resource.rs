//! Inbound resources: map and entity descriptors, spritesheet images.
//!
//! The engine only needs parsed JSON and image dimensions. Hosts either
//! serve them from memory ([`MemoryResources`]) or from a directory tree
//! ([`DirectoryResources`]), or implement [`ResourceLoader`] themselves.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

/// Pixel size of an image resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
}

/// Errors produced while fetching resources.
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("resource '{path}' not found")]
    NotFound { path: String },

    #[error("failed to read resource '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("resource '{path}' is not valid JSON: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("resource '{path}' is not a readable image: {source}")]
    Image {
        path: String,
        #[source]
        source: image::ImageError,
    },
}

/// Source of descriptors and images.
pub trait ResourceLoader {
    fn request_json(&mut self, path: &str) -> Result<Value, ResourceError>;
    fn request_image(&mut self, path: &str) -> Result<ImageInfo, ResourceError>;
}

// ---------------------------------------------------------------------------
// MemoryResources
// ---------------------------------------------------------------------------

/// Resources held in memory, keyed by path.
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    json: HashMap<String, Value>,
    images: HashMap<String, ImageInfo>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_json(&mut self, path: impl Into<String>, value: Value) {
        self.json.insert(path.into(), value);
    }

    pub fn insert_image(&mut self, path: impl Into<String>, width: u32, height: u32) {
        self.images.insert(path.into(), ImageInfo { width, height });
    }

    pub fn with_json(mut self, path: impl Into<String>, value: Value) -> Self {
        self.insert_json(path, value);
        self
    }

    pub fn with_image(mut self, path: impl Into<String>, width: u32, height: u32) -> Self {
        self.insert_image(path, width, height);
        self
    }
}

impl ResourceLoader for MemoryResources {
    fn request_json(&mut self, path: &str) -> Result<Value, ResourceError> {
        self.json.get(path).cloned().ok_or_else(|| ResourceError::NotFound {
            path: path.to_owned(),
        })
    }

    fn request_image(&mut self, path: &str) -> Result<ImageInfo, ResourceError> {
        self.images.get(path).copied().ok_or_else(|| ResourceError::NotFound {
            path: path.to_owned(),
        })
    }
}

// ---------------------------------------------------------------------------
// DirectoryResources
// ---------------------------------------------------------------------------

/// Resources read from files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, ResourceError> {
        let full = self.root.join(path);
        if !full.is_file() {
            return Err(ResourceError::NotFound {
                path: path.to_owned(),
            });
        }
        Ok(full)
    }
}

impl ResourceLoader for DirectoryResources {
    fn request_json(&mut self, path: &str) -> Result<Value, ResourceError> {
        let full = self.resolve(path)?;
        let bytes = std::fs::read(&full).map_err(|source| ResourceError::Io {
            path: path.to_owned(),
            source,
        })?;
        debug!(path, bytes = bytes.len(), "loaded json resource");
        serde_json::from_slice(&bytes).map_err(|source| ResourceError::Json {
            path: path.to_owned(),
            source,
        })
    }

    fn request_image(&mut self, path: &str) -> Result<ImageInfo, ResourceError> {
        let full = self.resolve(path)?;
        let (width, height) =
            image::image_dimensions(&full).map_err(|source| ResourceError::Image {
                path: path.to_owned(),
                source,
            })?;
        debug!(path, width, height, "loaded image resource");
        Ok(ImageInfo { width, height })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
