//! Read-only access to the icon and font files used by the payment QR.
//!
//! A missing or unreadable asset is never fatal: it is logged and the
//! caller renders without it.

use ab_glyph::FontVec;
use image::DynamicImage;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn image(&self, name: &str) -> Option<DynamicImage> {
        let path = self.root.join(name);
        match image::open(&path) {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::warn!(asset = %path.display(), "⚠ Asset missing, skipping: {}", e);
                None
            }
        }
    }

    pub fn font(&self, name: &str) -> Option<FontVec> {
        let path = self.root.join(name);
        let bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(asset = %path.display(), "⚠ Font missing, text will be skipped: {}", e);
                return None;
            }
        };
        match FontVec::try_from_vec(bytes) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::warn!(asset = %path.display(), "⚠ Font unreadable, text will be skipped: {}", e);
                None
            }
        }
    }
}
