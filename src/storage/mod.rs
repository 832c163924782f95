mod local;
mod s3;

pub use local::{LocalAssetStore, UPLOADS_ROUTE};
pub use s3::S3AssetStore;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetCategory {
    Photo,
    QrCode,
    Pdf,
}

impl AssetCategory {
    /// Directory name (local) or key prefix (object storage).
    pub fn dir(self) -> &'static str {
        match self {
            AssetCategory::Photo => "photos",
            AssetCategory::QrCode => "qrcodes",
            AssetCategory::Pdf => "pdfs",
        }
    }

    fn file_prefix(self) -> &'static str {
        match self {
            AssetCategory::Photo => "photo",
            AssetCategory::QrCode => "qrcode",
            AssetCategory::Pdf => "noc",
        }
    }

    pub const ALL: [AssetCategory; 3] =
        [AssetCategory::Photo, AssetCategory::QrCode, AssetCategory::Pdf];
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("asset I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("object storage request failed: {0}")]
    Remote(String),
    #[error("invalid asset location '{0}'")]
    InvalidLocation(String),
}

/// What the retrieval routes send back for a stored asset.
#[derive(Debug, PartialEq, Eq)]
pub enum AssetBody {
    Bytes { content_type: String, data: Vec<u8> },
    Redirect(String),
}

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Persist `data` under `category` with a fresh unique name and return its location.
    async fn store(
        &self,
        category: AssetCategory,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    /// Resolve a location previously returned by [`AssetStore::store`] for serving.
    async fn fetch(&self, location: &str) -> Result<AssetBody, StorageError>;
}

pub fn generate_file_name(category: AssetCategory, content_type: &str) -> String {
    let ext = mime_guess::get_mime_extensions_str(content_type)
        .and_then(preferred_extension)
        .unwrap_or("bin");
    format!("{}-{}.{}", category.file_prefix(), Uuid::new_v4(), ext)
}

// mime_guess lists "jpe" before "jpg" for image/jpeg.
fn preferred_extension(exts: &'static [&'static str]) -> Option<&'static str> {
    ["jpg", "png", "pdf", "webp", "gif"]
        .into_iter()
        .find(|e| exts.contains(e))
        .or_else(|| exts.first().copied())
}

pub fn ensure_dirs(upload_folder: &Path) -> std::io::Result<()> {
    for category in AssetCategory::ALL {
        std::fs::create_dir_all(upload_folder.join(category.dir()))?;
    }
    Ok(())
}
