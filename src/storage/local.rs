use async_trait::async_trait;
use std::path::PathBuf;

use super::{generate_file_name, AssetBody, AssetCategory, AssetStore, StorageError};

/// URL prefix under which the upload folder is served.
pub const UPLOADS_ROUTE: &str = "/uploads";

/// Writes assets under `{root}/{category}/` and hands back `/uploads/...` paths.
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, location: &str) -> Result<PathBuf, StorageError> {
        let relative = location
            .strip_prefix(UPLOADS_ROUTE)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty() && !rest.contains(".."))
            .ok_or_else(|| StorageError::InvalidLocation(location.to_string()))?;
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn store(
        &self,
        category: AssetCategory,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let file_name = generate_file_name(category, content_type);
        let dir = self.root.join(category.dir());
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&file_name), data).await?;

        Ok(format!("{}/{}/{}", UPLOADS_ROUTE, category.dir(), file_name))
    }

    async fn fetch(&self, location: &str) -> Result<AssetBody, StorageError> {
        let path = self.resolve(location)?;
        let data = tokio::fs::read(&path).await?;
        let content_type = mime_guess::from_path(&path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(AssetBody::Bytes { content_type, data })
    }
}
