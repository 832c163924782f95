use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{error::DisplayErrorContext, primitives::ByteStream, Client};

use super::{generate_file_name, AssetBody, AssetCategory, AssetStore, StorageError};

/// Uploads assets to a bucket under `{category}/` keys and hands back public URLs.
/// Retrieval redirects clients to the object instead of proxying it.
pub struct S3AssetStore {
    client: Client,
    bucket: String,
    public_base: String,
}

impl S3AssetStore {
    pub async fn from_env(bucket: String, region: String, public_url: Option<String>) -> Self {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .load()
            .await;
        Self::new(Client::new(&sdk_config), bucket, &region, public_url)
    }

    pub fn new(client: Client, bucket: String, region: &str, public_url: Option<String>) -> Self {
        let public_base = public_url
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| default_public_base(&bucket, region));
        Self {
            client,
            bucket,
            public_base,
        }
    }

    fn key_for(&self, location: &str) -> Result<String, StorageError> {
        location
            .strip_prefix(&self.public_base)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or_else(|| StorageError::InvalidLocation(location.to_string()))
    }
}

fn default_public_base(bucket: &str, region: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com", bucket, region)
}

#[async_trait]
impl AssetStore for S3AssetStore {
    async fn store(
        &self,
        category: AssetCategory,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = format!("{}/{}", category.dir(), generate_file_name(category, content_type));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StorageError::Remote(DisplayErrorContext(e).to_string()))?;

        tracing::debug!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(format!("{}/{}", self.public_base, key))
    }

    async fn fetch(&self, location: &str) -> Result<AssetBody, StorageError> {
        self.key_for(location)?;
        Ok(AssetBody::Redirect(location.to_string()))
    }
}
