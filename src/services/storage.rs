use anyhow::Context;
use async_trait::async_trait;
use std::path::PathBuf;

use super::BlobStorage;

/// Pictures kept in an S3 bucket
#[derive(Clone)]
pub struct StorageHandler {
    pub client: aws_sdk_s3::Client,
    pub bucket: String,
    pub region: String,
}

impl StorageHandler {
    pub fn object_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{key}",
            self.bucket, self.region
        )
    }
}

#[async_trait]
impl BlobStorage for StorageHandler {
    async fn upload(&self, path: &str, body: Vec<u8>) -> anyhow::Result<String> {
        let body = aws_sdk_s3::primitives::ByteStream::from(body);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(path)
            .body(body)
            .send()
            .await?;

        Ok(self.object_url(path))
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(path)
            .send()
            .await?;

        Ok(())
    }
}

/// Pictures kept under a local directory, for development
#[derive(Clone, Debug)]
pub struct LocalStorageHandler {
    pub root: PathBuf,
    pub public_base_url: String,
}

impl LocalStorageHandler {
    fn resolve(&self, path: &str) -> anyhow::Result<PathBuf> {
        if path.split('/').any(|part| part == "..") {
            anyhow::bail!("blob path {path} escapes the storage directory");
        }

        Ok(self.root.join(path.trim_start_matches('/')))
    }
}

#[async_trait]
impl BlobStorage for LocalStorageHandler {
    async fn upload(&self, path: &str, body: Vec<u8>) -> anyhow::Result<String> {
        let target = self.resolve(path)?;
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        tokio::fs::write(&target, body)
            .await
            .with_context(|| format!("failed to write blob {}", target.display()))?;

        Ok(format!(
            "{}/{}",
            self.public_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }

    async fn delete(&self, path: &str) -> anyhow::Result<()> {
        match tokio::fs::remove_file(self.resolve(path)?).await {
            Err(err) if err.kind() != std::io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}
