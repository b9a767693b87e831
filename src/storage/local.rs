use std::path::PathBuf;

use anyhow::anyhow;
use async_trait::async_trait;
use uuid::Uuid;

use super::{extension_of, validate, FileStorage, UploadError, UploadRequest};
use crate::entities::PostFile;

/// writes uploads under `dir`, served from `public_base`.
pub struct LocalFileStorage {
    dir: PathBuf,
    public_base: String,
}

impl LocalFileStorage {
    pub async fn new_with(
        dir: impl Into<PathBuf>,
        public_base: impl AsRef<str>,
    ) -> ::anyhow::Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        Ok(Self {
            dir,
            public_base: public_base.as_ref().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    #[tracing::instrument(skip(self))]
    async fn upload_public_file(&self, req: UploadRequest) -> Result<PostFile, UploadError> {
        validate(&req)?;

        let key = format!(
            "{}.{}",
            Uuid::new_v4(),
            extension_of(&req.file.content_type)
        );
        let path = self.dir.join(&key);

        tokio::fs::write(&path, &req.file.bytes)
            .await
            .map_err(|e| UploadError::Storage(anyhow!("cannot write {}: {}", path.display(), e)))?;

        Ok(PostFile {
            url: format!("{}/{}", self.public_base, key),
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::{FileKind, Upload};
    use super::*;

    #[tokio::test]
    async fn writes_file_and_builds_url() {
        let dir = ::std::env::temp_dir().join(format!("snapfeed-test-{}", Uuid::new_v4()));
        let storage = LocalFileStorage::new_with(&dir, "http://localhost/files/")
            .await
            .unwrap();

        let file = storage
            .upload_public_file(UploadRequest {
                file: Upload {
                    name: "cat.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![1, 2, 3],
                },
                quality: 95,
                image_max_size_mb: 20,
                kind: FileKind::Image,
            })
            .await
            .unwrap();

        assert!(file.key.ends_with(".png"));
        assert_eq!(file.url, format!("http://localhost/files/{}", file.key));
        assert_eq!(tokio::fs::read(dir.join(&file.key)).await.unwrap(), vec![1, 2, 3]);

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
