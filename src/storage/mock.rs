use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{extension_of, validate, FileStorage, UploadError, UploadRequest};
use crate::entities::PostFile;

/// keeps uploaded blobs in memory. urls use the `memory://` scheme.
#[derive(Default)]
pub struct InMemoryFileStorage {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl InMemoryFileStorage {
    pub fn new() -> Self { Self::default() }

    pub async fn len(&self) -> usize { self.files.lock().await.len() }
}

#[async_trait]
impl FileStorage for InMemoryFileStorage {
    async fn upload_public_file(&self, req: UploadRequest) -> Result<PostFile, UploadError> {
        validate(&req)?;

        let key = format!(
            "{}.{}",
            Uuid::new_v4(),
            extension_of(&req.file.content_type)
        );
        tracing::trace!("storing {} (quality: {})", key, req.quality);

        self.files.lock().await.push((key.clone(), req.file.bytes));

        Ok(PostFile {
            url: format!("memory://{}", key),
            key,
        })
    }
}
