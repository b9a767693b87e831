use async_trait::async_trait;

use crate::entities::PostFile;

pub mod local;
pub mod mock;

#[async_trait]
pub trait FileStorage {
    async fn upload_public_file(&self, req: UploadRequest) -> Result<PostFile, UploadError>;
}

pub struct Upload {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ::std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        f.debug_struct("Upload")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug)]
pub struct UploadRequest {
    pub file: Upload,
    pub quality: u8,
    pub image_max_size_mb: u32,
    pub kind: FileKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Image,
}

#[derive(Debug)]
pub enum UploadError {
    Empty,
    TooLarge { size: usize, max: usize },
    UnsupportedType(String),
    Storage(anyhow::Error),
}

impl ::std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
        match self {
            UploadError::Empty => write!(f, "uploaded file is empty."),
            UploadError::TooLarge { size, max } =>
                write!(f, "uploaded file is too large. ({} > {} bytes)", size, max),
            UploadError::UnsupportedType(t) => write!(f, "unsupported file type: {}", t),
            UploadError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl ::std::error::Error for UploadError {}

const MIB: usize = 1024 * 1024;

/// checks every backend applies before storing anything.
pub fn validate(req: &UploadRequest) -> Result<(), UploadError> {
    let size = req.file.bytes.len();
    let max = req.image_max_size_mb as usize * MIB;

    if size == 0 {
        return Err(UploadError::Empty);
    }
    if size > max {
        return Err(UploadError::TooLarge { size, max });
    }

    match req.kind {
        FileKind::Image if !req.file.content_type.starts_with("image/") =>
            Err(UploadError::UnsupportedType(req.file.content_type.clone())),
        FileKind::Image => Ok(()),
    }
}

/// extension used for the stored object.
pub fn extension_of(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// inverse of [`extension_of`] for files read from disk.
pub fn content_type_of(path: &str) -> &'static str {
    let ext = path
        .rsplit('.')
        .next()
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(content_type: &str, len: usize) -> UploadRequest {
        UploadRequest {
            file: Upload {
                name: "a".to_string(),
                content_type: content_type.to_string(),
                bytes: vec![0; len],
            },
            quality: 95,
            image_max_size_mb: 1,
            kind: FileKind::Image,
        }
    }

    #[test]
    fn validate_limits() {
        assert!(validate(&request("image/png", 10)).is_ok());
        assert!(validate(&request("image/png", MIB)).is_ok());
        assert!(matches!(
            validate(&request("image/png", MIB + 1)),
            Err(UploadError::TooLarge { .. })
        ));
        assert!(matches!(
            validate(&request("text/plain", 10)),
            Err(UploadError::UnsupportedType(_))
        ));
        assert!(matches!(
            validate(&request("image/png", 0)),
            Err(UploadError::Empty)
        ));
    }

    #[test]
    fn content_type_from_path() {
        assert_eq!(content_type_of("cat.JPG"), "image/jpeg");
        assert_eq!(content_type_of("dir/cat.png"), "image/png");
        assert_eq!(content_type_of("notes"), "application/octet-stream");
        assert_eq!(extension_of(content_type_of("x.webp")), "webp");
    }
}
