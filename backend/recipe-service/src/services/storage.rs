/// Media storage for uploaded post images
use crate::error::{AppError, Result};
use image::ImageFormat;
use mime::Mime;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Largest accepted image upload (5 MiB).
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted image subtypes (of the `image/*` type).
const ALLOWED_SUBTYPES: &[&str] = &["jpeg", "png", "webp"];

/// Stores uploaded images under a configured root directory, keyed by
/// UUID. Keys are opaque to callers and recorded on the post row.
#[derive(Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Validate and persist image bytes; returns the storage key.
    ///
    /// The declared content type must be allow-listed and must agree with
    /// the sniffed magic bytes, so a renamed file cannot smuggle another
    /// format through.
    pub async fn save_image(&self, bytes: &[u8], content_type: &str) -> Result<String> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("Empty upload".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::BadRequest(format!(
                "Image exceeds maximum size of {} bytes",
                MAX_IMAGE_BYTES
            )));
        }
        let declared: Mime = content_type
            .parse()
            .map_err(|_| AppError::BadRequest("Invalid content type".to_string()))?;
        if declared.type_() != mime::IMAGE
            || !ALLOWED_SUBTYPES.contains(&declared.subtype().as_str())
        {
            return Err(AppError::BadRequest(format!(
                "Unsupported content type: {}",
                content_type
            )));
        }

        let format = image::guess_format(bytes)
            .map_err(|_| AppError::BadRequest("Unrecognized image data".to_string()))?;
        let (subtype, extension) = match format {
            ImageFormat::Jpeg => ("jpeg", "jpg"),
            ImageFormat::Png => ("png", "png"),
            ImageFormat::WebP => ("webp", "webp"),
            _ => {
                return Err(AppError::BadRequest(
                    "Unsupported image format".to_string(),
                ))
            }
        };
        if declared.subtype().as_str() != subtype {
            return Err(AppError::BadRequest(
                "Content type does not match image data".to_string(),
            ));
        }

        let key = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create media directory: {}", e)))?;
        tokio::fs::write(self.path_for(&key), bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write image: {}", e)))?;

        Ok(key)
    }

    /// Best-effort removal of a stored image (post deleted or replaced).
    pub async fn remove(&self, key: &str) {
        if let Err(e) = tokio::fs::remove_file(self.path_for(key)).await {
            tracing::warn!(key, error = %e, "failed to remove stored image");
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are generated UUID.ext strings; strip any path components
        // from untrusted input anyway.
        let file_name = Path::new(key)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        self.root.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn png_bytes() -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.extend_from_slice(&[0u8; 64]);
        bytes
    }

    #[tokio::test]
    async fn test_save_and_remove_image() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        let key = storage.save_image(&png_bytes(), "image/png").await.unwrap();
        assert!(key.ends_with(".png"));
        assert!(dir.path().join(&key).exists());

        storage.remove(&key).await;
        assert!(!dir.path().join(&key).exists());
    }

    #[tokio::test]
    async fn test_rejects_disallowed_content_type() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        let err = storage.save_image(&png_bytes(), "image/gif").await;
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_rejects_mismatched_content_type() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        // PNG bytes declared as JPEG
        let err = storage.save_image(&png_bytes(), "image/jpeg").await;
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_rejects_garbage_bytes() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        let err = storage.save_image(b"definitely not an image", "image/png").await;
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_rejects_oversized_upload() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());

        let mut bytes = png_bytes();
        bytes.resize(MAX_IMAGE_BYTES + 1, 0);
        let err = storage.save_image(&bytes, "image/png").await;
        assert!(matches!(err, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_path_traversal_is_neutralized() {
        let dir = tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        // remove() on a hostile key must not escape the media root
        storage.remove("../../etc/passwd").await;
        assert!(dir.path().exists());
    }
}
