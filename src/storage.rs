use std::path::{Path, PathBuf};

use tokio::fs;
use uuid::Uuid;

use crate::error::{AppError, AppResult};

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "gif"];

/// Uploaded images on local disk, addressed by `<uuid>.<ext>` ids.
#[derive(Debug, Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes the image and returns its id. The extension is taken from the
    /// original file name when it is an image one, otherwise from the
    /// content type.
    pub async fn save(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> AppResult<String> {
        if bytes.is_empty() {
            return Err(AppError::BadRequest("empty image upload".into()));
        }
        let ext = file_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .or_else(|| content_type.and_then(extension_for).map(str::to_string))
            .ok_or_else(|| AppError::BadRequest("unsupported image type".into()))?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        let id = format!("{}.{}", Uuid::new_v4(), ext);
        fs::write(self.root.join(&id), bytes)
            .await
            .map_err(|e| AppError::Internal(e.into()))?;

        tracing::debug!(image_id = %id, size = bytes.len(), "image stored");
        Ok(id)
    }

    /// Reads an image back with its content type.
    pub async fn load(&self, id: &str) -> AppResult<(Vec<u8>, &'static str)> {
        let content_type = parse_image_id(id).ok_or(AppError::NotFound)?;
        match fs::read(self.root.join(id)).await {
            Ok(bytes) => Ok((bytes, content_type)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(AppError::NotFound),
            Err(err) => Err(AppError::Internal(err.into())),
        }
    }
}

/// Accepts only ids this store generated, which also rules out path traversal.
fn parse_image_id(id: &str) -> Option<&'static str> {
    let (stem, ext) = id.rsplit_once('.')?;
    Uuid::parse_str(stem).ok()?;
    content_type_for(ext)
}

fn content_type_for(ext: &str) -> Option<&'static str> {
    match ext {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_and_reads_back_images() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let id = store
            .save(Some("gloves.PNG"), None, b"\x89PNG fake")
            .await
            .unwrap();
        assert!(id.ends_with(".png"));

        let (bytes, content_type) = store.load(&id).await.unwrap();
        assert_eq!(bytes, b"\x89PNG fake");
        assert_eq!(content_type, "image/png");
    }

    #[tokio::test]
    async fn rejects_foreign_ids_and_types() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        assert!(matches!(
            store.load("../secret.png").await,
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            store.save(Some("notes.txt"), Some("text/plain"), b"hi").await,
            Err(AppError::BadRequest(_))
        ));
        let id = store.save(None, Some("image/webp"), b"RIFF").await.unwrap();
        assert!(id.ends_with(".webp"));
    }

    #[tokio::test]
    async fn odd_file_extension_falls_back_to_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let store = ImageStore::new(dir.path());

        let id = store
            .save(Some("photo.bin"), Some("image/png"), b"\x89PNG fake")
            .await
            .unwrap();
        assert!(id.ends_with(".png"));
        assert!(matches!(
            store.save(Some("photo.bin"), None, b"data").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
