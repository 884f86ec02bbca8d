//! Uploaded recipe images on the local filesystem.
//!
//! Files live under the configured media root at
//! `uploads/recipe/<uuid>.<ext>`; the database keeps only that relative path.

use std::path::{Component, Path, PathBuf};

use recipebox_api::ApiError;
use uuid::Uuid;

use crate::config::MediaConfig;

const RECIPE_IMAGE_DIR: &str = "uploads/recipe";

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("The submitted file is empty.")]
    Empty,
    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    UnsupportedFormat,
    #[error("Image exceeds the {limit} byte limit.")]
    TooLarge { limit: usize },
    #[error("media I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Empty | MediaError::UnsupportedFormat => {
                ApiError::field("image", err.to_string())
            }
            MediaError::TooLarge { .. } => ApiError::payload_too_large(err.to_string()),
            MediaError::Io(ref io) => {
                tracing::error!(error = %io, "Failed to write media file");
                ApiError::internal(err.to_string())
            }
        }
    }
}

/// Formats accepted for recipe images, recognized by their magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Some(Self::Jpeg)
        } else if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
            Some(Self::Gif)
        } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
            Some(Self::Webp)
        } else {
            None
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    url_prefix: String,
    max_image_bytes: usize,
}

impl MediaStore {
    pub fn new(cfg: &MediaConfig) -> Self {
        Self {
            root: cfg.root.clone(),
            url_prefix: cfg.url_prefix.trim_end_matches('/').to_string(),
            max_image_bytes: cfg.max_image_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL of a stored file.
    pub fn url_for(&self, relative: &str) -> String {
        format!("{}/{}", self.url_prefix, relative)
    }

    /// Validates and writes a recipe image, returning its relative path.
    pub async fn store_recipe_image(&self, bytes: &[u8]) -> Result<String, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::Empty);
        }
        if bytes.len() > self.max_image_bytes {
            return Err(MediaError::TooLarge {
                limit: self.max_image_bytes,
            });
        }
        let format = ImageFormat::sniff(bytes).ok_or(MediaError::UnsupportedFormat)?;

        let relative = format!("{RECIPE_IMAGE_DIR}/{}.{}", Uuid::new_v4(), format.extension());
        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(path = %relative, size = bytes.len(), "Stored recipe image");
        Ok(relative)
    }

    /// Deletes a stored file. Missing files are ignored; other failures are logged.
    pub async fn remove(&self, relative: &str) {
        let Some(path) = self.resolve(relative) else {
            tracing::warn!(path = %relative, "Refusing to remove media outside the media root");
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::debug!(path = %relative, "Removed media file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %relative, error = %e, "Failed to remove media file"),
        }
    }

    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let relative = Path::new(relative);
        relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
            .then(|| self.root.join(relative))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn store(root: &Path) -> MediaStore {
        MediaStore::new(&MediaConfig {
            root: root.to_path_buf(),
            url_prefix: "/media".into(),
            max_image_bytes: 64,
        })
    }

    #[test]
    fn sniffs_known_formats() {
        assert_eq!(ImageFormat::sniff(PNG), Some(ImageFormat::Png));
        assert_eq!(
            ImageFormat::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::sniff(b"GIF89a...."), Some(ImageFormat::Gif));
        assert_eq!(
            ImageFormat::sniff(b"RIFF\0\0\0\0WEBPVP8 "),
            Some(ImageFormat::Webp)
        );
        assert_eq!(ImageFormat::sniff(b"notimage"), None);
    }

    #[tokio::test]
    async fn stores_and_removes_images() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(dir.path());

        let relative = media.store_recipe_image(PNG).await.unwrap();
        assert!(relative.starts_with("uploads/recipe/"));
        assert!(relative.ends_with(".png"));
        assert!(dir.path().join(&relative).exists());
        assert_eq!(media.url_for(&relative), format!("/media/{relative}"));

        media.remove(&relative).await;
        assert!(!dir.path().join(&relative).exists());
        // Second removal is a no-op.
        media.remove(&relative).await;
    }

    #[tokio::test]
    async fn rejects_bad_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let media = store(dir.path());

        assert!(matches!(
            media.store_recipe_image(b"").await,
            Err(MediaError::Empty)
        ));
        assert!(matches!(
            media.store_recipe_image(b"plain text").await,
            Err(MediaError::UnsupportedFormat)
        ));
        assert!(matches!(
            media.store_recipe_image(&[0u8; 65]).await,
            Err(MediaError::TooLarge { limit: 64 })
        ));
    }

    #[test]
    fn resolve_stays_inside_root() {
        let media = store(Path::new("/srv/media"));
        assert!(media.resolve("uploads/recipe/a.png").is_some());
        assert!(media.resolve("../etc/passwd").is_none());
        assert!(media.resolve("/etc/passwd").is_none());
    }
}
