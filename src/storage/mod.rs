// Image bucket backed by the local filesystem. Objects are written
// under `<root>/posts/` and served back over HTTP at `/images/...`, so
// the URL stored on a post keeps working from any device on the LAN.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::journal::model::{Author, NewImage};

/// Prefix inside the bucket for post photos.
const POSTS_PREFIX: &str = "posts";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Unsupported image type: .{0}")]
    UnsupportedType(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write side of the image bucket. Deletion is deliberately absent:
/// replaced and removed images keep their objects, only the post's
/// reference changes.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores one image and returns the public URL path to reach it.
    async fn store(&self, author: Author, image: &NewImage) -> Result<String, StorageError>;
}

pub struct FsImageStore {
    root: PathBuf,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Whether an extension names an image format. The bucket only takes
/// images; the upload route uses the same check to reject early.
pub fn is_image_ext(ext: &str) -> bool {
    mime_guess::from_ext(ext).first_or_octet_stream().type_() == mime_guess::mime::IMAGE
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn store(&self, author: Author, image: &NewImage) -> Result<String, StorageError> {
        if !is_image_ext(&image.ext) {
            return Err(StorageError::UnsupportedType(image.ext.clone()));
        }

        let name = object_name(author, chrono::Utc::now().timestamp_millis(), &image.ext);
        let dir = self.root.join(POSTS_PREFIX);
        tokio::fs::create_dir_all(&dir).await?;
        tokio::fs::write(dir.join(&name), image.data.as_ref()).await?;

        Ok(format!("/images/{POSTS_PREFIX}/{name}"))
    }
}

/// Object names carry the author and upload instant so two uploads
/// never collide and old objects are never overwritten.
fn object_name(author: Author, unix_millis: i64, ext: &str) -> String {
    format!("{}_{}.{}", author.as_str(), unix_millis, ext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn jpeg(data: &'static [u8]) -> NewImage {
        NewImage { data: Bytes::from_static(data), ext: "jpg".to_string() }
    }

    #[test]
    fn test_image_ext_check() {
        assert!(is_image_ext("jpg"));
        assert!(is_image_ext("png"));
        assert!(!is_image_ext("txt"));
        assert!(!is_image_ext(""));
    }

    #[test]
    fn test_object_name_format() {
        assert_eq!(
            object_name(Author::Father, 1_717_200_000_123, "jpg"),
            "father_1717200000123.jpg"
        );
        assert_eq!(object_name(Author::Mother, 7, "png"), "mother_7.png");
    }

    #[tokio::test]
    async fn test_store_writes_object_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path());

        let url = store.store(Author::Father, &jpeg(b"pretend jpeg")).await.unwrap();

        assert!(url.starts_with("/images/posts/father_"));
        assert!(url.ends_with(".jpg"));

        // The URL path maps straight onto a file under the bucket root.
        let relative = url.strip_prefix("/images/").unwrap();
        let stored = std::fs::read(dir.path().join(relative)).unwrap();
        assert_eq!(stored, b"pretend jpeg");
    }

    #[tokio::test]
    async fn test_store_rejects_non_image_extension() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path());

        let file = NewImage { data: Bytes::from_static(b"#!/bin/sh"), ext: "sh".to_string() };
        let err = store.store(Author::Mother, &file).await.unwrap_err();

        assert!(matches!(err, StorageError::UnsupportedType(ext) if ext == "sh"));
    }

    #[tokio::test]
    async fn test_store_accepts_common_phone_formats() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsImageStore::new(dir.path());

        for ext in ["jpg", "jpeg", "png", "gif", "webp"] {
            let image = NewImage { data: Bytes::from_static(b"img"), ext: ext.to_string() };
            store.store(Author::Father, &image).await.unwrap();
        }
    }
}
