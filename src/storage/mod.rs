//! Image store for uploaded story assets
//! Uses Apache Arrow object_store crate
//!
//! Images are stored flat under generated names and addressed by the public
//! path `/uploads/{name}`, which is what the catalog and queue persist.

use base64::Engine;
use bytes::Bytes;
use object_store::{ObjectStore, local::LocalFileSystem, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// Public path prefix of stored images
pub const PUBLIC_PREFIX: &str = "/uploads/";

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Image is {size} bytes, limit is {limit}")]
    TooLarge { size: u64, limit: u64 },

    #[error("Invalid data URL")]
    InvalidDataUrl,

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Not a stored image: {0}")]
    NotStored(String),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// A freshly stored image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    /// `/uploads/{name}`
    pub url: String,
    pub size: usize,
}

/// Image store wrapping object_store
#[derive(Clone)]
pub struct ImageStore {
    store: Arc<dyn ObjectStore>,
    http: reqwest::Client,
    max_bytes: u64,
}

impl ImageStore {
    /// Create with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>, max_bytes: u64) -> Self {
        Self {
            store,
            http: reqwest::Client::new(),
            max_bytes,
        }
    }

    /// Local directory backend (created when missing)
    pub fn local(dir: &Path, max_bytes: u64) -> Result<Self> {
        std::fs::create_dir_all(dir)?;
        let store = LocalFileSystem::new_with_prefix(dir)?;
        Ok(Self::new(Arc::new(store), max_bytes))
    }

    /// Create in-memory storage for testing/development
    pub fn in_memory(max_bytes: u64) -> Self {
        Self::new(Arc::new(object_store::memory::InMemory::new()), max_bytes)
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    fn check_size(&self, size: usize) -> Result<()> {
        let size = size as u64;
        if size > self.max_bytes {
            return Err(StorageError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }

    /// Store raw image bytes; the extension follows the content type
    pub async fn put(&self, data: Bytes, content_type: Option<&str>) -> Result<StoredImage> {
        self.check_size(data.len())?;

        let name = generate_name(extension_for(content_type));
        let size = data.len();
        self.store
            .put(&StoragePath::from(name.as_str()), data.into())
            .await?;

        tracing::info!(name = %name, size, "Stored image");

        Ok(StoredImage {
            url: format!("{}{}", PUBLIC_PREFIX, name),
            size,
        })
    }

    /// Store a `data:{mime};base64,{payload}` URL
    pub async fn put_data_url(&self, data_url: &str) -> Result<StoredImage> {
        let (content_type, payload) = parse_data_url(data_url)?;
        let data = base64::engine::general_purpose::STANDARD
            .decode(payload)
            .map_err(|_| StorageError::InvalidDataUrl)?;
        self.put(Bytes::from(data), Some(content_type)).await
    }

    /// Download a remote image and store it
    pub async fn fetch_and_put(&self, url: &str) -> Result<StoredImage> {
        let response = self
            .http
            .get(url)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| StorageError::DownloadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::DownloadFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(StorageError::TooLarge {
                    size: length,
                    limit: self.max_bytes,
                });
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let data = response
            .bytes()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("Failed to read body: {}", e)))?;

        self.put(data, content_type.as_deref()).await
    }

    /// Remove a stored image; failures are logged, never returned
    ///
    /// URLs outside `/uploads/` (remote images) are left alone.
    pub async fn delete_best_effort(&self, url: &str) {
        let Some(name) = stored_name(url) else {
            return;
        };

        match self.store.delete(&StoragePath::from(name)).await {
            Ok(()) => tracing::debug!(url, "Deleted stored image"),
            Err(e) => tracing::warn!(url, error = %e, "Failed to delete stored image"),
        }
    }

    /// Absolute URL for handing a stored image to the platform
    pub fn public_url(stored: &str, base_url: &str) -> String {
        if stored.starts_with('/') {
            format!("{}{}", base_url.trim_end_matches('/'), stored)
        } else {
            stored.to_string()
        }
    }
}

/// Map a content type to the stored file extension: png, webp, otherwise jpg
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let subtype = content_type
        .and_then(|raw| raw.parse::<mime::Mime>().ok())
        .map(|media_type| media_type.subtype().as_str().to_ascii_lowercase());

    match subtype.as_deref() {
        Some("png") => "png",
        Some("webp") => "webp",
        _ => "jpg",
    }
}

fn generate_name(extension: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{}-{}.{}", millis, Uuid::new_v4().simple(), extension)
}

/// Flat object name behind a `/uploads/` URL
fn stored_name(url: &str) -> Option<&str> {
    let name = url.strip_prefix(PUBLIC_PREFIX)?;
    if name.is_empty() || name.contains('/') || name.contains("..") {
        return None;
    }
    Some(name)
}

fn parse_data_url(data_url: &str) -> Result<(&str, &str)> {
    let rest = data_url
        .strip_prefix("data:")
        .ok_or(StorageError::InvalidDataUrl)?;
    let (content_type, payload) = rest
        .split_once(";base64,")
        .ok_or(StorageError::InvalidDataUrl)?;
    if content_type.is_empty() || payload.is_empty() {
        return Err(StorageError::InvalidDataUrl);
    }
    Ok((content_type, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn read(store: &ImageStore, url: &str) -> object_store::Result<Bytes> {
        let name = stored_name(url).unwrap();
        store.store.get(&StoragePath::from(name)).await?.bytes().await
    }

    #[test]
    fn test_extension_for() {
        assert_eq!(extension_for(Some("image/png")), "png");
        assert_eq!(extension_for(Some("image/webp")), "webp");
        assert_eq!(extension_for(Some("image/jpeg")), "jpg");
        assert_eq!(extension_for(Some("image/gif")), "jpg");
        assert_eq!(extension_for(None), "jpg");
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            ImageStore::public_url("/uploads/a.jpg", "https://studio.example.com/"),
            "https://studio.example.com/uploads/a.jpg"
        );
        assert_eq!(
            ImageStore::public_url("https://cdn.example.com/a.jpg", "https://studio.example.com"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn test_stored_name_rejects_traversal() {
        assert_eq!(stored_name("/uploads/1-abc.png"), Some("1-abc.png"));
        assert_eq!(stored_name("/uploads/../secret"), None);
        assert_eq!(stored_name("/uploads/"), None);
        assert_eq!(stored_name("https://cdn.example.com/a.jpg"), None);
    }

    #[tokio::test]
    async fn test_put_and_delete() {
        let store = ImageStore::in_memory(1024);
        let stored = store
            .put(Bytes::from_static(b"\x89PNG...."), Some("image/png"))
            .await
            .unwrap();

        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with(".png"));
        assert_eq!(read(&store, &stored.url).await.unwrap().len(), stored.size);

        store.delete_best_effort(&stored.url).await;
        assert!(read(&store, &stored.url).await.is_err());

        // Deleting again only logs
        store.delete_best_effort(&stored.url).await;
    }

    #[tokio::test]
    async fn test_size_limit() {
        let store = ImageStore::in_memory(4);
        let result = store.put(Bytes::from_static(b"too large"), None).await;
        assert!(matches!(
            result,
            Err(StorageError::TooLarge { size: 9, limit: 4 })
        ));
    }

    #[tokio::test]
    async fn test_put_data_url() {
        let store = ImageStore::in_memory(1024);
        // "hello" in base64
        let stored = store
            .put_data_url("data:image/webp;base64,aGVsbG8=")
            .await
            .unwrap();
        assert!(stored.url.ends_with(".webp"));
        assert_eq!(read(&store, &stored.url).await.unwrap().as_ref(), b"hello");

        assert!(matches!(
            store.put_data_url("data:image/png,raw").await,
            Err(StorageError::InvalidDataUrl)
        ));
    }

    #[tokio::test]
    async fn test_local_backend() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = ImageStore::local(&temp_dir.path().join("uploads"), 1024).unwrap();
        let stored = store.put(Bytes::from_static(b"jpeg"), None).await.unwrap();

        let name = stored.url.trim_start_matches(PUBLIC_PREFIX);
        assert!(temp_dir.path().join("uploads").join(name).exists());
    }
}
