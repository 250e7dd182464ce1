use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::primitives::ByteStream;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use thiserror::Error;
use uuid::Uuid;

use crate::{config::S3Config, upload::UploadedImage};

/// Public URL prefix of locally stored images.
pub const LOCAL_IMAGE_PREFIX: &str = "/uploads/images/";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
    #[error("object storage error: {0}")]
    Remote(String),
}

// 1. StorageService Contract
/// StorageService
///
/// Abstract contract for persisting uploaded pictures. Handlers only ever see the public
/// path a picture is reachable under; the backend decides where the bytes live.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Prepares the backend at startup: creates the upload directory or the bucket.
    async fn ensure_ready(&self) -> Result<(), StorageError>;

    /// Stores the picture under a freshly generated name and returns its public path.
    async fn save_image(&self, image: &UploadedImage) -> Result<String, StorageError>;

    /// Removes a picture previously returned by `save_image`. Paths the backend does not own
    /// (external links, empty strings) are ignored.
    async fn delete(&self, public_path: &str) -> Result<(), StorageError>;
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;

/// Generates the stored file name, `image-<unix millis>-<random>.<ext>`.
pub fn image_file_name(image: &UploadedImage) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let random = Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("image-{millis}-{random}.{}", image.extension())
}

/// sanitize_key
///
/// Removes directory navigation components (`..`, `.`) and empty segments from a
/// caller-provided key so it can never escape the storage root.
pub fn sanitize_key(key: &str) -> String {
    key.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

// 2. Local Disk Implementation
/// LocalDiskStorage
///
/// Writes pictures to `<root>/images/` and hands out `/uploads/images/<name>` paths, which
/// the router serves straight from `<root>`.
#[derive(Clone, Debug)]
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn images_dir(&self) -> PathBuf {
        self.root.join("images")
    }
}

#[async_trait]
impl StorageService for LocalDiskStorage {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(self.images_dir()).await?;
        Ok(())
    }

    async fn save_image(&self, image: &UploadedImage) -> Result<String, StorageError> {
        let file_name = image_file_name(image);
        tokio::fs::create_dir_all(self.images_dir()).await?;
        tokio::fs::write(self.images_dir().join(&file_name), &image.bytes).await?;
        tracing::info!(file = %file_name, bytes = image.bytes.len(), "stored image on disk");
        Ok(format!("{LOCAL_IMAGE_PREFIX}{file_name}"))
    }

    async fn delete(&self, public_path: &str) -> Result<(), StorageError> {
        let Some(relative) = public_path.strip_prefix(LOCAL_IMAGE_PREFIX) else {
            return Ok(());
        };
        let relative = sanitize_key(relative);
        if relative.is_empty() {
            return Ok(());
        }
        match tokio::fs::remove_file(self.images_dir().join(&relative)).await {
            Ok(()) => {
                tracing::info!(file = %relative, "removed image from disk");
                Ok(())
            }
            // Already gone.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// 3. The S3 Implementation (S3/MinIO/Supabase)
/// S3StorageClient
///
/// Stores pictures in an S3-compatible bucket. `force_path_style(true)` keeps it compatible
/// with MinIO and Supabase Storage gateways.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
    public_url: String,
}

impl S3StorageClient {
    pub fn new(config: &S3Config) -> Self {
        let credentials = s3::config::Credentials::new(
            &config.access_key,
            &config.secret_key,
            None,
            None,
            "static",
        );

        let s3_config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(&config.endpoint)
            .region(s3::config::Region::new(config.region.clone()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(s3_config),
            bucket_name: config.bucket.clone(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    fn key_for(&self, public_path: &str) -> Option<String> {
        let rest = public_path.strip_prefix(&self.public_url)?;
        let key = sanitize_key(rest);
        key.starts_with("images/").then_some(key)
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    /// Creating an existing bucket is harmless, so this is safe to call at every startup.
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        if let Err(e) = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await
        {
            tracing::debug!(bucket = %self.bucket_name, error = %e, "create_bucket skipped");
        }
        Ok(())
    }

    async fn save_image(&self, image: &UploadedImage) -> Result<String, StorageError> {
        let key = format!("images/{}", image_file_name(image));
        self.client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .content_type(&image.content_type)
            .body(ByteStream::from(image.bytes.to_vec()))
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;
        tracing::info!(key = %key, bucket = %self.bucket_name, "stored image in bucket");
        Ok(format!("{}/{}", self.public_url, key))
    }

    async fn delete(&self, public_path: &str) -> Result<(), StorageError> {
        let Some(key) = self.key_for(public_path) else {
            return Ok(());
        };
        self.client
            .delete_object()
            .bucket(&self.bucket_name)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::Remote(e.to_string()))?;
        Ok(())
    }
}

// 4. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory stand-in used by handler and router tests. Records every stored and deleted
/// path so tests can assert on image replacement.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
    saved: Arc<Mutex<Vec<String>>>,
    deleted: Arc<Mutex<Vec<String>>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    pub fn saved(&self) -> Vec<String> {
        self.saved.lock().map(|v| v.clone()).unwrap_or_default()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().map(|v| v.clone()).unwrap_or_default()
    }

    fn check(&self) -> Result<(), StorageError> {
        if self.should_fail {
            return Err(StorageError::Remote(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_ready(&self) -> Result<(), StorageError> {
        self.check()
    }

    async fn save_image(&self, image: &UploadedImage) -> Result<String, StorageError> {
        self.check()?;
        let path = format!("{LOCAL_IMAGE_PREFIX}{}", image_file_name(image));
        if let Ok(mut saved) = self.saved.lock() {
            saved.push(path.clone());
        }
        Ok(path)
    }

    async fn delete(&self, public_path: &str) -> Result<(), StorageError> {
        self.check()?;
        if public_path.starts_with(LOCAL_IMAGE_PREFIX) {
            if let Ok(mut deleted) = self.deleted.lock() {
                deleted.push(public_path.to_string());
            }
        }
        Ok(())
    }
}

/// Deletes a replaced or orphaned picture without failing the request that triggered it.
pub async fn discard_image(storage: &StorageState, public_path: &str) {
    if public_path.is_empty() {
        return;
    }
    if let Err(e) = storage.delete(public_path).await {
        tracing::warn!(path = %public_path, error = %e, "failed to delete image");
    }
}
