//! Object store destinations and upload handles

use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{MultipartUpload, ObjectStore};
use std::sync::Arc;

/// Build the destination key for one writer instance.
///
/// Format: `{stream prefix}/{YYYY_MM_DD}_{epoch millis}.{extension}`.
/// Deterministic and collision-free for distinct streams or distinct upload
/// timestamps. The timestamp is captured once at writer construction, so all
/// records of one instance land in exactly one object.
pub fn output_object_key(stream_name: &str, uploaded_at: DateTime<Utc>, extension: &str) -> String {
    let prefix = stream_name.replace('.', "_");
    format!(
        "{prefix}/{}_{}.{extension}",
        uploaded_at.format("%Y_%m_%d"),
        uploaded_at.timestamp_millis()
    )
}

/// One in-flight upload to a destination object.
///
/// `commit` makes the object complete and readable; `discard` abandons it,
/// leaving nothing authoritative behind the key.
#[async_trait]
pub trait ObjectUpload: Send {
    /// Append bytes to the upload
    async fn write(&mut self, data: Bytes) -> Result<()>;

    /// Complete the upload; the object becomes readable
    async fn commit(&mut self) -> Result<()>;

    /// Abandon the upload, releasing remote-side resources
    async fn discard(&mut self) -> Result<()>;
}

/// A destination that can open uploads at keys
#[async_trait]
pub trait ObjectSink: Send + Sync {
    /// Open an upload for writing at the given key
    async fn open(&self, key: &str) -> Result<Box<dyn ObjectUpload>>;

    /// Full destination path for the given key, for logging
    fn describe(&self, key: &str) -> String;
}

/// Object-store-backed sink parsed from a destination URL
#[derive(Debug, Clone)]
pub struct CloudSink {
    store: Arc<dyn ObjectStore>,
    prefix: String,
    scheme: String,
}

impl CloudSink {
    /// Parse a destination URL and create the matching object store.
    ///
    /// Supported formats:
    /// - `s3://bucket/path/` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `/local/path/` or `file://...` - Local filesystem
    ///
    /// Credentials come from the environment, as the respective store's
    /// builder reads them.
    pub fn parse(url: &str) -> Result<Self> {
        if let Some(rest) = url.strip_prefix("s3://") {
            Self::build_s3(url, rest, "s3")
        } else if let Some(rest) = url.strip_prefix("r2://") {
            Self::build_s3(url, rest, "r2")
        } else if let Some(rest) = url.strip_prefix("gs://") {
            let (bucket, prefix) = split_bucket(rest);
            let store = GoogleCloudStorageBuilder::from_env()
                .with_bucket_name(bucket)
                .build()
                .map_err(|e| Error::invalid_config("destination", format!("GCS: {e}")))?;
            Ok(Self::new(Arc::new(store), prefix, "gs"))
        } else if let Some(rest) = url.strip_prefix("az://") {
            let (container, prefix) = split_bucket(rest);
            let store = MicrosoftAzureBuilder::from_env()
                .with_container_name(container)
                .build()
                .map_err(|e| Error::invalid_config("destination", format!("Azure: {e}")))?;
            Ok(Self::new(Arc::new(store), prefix, "az"))
        } else {
            let path = url.strip_prefix("file://").unwrap_or(url);
            std::fs::create_dir_all(path).map_err(|e| {
                Error::invalid_config("destination", format!("cannot create {path}: {e}"))
            })?;
            let store = LocalFileSystem::new_with_prefix(path)
                .map_err(|e| Error::invalid_config("destination", format!("local: {e}")))?;
            Ok(Self::new(Arc::new(store), String::new(), "file"))
        }
    }

    fn build_s3(url: &str, rest: &str, scheme: &str) -> Result<Self> {
        let (bucket, prefix) = split_bucket(rest);
        if bucket.is_empty() {
            return Err(Error::invalid_config(
                "destination",
                format!("missing bucket in '{url}'"),
            ));
        }

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
        if scheme == "r2" {
            // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }
        let store = builder
            .build()
            .map_err(|e| Error::invalid_config("destination", format!("{scheme}: {e}")))?;
        Ok(Self::new(Arc::new(store), prefix, scheme))
    }

    fn new(store: Arc<dyn ObjectStore>, prefix: String, scheme: &str) -> Self {
        Self {
            store,
            prefix,
            scheme: scheme.to_string(),
        }
    }

    /// Wrap an already-built object store
    pub fn from_store(store: Arc<dyn ObjectStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            scheme: "custom".to_string(),
        }
    }

    /// Check if this is a cloud destination (not local)
    pub fn is_cloud(&self) -> bool {
        self.scheme != "file"
    }

    /// Get the scheme (s3, r2, gs, az, file)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    fn full_path(&self, key: &str) -> ObjectPath {
        if self.prefix.is_empty() {
            ObjectPath::from(key)
        } else {
            ObjectPath::from(format!("{}/{key}", self.prefix.trim_end_matches('/')))
        }
    }
}

#[async_trait]
impl ObjectSink for CloudSink {
    async fn open(&self, key: &str) -> Result<Box<dyn ObjectUpload>> {
        let path = self.full_path(key);
        let upload = self.store.put_multipart(&path).await?;
        Ok(Box::new(MultipartObjectUpload { upload }))
    }

    fn describe(&self, key: &str) -> String {
        format!("{}://{}", self.scheme, self.full_path(key))
    }
}

/// Upload handle over an `object_store` multipart upload
struct MultipartObjectUpload {
    upload: Box<dyn MultipartUpload>,
}

#[async_trait]
impl ObjectUpload for MultipartObjectUpload {
    async fn write(&mut self, data: Bytes) -> Result<()> {
        self.upload.put_part(data.into()).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<()> {
        self.upload.complete().await?;
        Ok(())
    }

    async fn discard(&mut self) -> Result<()> {
        self.upload.abort().await?;
        Ok(())
    }
}

/// Split `bucket/rest/of/prefix` into bucket and prefix
fn split_bucket(rest: &str) -> (&str, String) {
    match rest.find('/') {
        Some(idx) => (&rest[..idx], rest[idx + 1..].trim_end_matches('/').to_string()),
        None => (rest, String::new()),
    }
}
