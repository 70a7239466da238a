//! Object storage locations (S3, R2, GCS, Azure, local)

use crate::config::CredentialsConfig;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectMeta, ObjectStore};
use std::path::PathBuf;
use std::sync::Arc;

/// How a location will be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Source data; a local directory must already exist
    Read,
    /// Destination; a local directory is created
    Write,
}

/// A bucket/container (or local directory) plus a key prefix
#[derive(Debug, Clone)]
pub struct StorageLocation {
    /// The object store implementation
    store: Arc<dyn ObjectStore>,
    /// Base path prefix within the bucket/container
    prefix: ObjectPath,
    /// URL scheme (s3, r2, gs, az, file, memory)
    scheme: String,
    /// Bucket, container or canonical local root
    root: String,
}

impl StorageLocation {
    /// Parse a location URL and create the matching object store
    ///
    /// Supported formats:
    /// - `s3://bucket/path/`, `s3a://...`, `s3n://...` - AWS S3
    /// - `r2://bucket/path/` - Cloudflare R2 (S3-compatible)
    /// - `gs://bucket/path/` - Google Cloud Storage
    /// - `az://container/path/` - Azure Blob Storage
    /// - `file:///local/path/`, `/local/path/` or `./path/` - Local filesystem
    pub fn parse(
        url: &str,
        credentials: Option<&CredentialsConfig>,
        access: Access,
    ) -> Result<Self> {
        let url = url.trim();
        if let Some(rest) = ["s3://", "s3a://", "s3n://"]
            .iter()
            .find_map(|scheme| url.strip_prefix(scheme))
        {
            Self::parse_s3(rest, credentials, false)
        } else if let Some(rest) = url.strip_prefix("r2://") {
            Self::parse_s3(rest, credentials, true)
        } else if let Some(rest) = url.strip_prefix("gs://") {
            Self::parse_gcs(rest)
        } else if let Some(rest) = url.strip_prefix("az://") {
            Self::parse_azure(rest)
        } else {
            Self::parse_local(url, access)
        }
    }

    /// Build a location over an existing store
    #[cfg(test)]
    pub fn from_store(store: Arc<dyn ObjectStore>, prefix: &str) -> Self {
        Self {
            store,
            prefix: ObjectPath::from(prefix.trim_matches('/')),
            scheme: "memory".to_string(),
            root: String::new(),
        }
    }

    /// Parse S3 or R2 URL (scheme already stripped)
    fn parse_s3(
        rest: &str,
        credentials: Option<&CredentialsConfig>,
        is_r2: bool,
    ) -> Result<Self> {
        let scheme = if is_r2 { "r2" } else { "s3" };
        let (bucket, prefix) = split_bucket(rest);
        if bucket.is_empty() {
            return Err(Error::config(format!("Missing bucket in {scheme}://{rest}")));
        }

        let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);

        // R2 endpoint: https://<account_id>.r2.cloudflarestorage.com
        if is_r2 {
            if let Ok(endpoint) = std::env::var("R2_ENDPOINT_URL") {
                builder = builder.with_endpoint(endpoint);
            }
        }

        if let Some(creds) = credentials {
            if let Some(key) = &creds.access_key_id {
                builder = builder.with_access_key_id(key);
            }
            if let Some(secret) = &creds.secret_access_key {
                builder = builder.with_secret_access_key(secret);
            }
            if let Some(token) = &creds.session_token {
                builder = builder.with_token(token);
            }
            if let Some(region) = &creds.region {
                builder = builder.with_region(region);
            }
            if let Some(endpoint) = &creds.endpoint {
                builder = builder.with_endpoint(endpoint);
            }
            if creds.allow_http {
                builder = builder.with_allow_http(true);
            }
        }

        let store = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to create {scheme} client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: ObjectPath::from(prefix),
            scheme: scheme.to_string(),
            root: bucket.to_string(),
        })
    }

    /// Parse GCS URL (scheme already stripped)
    fn parse_gcs(rest: &str) -> Result<Self> {
        let (bucket, prefix) = split_bucket(rest);

        let store = GoogleCloudStorageBuilder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| Error::config(format!("Failed to create GCS client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: ObjectPath::from(prefix),
            scheme: "gs".to_string(),
            root: bucket.to_string(),
        })
    }

    /// Parse Azure Blob URL (scheme already stripped)
    fn parse_azure(rest: &str) -> Result<Self> {
        let (container, prefix) = split_bucket(rest);

        let store = MicrosoftAzureBuilder::from_env()
            .with_container_name(container)
            .build()
            .map_err(|e| Error::config(format!("Failed to create Azure client: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: ObjectPath::from(prefix),
            scheme: "az".to_string(),
            root: container.to_string(),
        })
    }

    /// Parse local filesystem path
    ///
    /// The root is canonicalized so the engine and the object store agree on
    /// one absolute directory.
    fn parse_local(path: &str, access: Access) -> Result<Self> {
        let path = path.strip_prefix("file://").unwrap_or(path);

        match access {
            Access::Write => std::fs::create_dir_all(path)
                .map_err(|e| Error::config(format!("Failed to create directory {path}: {e}")))?,
            Access::Read => {
                if !std::path::Path::new(path).is_dir() {
                    return Err(Error::FileNotFound {
                        path: path.to_string(),
                    });
                }
            }
        }
        let root = std::fs::canonicalize(path)?;

        let store = LocalFileSystem::new_with_prefix(&root)
            .map_err(|e| Error::config(format!("Failed to create local store: {e}")))?;

        Ok(Self {
            store: Arc::new(store),
            prefix: ObjectPath::default(),
            scheme: "file".to_string(),
            root: root.to_string_lossy().trim_end_matches('/').to_string(),
        })
    }

    /// Get the scheme (s3, r2, gs, az, file, memory)
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn is_local(&self) -> bool {
        self.scheme == "file"
    }

    /// The underlying object store
    pub fn store(&self) -> Arc<dyn ObjectStore> {
        Arc::clone(&self.store)
    }

    /// Path of a child below the location prefix
    ///
    /// Each part is a single path segment; characters that are not valid in
    /// a segment (including `/`) are percent-encoded by `object_store`.
    pub fn path<S: AsRef<str>>(&self, parts: &[S]) -> ObjectPath {
        parts
            .iter()
            .fold(self.prefix.clone(), |path, part| path.child(part.as_ref()))
    }

    /// Human-readable URL of a path in this location
    pub fn display(&self, path: &ObjectPath) -> String {
        match self.scheme.as_str() {
            "file" => format!("{}/{path}", self.root),
            "memory" => format!("memory://{path}"),
            scheme => format!("{scheme}://{}/{path}", self.root),
        }
    }

    /// Human-readable URL of the location itself
    pub fn url(&self) -> String {
        self.display(&self.prefix)
    }

    /// URL the query engine uses for a path relative to this location
    ///
    /// `relative` is passed through untouched, so it may hold `/` separators
    /// and glob characters. R2 is addressed through the engine's S3 client.
    pub fn engine_url(&self, relative: &str) -> Result<String> {
        let base = match self.scheme.as_str() {
            "file" => self.root.clone(),
            "memory" => {
                return Err(Error::config(
                    "In-memory locations are not reachable from the engine",
                ))
            }
            "r2" => format!("s3://{}", self.root),
            scheme => format!("{scheme}://{}", self.root),
        };

        let relative = relative.trim_start_matches('/');
        let prefix = self.prefix.as_ref();
        Ok([base.as_str(), prefix, relative]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join("/"))
    }

    /// Make sure a directory exists before the engine writes into it
    ///
    /// Object stores have no directories, so only local locations do work.
    pub fn prepare_dir<S: AsRef<str>>(&self, parts: &[S]) -> Result<()> {
        if self.is_local() {
            let mut dir = PathBuf::from(&self.root);
            dir.extend(parts.iter().map(AsRef::as_ref));
            std::fs::create_dir_all(&dir)?;
        }
        Ok(())
    }

    /// Every object below a directory, sorted by path
    pub async fn list<S: AsRef<str>>(&self, parts: &[S]) -> Result<Vec<ObjectMeta>> {
        let dir = self.path(parts);
        let dir = (!dir.as_ref().is_empty()).then_some(dir);
        let mut objects: Vec<ObjectMeta> = self.store.list(dir.as_ref()).try_collect().await?;
        objects.sort_by(|a, b| a.location.cmp(&b.location));
        Ok(objects)
    }

    /// Write bytes to a path below the location, returning the full URL
    pub async fn put<S: AsRef<str>>(&self, parts: &[S], data: Bytes) -> Result<String> {
        let path = self.path(parts);
        self.store
            .put(&path, data.into())
            .await
            .map_err(|e| Error::output(format!("Failed to write {}: {e}", self.display(&path))))?;
        Ok(self.display(&path))
    }

    /// Delete every object below a directory, returning how many were removed
    pub async fn delete_prefix<S: AsRef<str>>(&self, parts: &[S]) -> Result<usize> {
        let dir = self.path(parts);
        let objects: Vec<_> = self.store.list(Some(&dir)).try_collect().await?;

        for meta in &objects {
            self.store.delete(&meta.location).await?;
        }
        Ok(objects.len())
    }
}

/// Split `bucket/some/prefix/` into `("bucket", "some/prefix")`
fn split_bucket(rest: &str) -> (&str, &str) {
    match rest.find('/') {
        Some(idx) => (&rest[..idx], rest[idx + 1..].trim_matches('/')),
        None => (rest, ""),
    }
}
