//! Content-addressable storage for uploaded file bytes.
//!
//! Every distinct payload is stored exactly once, keyed by its
//! [`content_hash`]. Stored payloads are immutable, so writing the same
//! bytes twice is a no-op that yields the same [`ContentInfo`].
//!
//! [`content_hash`]: crate::hash::content_hash

use std::{
    io,
    path::PathBuf,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use derive_more::{Display, Error, From};
use tokio::fs;
use tracing::debug;

use crate::{config, hash};

/// Metadata describing a stored payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentInfo {
    /// Hex-encoded content hash.
    pub hash: String,

    /// Payload size, in bytes.
    pub size: usize,

    /// Count of `\n` bytes in the payload.
    pub lines: usize,
}

impl ContentInfo {
    /// Compute content metadata for the provided payload.
    pub fn describe(data: &[u8]) -> Self {
        Self {
            hash: hash::content_hash(data),
            size: data.len(),
            lines: hash::line_count(data),
        }
    }
}

/// Content store errors.
#[derive(Debug, Display, Error, From)]
pub enum ContentError {
    /// Filesystem error.
    IoError(io::Error),

    /// S3-related error.
    #[cfg(feature = "s3")]
    S3Error(crate::s3::Error),

    /// No payload is stored with the requested hash.
    #[display(fmt = "content {} not found", _0)]
    #[from(ignore)]
    NotFound(#[error(not(source))] String),

    /// Payload exceeds the configured size limit.
    #[display(fmt = "content of {} bytes exceeds the {} bytes limit", size, limit)]
    #[from(ignore)]
    TooLarge { size: usize, limit: usize },

    /// Configured backend was not compiled in.
    #[display(fmt = "s3 storage backend is not enabled")]
    #[from(ignore)]
    S3Disabled,
}

/// Content-addressable blob store.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Store the provided payload, returning its metadata.
    async fn put(&self, data: &[u8]) -> Result<ContentInfo, ContentError>;

    /// Fetch the payload stored with the provided hash.
    async fn get(&self, hash: &str) -> Result<Vec<u8>, ContentError>;
}

/// Reject payloads that exceed `limit` bytes.
fn check_size(data: &[u8], limit: usize) -> Result<(), ContentError> {
    if data.len() > limit {
        return Err(ContentError::TooLarge {
            size: data.len(),
            limit,
        });
    }

    Ok(())
}

/// Suffix counter for temporary files of concurrent writes.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Content store backed by a local directory.
///
/// Payloads are sharded by the first two byte pairs of their hash,
/// so that `abcdef...` is stored at `<root>/ab/cd/ef...`.
pub struct LocalContentStore {
    root: PathBuf,
    max_file_size: usize,
}

impl LocalContentStore {
    /// Create new [`LocalContentStore`] rooted at the provided directory.
    pub fn new(root: impl Into<PathBuf>, max_file_size: usize) -> Self {
        Self {
            root: root.into(),
            max_file_size,
        }
    }

    /// Path at which the payload with the provided hash is stored.
    pub fn path(&self, hash: &str) -> PathBuf {
        if hash.len() < 5 || !hash.is_char_boundary(2) || !hash.is_char_boundary(4) {
            return self.root.join(hash);
        }

        self.root.join(&hash[..2]).join(&hash[2..4]).join(&hash[4..])
    }
}

#[async_trait]
impl ContentStore for LocalContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentInfo, ContentError> {
        check_size(data, self.max_file_size)?;

        let info = ContentInfo::describe(data);
        let path = self.path(&info.hash);

        if fs::try_exists(&path).await? {
            return Ok(info);
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // Write to a temporary name first, so that readers never observe partial payloads.
        let tmp = path.with_extension(format!(
            "tmp-{}-{}",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, data).await?;
        fs::rename(&tmp, &path).await?;

        debug!(hash = %info.hash, size = info.size, "stored content");

        Ok(info)
    }

    async fn get(&self, hash: &str) -> Result<Vec<u8>, ContentError> {
        match fs::read(self.path(hash)).await {
            Ok(data) => Ok(data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(ContentError::NotFound(hash.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory content store for unit tests.
#[cfg(feature = "test-utils")]
#[derive(Default)]
pub struct MemoryContentStore {
    contents: tokio::sync::RwLock<std::collections::HashMap<String, Vec<u8>>>,
}

#[cfg(feature = "test-utils")]
impl MemoryContentStore {
    /// Create new empty [`MemoryContentStore`].
    pub fn new() -> Self {
        Default::default()
    }
}

#[cfg(feature = "test-utils")]
#[async_trait]
impl ContentStore for MemoryContentStore {
    async fn put(&self, data: &[u8]) -> Result<ContentInfo, ContentError> {
        let info = ContentInfo::describe(data);

        self.contents
            .write()
            .await
            .entry(info.hash.clone())
            .or_insert_with(|| data.to_vec());

        Ok(info)
    }

    async fn get(&self, hash: &str) -> Result<Vec<u8>, ContentError> {
        self.contents
            .read()
            .await
            .get(hash)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(hash.to_string()))
    }
}

/// Create a content store for the configured backend.
pub async fn from_config(
    config: &config::Storage,
) -> Result<Box<dyn ContentStore>, ContentError> {
    match &config.backend {
        config::Backend::Local { path } => Ok(Box::new(LocalContentStore::new(
            path,
            config.max_file_size,
        ))),
        #[cfg(feature = "s3")]
        config::Backend::S3(s3) => Ok(Box::new(
            crate::s3::S3ContentStore::new(s3, config.max_file_size).await,
        )),
        #[cfg(not(feature = "s3"))]
        config::Backend::S3(_) => Err(ContentError::S3Disabled),
    }
}

#[cfg(test)]
mod tests {
    use super::{from_config, ContentError, ContentInfo, ContentStore, LocalContentStore};
    use crate::config;

    #[test]
    fn describe() {
        let info = ContentInfo::describe(b"line 1\nline 2\n");

        assert_eq!(info.size, 14);
        assert_eq!(info.lines, 2);
    }

    #[tokio::test]
    async fn local_store_round_trip() {
        let dir = tempfile::tempdir().expect("unable to create temp dir");
        let store = LocalContentStore::new(dir.path(), 1024);

        let info = store.put(b"hello\n").await.expect("unable to store");
        let path = store.path(&info.hash);

        assert!(path.starts_with(dir.path().join(&info.hash[..2]).join(&info.hash[2..4])));
        assert_eq!(store.get(&info.hash).await.expect("unable to fetch"), b"hello\n");

        // Storing the same payload again is a no-op.
        assert_eq!(store.put(b"hello\n").await.expect("unable to store"), info);
    }

    #[tokio::test]
    async fn local_store_missing() {
        let dir = tempfile::tempdir().expect("unable to create temp dir");
        let store = LocalContentStore::new(dir.path(), 1024);

        assert!(matches!(
            store.get("0123456789abcdef").await,
            Err(ContentError::NotFound(hash)) if hash == "0123456789abcdef"
        ));
    }

    #[tokio::test]
    async fn store_from_config() {
        let dir = tempfile::tempdir().expect("unable to create temp dir");
        let config = config::Storage {
            backend: config::Backend::Local {
                path: dir.path().to_path_buf(),
            },
            max_file_size: 8,
        };

        let store = from_config(&config).await.expect("unable to create store");
        let info = store.put(b"int x;\n").await.expect("unable to store");

        assert!(dir.path().join(&info.hash[..2]).is_dir());
        assert!(matches!(
            store.put(b"too large").await,
            Err(ContentError::TooLarge { size: 9, limit: 8 })
        ));
    }

    #[tokio::test]
    async fn local_store_size_limit() {
        let dir = tempfile::tempdir().expect("unable to create temp dir");
        let store = LocalContentStore::new(dir.path(), 4);

        assert!(matches!(
            store.put(b"hello").await,
            Err(ContentError::TooLarge { size: 5, limit: 4 })
        ));
    }
}
