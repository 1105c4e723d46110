use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use stashbox_backend::wire::{decode_record, encode_record};
use stashbox_backend::{Cache, CacheError, CacheResult};
use stashbox_core::{BufferedResponse, CacheKey, RequestHead};
use tempfile::NamedTempFile;
use tokio::fs;

use crate::FileCacheError;

/// Disk-based cache storing one record file per request.
///
/// Records live directly under the root directory, named after the request's
/// [`CacheKey`]. Each file holds the request URL on its first line followed by
/// the raw HTTP response, so the cache can be inspected with any text tool.
///
/// ```no_run
/// use stashbox_fs::FileCache;
///
/// // Defaults: atomic writes
/// let cache = FileCache::new("/var/cache/crawler");
///
/// // Plain in-place writes
/// let cache = FileCache::builder()
///     .root("/var/cache/crawler")
///     .atomic_writes(false)
///     .build()?;
/// # Ok::<(), stashbox_fs::FileCacheError>(())
/// ```
///
/// Records are never expired or evicted; remove files to invalidate them.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
    atomic_writes: bool,
    label: String,
}

impl FileCache {
    /// File cache rooted at `root` with default settings.
    pub fn new(root: impl AsRef<Path>) -> Self {
        FileCache {
            root: root.as_ref().to_path_buf(),
            atomic_writes: true,
            label: "file".to_owned(),
        }
    }

    /// Starts building a new cache.
    pub fn builder() -> FileCacheBuilder {
        FileCacheBuilder::default()
    }

    /// Directory holding the records.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the record for `request`.
    pub fn path_for(&self, request: &RequestHead) -> PathBuf {
        self.root.join(CacheKey::from_head(request).to_string())
    }

    /// Writes `record` to a temporary file in the root and renames it over
    /// `path`. The temporary file is removed on any failure.
    async fn write_atomic(&self, path: PathBuf, record: Vec<u8>) -> io::Result<()> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || -> io::Result<()> {
            let mut temp = NamedTempFile::new_in(&root)?;
            temp.write_all(&record)?;
            temp.persist(&path)?;
            Ok(())
        })
        .await
        .map_err(io::Error::other)?
    }
}

/// Builder for [`FileCache`].
///
/// ```no_run
/// use stashbox_fs::FileCache;
///
/// let cache = FileCache::builder()
///     .root("/var/cache/crawler")
///     .label("crawler")
///     .build()?;
/// # Ok::<(), stashbox_fs::FileCacheError>(())
/// ```
pub struct FileCacheBuilder {
    root: Option<PathBuf>,
    atomic_writes: bool,
    label: String,
}

impl Default for FileCacheBuilder {
    fn default() -> Self {
        Self {
            root: None,
            atomic_writes: true,
            label: "file".to_owned(),
        }
    }
}

impl FileCacheBuilder {
    /// Directory holding the records. Created by [`Cache::init`].
    pub fn root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = Some(root.as_ref().to_path_buf());
        self
    }

    /// Write records to a temporary file and rename it into place.
    ///
    /// Readers then never observe a partially written record. Concurrent
    /// writers for the same request still race; the last rename wins.
    ///
    /// Default: `true`
    pub fn atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    /// Identifies this cache in log records.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Creates the cache.
    ///
    /// Fails if no root directory was given. The directory itself is only
    /// created by [`Cache::init`].
    pub fn build(self) -> Result<FileCache, FileCacheError> {
        let root = self.root.ok_or(FileCacheError::MissingRoot)?;
        if root.as_os_str().is_empty() {
            return Err(FileCacheError::InvalidConfig(
                "cache root path is empty".to_owned(),
            ));
        }
        Ok(FileCache {
            root,
            atomic_writes: self.atomic_writes,
            label: self.label,
        })
    }
}

#[async_trait]
impl Cache for FileCache {
    async fn init(&self) -> CacheResult<()> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    async fn get(&self, request: &RequestHead) -> CacheResult<BufferedResponse> {
        let path = self.path_for(request);
        let record = match fs::read(&path).await {
            Ok(record) => record,
            Err(err) => {
                tracing::trace!(path = %path.display(), error = %err, "cache record unavailable");
                return Err(CacheError::NotFound);
            }
        };
        Ok(decode_record(&record, request.method())?)
    }

    async fn set(&self, request: &RequestHead, response: &BufferedResponse) -> CacheResult<()> {
        let path = self.path_for(request);
        let record = encode_record(request, response);
        let bytes = record.len();
        if self.atomic_writes {
            self.write_atomic(path.clone(), record).await?;
        } else {
            fs::write(&path, &record).await?;
        }
        tracing::debug!(path = %path.display(), bytes, "cache record written");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.label
    }
}
