//! src/services/storage_service.rs
//!
//! FileStorage — the on-disk engine behind the file API. Every stored file is
//! a pair of artifacts keyed by a generated identifier:
//!
//! - `{base_path}/{id}{extension}` holds the raw bytes
//! - `{base_path}/metadata/{id}.json` holds the [`FileMetadata`] record
//!
//! Paths are only ever built from the identifier and the resolved extension,
//! never from the client-supplied filename.

use crate::{
    models::file::FileMetadata,
    services::content_types::{
        DEFAULT_EXTENSION, extension_for_content_type, is_path_safe_extension,
        path_safe_extension, sanitize_file_name,
    },
};
use bytes::Bytes;
use chrono::Utc;
use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, File},
    io::AsyncWriteExt,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Name of the directory, under the base path, that holds metadata records.
pub const METADATA_DIR: &str = "metadata";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("metadata for file `{id}` not found")]
    MetadataNotFound { id: String },
    #[error("content for file `{id}` not found")]
    ContentNotFound { id: String },
    #[error("metadata for file `{id}` is corrupt: {reason}")]
    CorruptMetadata { id: String, reason: String },
    #[error("failed to {op} for file `{id}`: {source}")]
    Io {
        op: &'static str,
        id: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to initialize storage directory {}: {source}", path.display())]
    Init {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// True when the caller should treat the file as absent.
    ///
    /// Covers a missing or unusable metadata record as well as a record
    /// whose blob has disappeared.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StorageError::MetadataNotFound { .. }
                | StorageError::ContentNotFound { .. }
                | StorageError::CorruptMetadata { .. }
        )
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// FileStorage provides the five file operations:
/// - store (write blob, then metadata; roll the blob back if metadata fails)
/// - retrieve (metadata first, then blob)
/// - get_metadata
/// - delete (blob, then metadata; tolerates either already being gone)
/// - exists (true only when both artifacts are present)
///
/// The struct holds nothing but the base path. There is no locking or
/// caching; concurrent callers rely on per-file create/rename atomicity.
#[derive(Clone, Debug)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open storage rooted at `base_path`, creating it and its metadata
    /// directory when missing.
    ///
    /// Fails if either directory cannot be created or written to.
    pub async fn new(base_path: impl Into<PathBuf>) -> StorageResult<Self> {
        let storage = Self {
            base_path: base_path.into(),
        };

        for dir in [storage.base_path.clone(), storage.metadata_dir()] {
            fs::create_dir_all(&dir)
                .await
                .map_err(|source| StorageError::Init {
                    path: dir.clone(),
                    source,
                })?;
            check_dir_writable(&dir)
                .await
                .map_err(|source| StorageError::Init { path: dir, source })?;
        }

        info!(path = %storage.base_path.display(), "opened file storage");
        Ok(storage)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn metadata_dir(&self) -> PathBuf {
        self.base_path.join(METADATA_DIR)
    }

    /// Location of the blob for `id` stored with `extension`.
    pub fn blob_path(&self, id: &str, extension: &str) -> PathBuf {
        self.base_path.join(format!("{}{}", id, extension))
    }

    /// Location of the metadata record for `id`.
    pub fn metadata_path(&self, id: &str) -> PathBuf {
        self.metadata_dir().join(format!("{}.json", id))
    }

    /// Persist `content` under a fresh identifier and return its metadata.
    ///
    /// The blob is written before the metadata record. If the record cannot
    /// be written the blob is removed again, so a failed store leaves
    /// nothing behind.
    #[tracing::instrument(skip(self, content), fields(size = content.len()))]
    pub async fn store(
        &self,
        content: &[u8],
        original_name: &str,
        content_type: &str,
    ) -> StorageResult<FileMetadata> {
        let id = Uuid::new_v4().to_string();
        let extension = resolve_extension(original_name, content_type);
        let blob_path = self.blob_path(&id, &extension);

        write_atomically(&blob_path, content)
            .await
            .map_err(|source| StorageError::Io {
                op: "write file content",
                id: id.clone(),
                source,
            })?;

        let now = Utc::now();
        let metadata = FileMetadata {
            id,
            original_name: sanitize_file_name(original_name),
            content_type: content_type.to_string(),
            size: content.len() as u64,
            extension,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.save_metadata(&metadata).await {
            match fs::remove_file(&blob_path).await {
                Ok(_) => debug!(id = %metadata.id, "rolled back blob after metadata failure"),
                Err(cleanup) => warn!(
                    id = %metadata.id,
                    path = %blob_path.display(),
                    "failed to roll back blob: {}",
                    cleanup
                ),
            }
            return Err(err);
        }

        info!(
            id = %metadata.id,
            size = metadata.size,
            extension = %metadata.extension,
            "stored file"
        );
        Ok(metadata)
    }

    /// Read a file's bytes together with its metadata.
    ///
    /// Returns `MetadataNotFound` when there is no usable record and
    /// `ContentNotFound` when the record exists but the blob does not.
    pub async fn retrieve(&self, id: &str) -> StorageResult<(Bytes, FileMetadata)> {
        let metadata = self.load_metadata(id).await?;
        let blob_path = self.blob_path(id, &metadata.extension);

        let content = fs::read(&blob_path).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                debug!(id, path = %blob_path.display(), "metadata present but blob missing");
                StorageError::ContentNotFound { id: id.to_string() }
            } else {
                StorageError::Io {
                    op: "read file content",
                    id: id.to_string(),
                    source: err,
                }
            }
        })?;

        Ok((Bytes::from(content), metadata))
    }

    /// Fetch only the metadata record.
    pub async fn get_metadata(&self, id: &str) -> StorageResult<FileMetadata> {
        self.load_metadata(id).await
    }

    /// Remove a file's blob and metadata.
    ///
    /// The record must load for the delete to start. After that, either
    /// artifact already being gone is not an error.
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        let metadata = self.load_metadata(id).await?;

        let blob_path = self.blob_path(id, &metadata.extension);
        if !remove_if_present(&blob_path)
            .await
            .map_err(|source| StorageError::Io {
                op: "delete file content",
                id: id.to_string(),
                source,
            })?
        {
            debug!(id, path = %blob_path.display(), "blob already missing");
        }

        remove_if_present(&self.metadata_path(id))
            .await
            .map_err(|source| StorageError::Io {
                op: "delete metadata",
                id: id.to_string(),
                source,
            })?;

        info!(id, "deleted file");
        Ok(())
    }

    /// True only when both the metadata record and the blob are present.
    pub async fn exists(&self, id: &str) -> bool {
        let Ok(metadata) = self.load_metadata(id).await else {
            return false;
        };
        fs::metadata(self.blob_path(id, &metadata.extension))
            .await
            .is_ok_and(|m| m.is_file())
    }

    /// Write, read back and remove a marker file in both storage directories.
    pub async fn check_writable(&self) -> io::Result<()> {
        check_dir_writable(&self.base_path).await?;
        check_dir_writable(&self.metadata_dir()).await
    }

    async fn save_metadata(&self, metadata: &FileMetadata) -> StorageResult<()> {
        let mut encoded =
            serde_json::to_vec_pretty(metadata).map_err(|err| StorageError::Io {
                op: "encode metadata",
                id: metadata.id.clone(),
                source: io::Error::other(err),
            })?;
        encoded.push(b'\n');

        write_atomically(&self.metadata_path(&metadata.id), &encoded)
            .await
            .map_err(|source| StorageError::Io {
                op: "save metadata",
                id: metadata.id.clone(),
                source,
            })
    }

    async fn load_metadata(&self, id: &str) -> StorageResult<FileMetadata> {
        ensure_id_valid(id)?;

        let raw = fs::read(self.metadata_path(id)).await.map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                StorageError::MetadataNotFound { id: id.to_string() }
            } else {
                StorageError::Io {
                    op: "read metadata",
                    id: id.to_string(),
                    source: err,
                }
            }
        })?;

        let metadata: FileMetadata =
            serde_json::from_slice(&raw).map_err(|err| StorageError::CorruptMetadata {
                id: id.to_string(),
                reason: err.to_string(),
            })?;

        if metadata.id != id {
            return Err(StorageError::CorruptMetadata {
                id: id.to_string(),
                reason: format!("record belongs to `{}`", metadata.id),
            });
        }
        if !is_path_safe_extension(&metadata.extension) {
            return Err(StorageError::CorruptMetadata {
                id: id.to_string(),
                reason: format!("unusable extension `{}`", metadata.extension),
            });
        }

        Ok(metadata)
    }
}

/// Pick the blob extension: content type first, then the filename suffix,
/// then the binary default.
fn resolve_extension(original_name: &str, content_type: &str) -> String {
    if !content_type.is_empty() {
        extension_for_content_type(content_type)
    } else if !original_name.is_empty() {
        path_safe_extension(original_name)
            .unwrap_or(DEFAULT_EXTENSION)
            .to_string()
    } else {
        DEFAULT_EXTENSION.to_string()
    }
}

/// Only canonical hyphenated UUIDs can name a stored file.
fn ensure_id_valid(id: &str) -> StorageResult<()> {
    match Uuid::try_parse(id) {
        Ok(parsed) if parsed.hyphenated().to_string() == id => Ok(()),
        _ => Err(StorageError::MetadataNotFound { id: id.to_string() }),
    }
}

/// Write `bytes` to a temporary sibling of `path`, sync it, then rename it
/// into place. The temporary file is removed on any failure.
async fn write_atomically(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| io::Error::other("path missing parent directory"))?;
    let tmp_path = parent.join(format!(".tmp-{}", Uuid::new_v4()));

    let result = async {
        let mut file = File::create(&tmp_path).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&tmp_path, path).await
    }
    .await;

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path).await;
    }
    result
}

/// Remove a file, reporting whether it was there.
async fn remove_if_present(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(_) => Ok(true),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

async fn check_dir_writable(dir: &Path) -> io::Result<()> {
    const MARKER: &[u8] = b"ready";
    let marker_path = dir.join(format!(".ready-{}", Uuid::new_v4()));

    fs::write(&marker_path, MARKER).await?;
    let read_back = fs::read(&marker_path).await;
    let removed = fs::remove_file(&marker_path).await;

    if read_back? != MARKER {
        return Err(io::Error::other("marker file content mismatch"));
    }
    removed
}
