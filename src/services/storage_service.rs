//! src/services/storage_service.rs
//!
//! StorageService: writes uploaded payloads into one flat directory under
//! generated names. No metadata is kept; the directory itself is the store,
//! and the static mount in `routes` serves it back unchanged.

use crate::models::stored_file::StoredFile;
use bytes::Bytes;
use chrono::Utc;
use futures::{Stream, StreamExt, pin_mut};
use rand::Rng;
use std::{
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tokio::{
    fs::{self, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::debug;

/// Upper bound (inclusive) of the random part of a generated name.
const NAME_RANDOM_MAX: u64 = 1_000_000_000;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage directory `{0}` is missing or not a directory")]
    MissingDirectory(PathBuf),
    #[error("reading upload body for `{}` failed: {source}", .path.display())]
    Source { path: PathBuf, source: io::Error },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// StorageService provides the few disk operations the server needs:
/// - Ensure the storage directory exists (once, at startup)
/// - Generate a collision-resistant name for an incoming file
/// - Stream an upload to disk under that name
/// - Remove a file written for a request that was later rejected
///
/// Uniqueness of names is probabilistic (timestamp + random suffix). There is
/// no locking; files are opened with create-new so a clash fails instead of
/// overwriting.
#[derive(Clone, Debug)]
pub struct StorageService {
    /// Directory on disk where uploaded files are stored.
    pub base_path: PathBuf,
}

impl StorageService {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Create the storage directory if it is absent. Idempotent.
    pub async fn ensure_storage_dir(&self) -> StorageResult<()> {
        fs::create_dir_all(&self.base_path).await?;
        Ok(())
    }

    /// Verify the storage directory is present and is a directory.
    pub async fn check_storage_dir(&self) -> StorageResult<()> {
        match fs::metadata(&self.base_path).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(StorageError::MissingDirectory(self.base_path.clone())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::MissingDirectory(self.base_path.clone()))
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    /// Build `<field>-<epoch millis>-<random><ext>` for an upload.
    pub fn generate_file_name(field_name: &str, original_name: &str) -> String {
        let millis = Utc::now().timestamp_millis();
        let suffix: u64 = rand::thread_rng().gen_range(0..=NAME_RANDOM_MAX);
        format!(
            "{}-{}-{}{}",
            field_name,
            millis,
            suffix,
            extension_of(original_name)
        )
    }

    /// Stream an upload to a freshly named file in the storage directory.
    ///
    /// The directory is expected to exist already (see `ensure_storage_dir`).
    /// Neither kind of failure removes what was written: a disk error comes
    /// back as `Io`, an error from `stream` as `Source` carrying the path.
    pub async fn store_stream<S>(
        &self,
        field_name: &str,
        original_name: &str,
        content_type: Option<String>,
        stream: S,
    ) -> StorageResult<StoredFile>
    where
        S: Stream<Item = io::Result<Bytes>>,
    {
        let generated_name = Self::generate_file_name(field_name, original_name);
        let path = self.base_path.join(&generated_name);

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;

        let mut size_bytes: u64 = 0;
        pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| StorageError::Source {
                path: path.clone(),
                source,
            })?;
            size_bytes += chunk.len() as u64;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!("wrote {} bytes to {}", size_bytes, path.display());

        Ok(StoredFile {
            field_name: field_name.to_string(),
            original_name: original_name.to_string(),
            content_type,
            generated_name,
            path,
            size_bytes,
        })
    }

    /// Best-effort removal of a file in the storage directory.
    pub async fn remove(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(_) => debug!("removed {}", path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => debug!("failed to remove {}: {}", path.display(), err),
        }
    }
}

/// Extension of a client filename, dot included, or `""`.
///
/// Same scan as Node's `path.extname`, with `\\` also accepted as a
/// separator: trailing separators are skipped, and a dot that opens the last
/// segment (`.env`) or the segment `..` gives no extension.
pub fn extension_of(original_name: &str) -> &str {
    let bytes = original_name.as_bytes();
    let mut start_dot: Option<usize> = None;
    let mut start_part = 0;
    let mut end: Option<usize> = None;
    let mut matched_slash = true;
    // 0: nothing seen before the last dot, 1: only dots, -1: something else
    let mut pre_dot_state = 0i8;

    for (i, &byte) in bytes.iter().enumerate().rev() {
        if byte == b'/' || byte == b'\\' {
            if !matched_slash {
                start_part = i + 1;
                break;
            }
            continue;
        }
        if end.is_none() {
            matched_slash = false;
            end = Some(i + 1);
        }
        if byte == b'.' {
            if start_dot.is_none() {
                start_dot = Some(i);
            } else if pre_dot_state != 1 {
                pre_dot_state = 1;
            }
        } else if start_dot.is_some() {
            pre_dot_state = -1;
        }
    }

    match (start_dot, end) {
        (Some(dot), Some(end))
            if pre_dot_state != 0
                && !(pre_dot_state == 1 && dot + 1 == end && dot == start_part + 1) =>
        {
            &original_name[dot..end]
        }
        _ => "",
    }
}
