//! File-backed store.
//!
//! Layout: `<root>/<partition>/<sha256(key)>.json`. Each entry file holds the key, status,
//! headers, insertion time, body length and the base64-encoded body. Writes go to a temporary
//! file in the same directory and are renamed into place, so a reader never observes a
//! half-written entry.
//!
//! New partitions must have a conservative name (ASCII alphanumerics and `._-`). Any other
//! directory already under the root is still listed, measured and deletable, so stale data
//! left by other tools is garbage-collected on activation instead of blocking it.

use super::backend::{CacheEntry, CacheStore};
use super::key::RequestKey;
use crate::types::Response;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tokio::fs;
use tracing::debug;

const ENTRY_EXT: &str = "json";

#[derive(Debug, Serialize, Deserialize)]
struct EntryRecord {
    method: String,
    url: String,
    status: u16,
    #[serde(default)]
    headers: Vec<(String, String)>,
    body_len: u64,
    body: String,
    stored_at_ms: u64,
}

/// The size-relevant part of a record; the body itself is never decoded.
#[derive(Deserialize)]
struct RecordSize {
    body_len: u64,
}

impl EntryRecord {
    fn from_entry(entry: &CacheEntry) -> Self {
        Self {
            method: entry.key.method.clone(),
            url: entry.key.url.clone(),
            status: entry.response.status,
            headers: entry.response.headers.clone(),
            body_len: entry.response.body_len(),
            body: STANDARD.encode(&entry.response.body),
            stored_at_ms: entry
                .stored_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        }
    }

    fn into_entry(self) -> Result<CacheEntry> {
        let body = STANDARD.decode(self.body.as_bytes()).map_err(|e| {
            Error::storage_with_context(
                "corrupt entry body",
                ErrorContext::new()
                    .with_details(format!("{} {}: {}", self.method, self.url, e))
                    .with_source("disk_store"),
            )
        })?;
        let mut response = Response::new(self.status, body);
        response.headers = self.headers;
        Ok(CacheEntry {
            key: RequestKey {
                method: self.method,
                url: self.url,
            },
            response,
            stored_at: UNIX_EPOCH + Duration::from_millis(self.stored_at_ms),
        })
    }
}

pub struct DiskStore {
    root: PathBuf,
}

impl DiskStore {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory for a partition this store creates or writes to.
    fn partition_dir(&self, partition: &str) -> Result<PathBuf> {
        let valid = partition != "."
            && partition != ".."
            && partition
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(unsafe_name(partition));
        }
        self.existing_dir(partition)
    }

    /// Directory for a partition that may already exist under the root, whatever its name.
    /// Only a single plain path component is accepted.
    fn existing_dir(&self, partition: &str) -> Result<PathBuf> {
        let mut components = Path::new(partition).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == partition => {
                Ok(self.root.join(partition))
            }
            _ => Err(unsafe_name(partition)),
        }
    }

    fn entry_path(&self, partition: &str, key: &RequestKey) -> Result<PathBuf> {
        Ok(self
            .partition_dir(partition)?
            .join(format!("{}.{}", key.fingerprint(), ENTRY_EXT)))
    }

    async fn read_record(path: &Path) -> Result<Option<EntryRecord>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn entry_files(&self, partition: &str) -> Result<Vec<PathBuf>> {
        let dir = self.existing_dir(partition)?;
        let mut read_dir = match fs::read_dir(&dir).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut files = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            let path = entry.path();
            if path.extension().map(|ext| ext == ENTRY_EXT).unwrap_or(false) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl CacheStore for DiskStore {
    async fn open(&self, partition: &str) -> Result<()> {
        fs::create_dir_all(self.partition_dir(partition)?).await?;
        Ok(())
    }

    async fn get(&self, partition: &str, key: &RequestKey) -> Result<Option<CacheEntry>> {
        let path = self.entry_path(partition, key)?;
        match Self::read_record(&path).await? {
            // A digest collision would surface as a different key; treat it as a miss.
            Some(record) if record.method == key.method && record.url == key.url => {
                Ok(Some(record.into_entry()?))
            }
            _ => Ok(None),
        }
    }

    async fn put(&self, partition: &str, entry: CacheEntry) -> Result<()> {
        self.open(partition).await?;
        let path = self.entry_path(partition, &entry.key)?;
        let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4()));
        let bytes = serde_json::to_vec(&EntryRecord::from_entry(&entry))?;
        fs::write(&tmp, bytes).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete_partition(&self, partition: &str) -> Result<bool> {
        match fs::remove_dir_all(self.existing_dir(partition)?).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn partitions(&self) -> Result<Vec<String>> {
        let mut read_dir = match fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn partition_size(&self, partition: &str) -> Result<u64> {
        let mut total = 0u64;
        for path in self.entry_files(partition).await? {
            let bytes = match fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            match serde_json::from_slice::<RecordSize>(&bytes) {
                Ok(record) => total += record.body_len,
                Err(e) => debug!(path = %path.display(), error = %e, "skipping non-entry file"),
            }
        }
        Ok(total)
    }

    async fn entry_count(&self, partition: &str) -> Result<usize> {
        Ok(self.entry_files(partition).await?.len())
    }

    fn name(&self) -> &'static str {
        "disk"
    }
}

fn unsafe_name(partition: &str) -> Error {
    Error::storage_with_context(
        "partition name is not a safe directory name",
        ErrorContext::new()
            .with_details(partition)
            .with_source("disk_store"),
    )
}

impl std::fmt::Debug for DiskStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiskStore").field("root", &self.root).finish()
    }
}
