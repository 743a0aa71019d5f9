use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Cow;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use super::{AcceptedUpload, ContentClass, UploadError};

/// NamingPolicy
///
/// Semantic prefix for stored filenames (`cover_`, `Gallery_`, `Archive_`, ...).
/// The generated name is `{prefix}{unix_millis}-{8 hex chars}{ext}`: the millisecond
/// timestamp keeps names sortable, and the random suffix keeps concurrent uploads in the
/// same millisecond apart without any shared counter or lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    prefix: Cow<'static, str>,
}

impl NamingPolicy {
    pub const fn new(prefix: &'static str) -> Self {
        Self {
            prefix: Cow::Borrowed(prefix),
        }
    }

    /// Prefix derived from free text, e.g. a person's name: `Dr. Jane Doe` -> `dr_jane_doe_`.
    /// Whitespace runs become `_`; anything outside `[a-z0-9_-]` is dropped so the
    /// result is always a plain file name. Falls back to `fallback` when nothing is left.
    pub fn from_label(label: &str, fallback: &'static str) -> Self {
        let mut prefix = String::with_capacity(label.len() + 1);
        for word in label.split_whitespace() {
            let word: String = word
                .chars()
                .map(|c| c.to_ascii_lowercase())
                .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
                .collect();
            if word.is_empty() {
                continue;
            }
            if !prefix.is_empty() {
                prefix.push('_');
            }
            prefix.push_str(&word);
        }

        if prefix.is_empty() {
            return Self::new(fallback);
        }
        prefix.push('_');
        Self {
            prefix: Cow::Owned(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Generates a fresh filename for a file with the given extension (leading dot included).
    pub fn file_name(&self, extension: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!(
            "{}{}-{}{}",
            self.prefix,
            Utc::now().timestamp_millis(),
            &suffix[..8],
            extension
        )
    }
}

/// StoredAsset
///
/// A file written to storage after an accepted verdict. Immutable: replacing a file means
/// persisting a new asset and removing the old one.
#[derive(Debug, Clone, Serialize)]
pub struct StoredAsset {
    pub filename: String,
    /// Relative URL to store in the database row, e.g. `/images/cover_1700000000000-1a2b3c4d.jpg`.
    pub url: String,
    pub size: u64,
    pub original_filename: String,
    #[serde(skip)]
    pub class: ContentClass,
    pub created_at: DateTime<Utc>,
}

/// Builds the public relative URL for a stored file.
pub fn public_url(class: ContentClass, filename: &str) -> String {
    format!("/{}/{}", class.directory(), filename)
}

/// parse_url
///
/// Resolves a relative URL previously returned by the persister back to its class and
/// filename. Accepts `/images/x.jpg` as well as the slash-less `pdfs/x.pdf` form found in
/// older rows. Anything that is not a single plain filename under a known root
/// (`..`, nested paths, hidden names) is refused, which keeps deletes inside the storage root.
pub fn parse_url(url: &str) -> Option<(ContentClass, &str)> {
    let (dir, name) = url.trim_start_matches('/').split_once('/')?;
    let class = match dir {
        "images" => ContentClass::Image,
        "pdfs" => ContentClass::Document,
        _ => return None,
    };

    let is_plain = !name.is_empty() && !name.starts_with('.') && !name.contains(['/', '\\']);

    is_plain.then_some((class, name))
}

// 1. StorageService Contract
/// StorageService
///
/// The Persister contract. Handlers only talk to this trait, so tests can swap the disk
/// implementation for [`MockStorageService`] or point [`DiskStorage`] at a temp directory.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Creates the per-class directories if they are missing. Idempotent.
    async fn ensure_roots(&self) -> Result<(), UploadError>;

    /// Writes an accepted upload under a freshly generated name and returns its asset record.
    async fn persist(
        &self,
        upload: AcceptedUpload,
        policy: NamingPolicy,
    ) -> Result<StoredAsset, UploadError>;

    /// Deletes a stored file by its relative URL. Never fails: a file that is already
    /// gone or a URL that does not resolve is logged and ignored.
    async fn remove(&self, url: &str);

    /// Removes every asset in the batch. Used to roll back files whose database write failed.
    async fn discard(&self, assets: &[StoredAsset]) {
        for asset in assets {
            self.remove(&asset.url).await;
        }
    }
}

// 2. The Real Implementation (local disk)
/// DiskStorage
///
/// Flat directory per content class under an injected root:
/// `{root}/images/*` and `{root}/pdfs/*`. No subdirectories, no sidecar files.
#[derive(Debug, Clone)]
pub struct DiskStorage {
    root: PathBuf,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute directory for a content class.
    pub fn directory(&self, class: ContentClass) -> PathBuf {
        self.root.join(class.directory())
    }
}

/// Writes to a hidden temporary sibling and renames it into place, so a failed write
/// never leaves a partial file under the final name.
async fn write_then_rename(temp_path: &Path, final_path: &Path, data: &[u8]) -> io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(temp_path)
        .await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(temp_path, final_path).await
}

#[async_trait]
impl StorageService for DiskStorage {
    async fn ensure_roots(&self) -> Result<(), UploadError> {
        for class in [ContentClass::Image, ContentClass::Document] {
            let dir = self.directory(class);
            tokio::fs::create_dir_all(&dir).await.map_err(|source| {
                tracing::error!(path = %dir.display(), error = %source, "Failed to create storage directory");
                UploadError::StorageWriteError {
                    path: dir.display().to_string(),
                    source,
                }
            })?;
        }
        Ok(())
    }

    async fn persist(
        &self,
        upload: AcceptedUpload,
        policy: NamingPolicy,
    ) -> Result<StoredAsset, UploadError> {
        let class = upload.class();
        let dir = self.directory(class);

        if let Err(source) = tokio::fs::create_dir_all(&dir).await {
            tracing::error!(path = %dir.display(), error = %source, "Failed to create storage directory");
            return Err(UploadError::StorageWriteError {
                path: dir.display().to_string(),
                source,
            });
        }

        let filename = policy.file_name(upload.extension());
        let final_path = dir.join(&filename);
        let temp_path = dir.join(format!(".{filename}.part"));

        if let Err(source) = write_then_rename(&temp_path, &final_path, upload.data()).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            tracing::error!(
                path = %final_path.display(),
                field = upload.field(),
                error = %source,
                "Failed to write uploaded file"
            );
            return Err(UploadError::StorageWriteError {
                path: final_path.display().to_string(),
                source,
            });
        }

        tracing::info!(
            path = %final_path.display(),
            field = upload.field(),
            bytes = upload.len(),
            "Stored uploaded file"
        );

        Ok(StoredAsset {
            url: public_url(class, &filename),
            size: upload.len() as u64,
            original_filename: upload.original_filename().to_string(),
            filename,
            class,
            created_at: Utc::now(),
        })
    }

    async fn remove(&self, url: &str) {
        let Some((class, name)) = parse_url(url) else {
            tracing::warn!(url, "Refusing to delete file outside the storage roots");
            return;
        };

        let path = self.directory(class).join(name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!(path = %path.display(), "Deleted stored file"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "Stored file already missing from disk")
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Failed to delete stored file")
            }
        }
    }
}

// 3. The Mock Implementation (For Tests)
/// MockStorageService
///
/// In-memory stand-in that records what would have been written and deleted, so handler
/// tests can assert on rollback and replacement without touching the disk.
#[derive(Debug, Default)]
pub struct MockStorageService {
    /// When true, every `persist` fails with `StorageWriteError`.
    pub should_fail: bool,
    persisted: Mutex<Vec<StoredAsset>>,
    removed: Mutex<Vec<String>>,
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

    /// Assets persisted so far, in order.
    pub fn persisted(&self) -> Vec<StoredAsset> {
        self.persisted.lock().map(|g| g.clone()).unwrap_or_default()
    }

    /// URLs passed to `remove`, in order.
    pub fn removed(&self) -> Vec<String> {
        self.removed.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_roots(&self) -> Result<(), UploadError> {
        Ok(())
    }

    async fn persist(
        &self,
        upload: AcceptedUpload,
        policy: NamingPolicy,
    ) -> Result<StoredAsset, UploadError> {
        if self.should_fail {
            return Err(UploadError::StorageWriteError {
                path: "mock".to_string(),
                source: io::Error::other("Mock Storage Error: Simulation requested"),
            });
        }

        let filename = policy.file_name(upload.extension());
        let asset = StoredAsset {
            url: public_url(upload.class(), &filename),
            size: upload.len() as u64,
            original_filename: upload.original_filename().to_string(),
            filename,
            class: upload.class(),
            created_at: Utc::now(),
        };

        if let Ok(mut persisted) = self.persisted.lock() {
            persisted.push(asset.clone());
        }
        Ok(asset)
    }

    async fn remove(&self, url: &str) {
        if let Ok(mut removed) = self.removed.lock() {
            removed.push(url.to_string());
        }
    }
}

/// StorageState
///
/// The concrete type used to share the storage service across the application state.
pub type StorageState = Arc<dyn StorageService>;
