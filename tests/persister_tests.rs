mod common;

use bytes::Bytes;
use common::{clean_pdf, jpeg_bytes};
use site_cms::upload::{
    AcceptedUpload, ContentClass, DiskStorage, MockStorageService, NamingPolicy, RawUpload,
    StorageService, UploadError,
    storage::{parse_url, public_url},
};
use std::collections::HashSet;
use std::sync::Arc;
use tempfile::TempDir;

fn accepted_jpeg(filename: &str) -> AcceptedUpload {
    RawUpload {
        field: "image".to_string(),
        filename: filename.to_string(),
        content_type: "image/jpeg".to_string(),
        class: ContentClass::Image,
        data: Bytes::from(jpeg_bytes()),
    }
    .accept()
    .unwrap()
}

fn accepted_pdf() -> AcceptedUpload {
    RawUpload {
        field: "pdf".to_string(),
        filename: "circular.pdf".to_string(),
        content_type: "application/pdf".to_string(),
        class: ContentClass::Document,
        data: Bytes::from(clean_pdf()),
    }
    .accept()
    .unwrap()
}

// --- Naming ---

#[test]
fn test_naming_policy_format() {
    let name = NamingPolicy::new("Gallery_").file_name(".jpg");
    let rest = name.strip_prefix("Gallery_").unwrap();
    let stem = rest.strip_suffix(".jpg").unwrap();
    let (millis, suffix) = stem.split_once('-').unwrap();

    assert!(millis.parse::<i64>().is_ok());
    assert_eq!(suffix.len(), 8);
    assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_naming_policy_from_label() {
    assert_eq!(NamingPolicy::from_label("Dr. Jane  Doe", "official_").prefix(), "dr_jane_doe_");
    assert_eq!(NamingPolicy::from_label("../../etc", "official_").prefix(), "etc_");
    assert_eq!(NamingPolicy::from_label("  ", "official_").prefix(), "official_");
    assert_eq!(NamingPolicy::from_label("Ünïcode", "official_").prefix(), "ncode_");
}

#[test]
fn test_url_helpers() {
    assert_eq!(public_url(ContentClass::Image, "a.jpg"), "/images/a.jpg");
    assert_eq!(public_url(ContentClass::Document, "b.pdf"), "/pdfs/b.pdf");

    assert_eq!(
        parse_url("/images/a.jpg"),
        Some((ContentClass::Image, "a.jpg"))
    );
    assert_eq!(
        parse_url("pdfs/b.pdf"),
        Some((ContentClass::Document, "b.pdf"))
    );
    assert_eq!(parse_url("/images/../secret.txt"), None);
    assert_eq!(parse_url("/images/.."), None);
    assert_eq!(parse_url("/images/nested/a.jpg"), None);
    assert_eq!(parse_url("/etc/passwd"), None);
    assert_eq!(parse_url("/images/"), None);
}

// --- Disk Storage ---

#[tokio::test]
async fn test_persist_jpeg_returns_relative_url_and_writes_bytes() {
    let root = TempDir::new().unwrap();
    let storage = DiskStorage::new(root.path());

    let asset = storage
        .persist(accepted_jpeg("campus.jpg"), NamingPolicy::new("Gallery_"))
        .await
        .unwrap();

    assert!(asset.url.starts_with("/images/Gallery_"));
    assert!(asset.url.ends_with(".jpg"));
    assert_eq!(asset.original_filename, "campus.jpg");
    assert_eq!(asset.size, jpeg_bytes().len() as u64);

    let on_disk = tokio::fs::read(root.path().join("images").join(&asset.filename))
        .await
        .unwrap();
    assert_eq!(on_disk, jpeg_bytes());
}

#[tokio::test]
async fn test_persist_creates_missing_roots() {
    let root = TempDir::new().unwrap();
    let nested = root.path().join("not").join("yet");
    let storage = DiskStorage::new(&nested);

    let asset = storage
        .persist(accepted_pdf(), NamingPolicy::new("Circular_"))
        .await
        .unwrap();

    assert!(asset.url.starts_with("/pdfs/Circular_"));
    assert!(nested.join("pdfs").join(&asset.filename).is_file());
}

#[tokio::test]
async fn test_ensure_roots_is_idempotent() {
    let root = TempDir::new().unwrap();
    let storage = DiskStorage::new(root.path());

    storage.ensure_roots().await.unwrap();
    storage.ensure_roots().await.unwrap();

    assert!(root.path().join("images").is_dir());
    assert!(root.path().join("pdfs").is_dir());
}

#[tokio::test]
async fn test_no_temporary_files_left_behind() {
    let root = TempDir::new().unwrap();
    let storage = DiskStorage::new(root.path());
    storage
        .persist(accepted_jpeg("a.jpg"), NamingPolicy::new("cover_"))
        .await
        .unwrap();

    let mut entries = tokio::fs::read_dir(root.path().join("images")).await.unwrap();
    while let Some(entry) = entries.next_entry().await.unwrap() {
        let name = entry.file_name().to_string_lossy().to_string();
        assert!(!name.starts_with('.'), "leftover temp file: {name}");
    }
}

#[tokio::test]
async fn test_concurrent_persists_never_collide() {
    let root = TempDir::new().unwrap();
    let storage = Arc::new(DiskStorage::new(root.path()));
    storage.ensure_roots().await.unwrap();

    let handles: Vec<_> = (0..64)
        .map(|_| {
            let storage = storage.clone();
            tokio::spawn(async move {
                storage
                    .persist(accepted_jpeg("same.jpg"), NamingPolicy::new("Gallery_"))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut names = HashSet::new();
    for handle in handles {
        names.insert(handle.await.unwrap().filename);
    }
    assert_eq!(names.len(), 64);

    let mut count = 0;
    let mut entries = tokio::fs::read_dir(root.path().join("images")).await.unwrap();
    while entries.next_entry().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 64);
}

#[tokio::test]
async fn test_persist_failure_is_storage_write_error() {
    let root = TempDir::new().unwrap();
    // A regular file where the images directory should be.
    tokio::fs::write(root.path().join("images"), b"not a dir")
        .await
        .unwrap();
    let storage = DiskStorage::new(root.path());

    let err = storage
        .persist(accepted_jpeg("a.jpg"), NamingPolicy::new("cover_"))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::StorageWriteError { .. }));
    assert_eq!(err.client_message(), "Failed to store uploaded file");
}

#[tokio::test]
async fn test_remove_deletes_and_tolerates_missing() {
    let root = TempDir::new().unwrap();
    let storage = DiskStorage::new(root.path());
    let asset = storage
        .persist(accepted_jpeg("a.jpg"), NamingPolicy::new("cover_"))
        .await
        .unwrap();
    let path = root.path().join("images").join(&asset.filename);
    assert!(path.exists());

    storage.remove(&asset.url).await;
    assert!(!path.exists());

    // Already gone: logged, not fatal.
    storage.remove(&asset.url).await;
}

#[tokio::test]
async fn test_remove_refuses_paths_outside_roots() {
    let root = TempDir::new().unwrap();
    let secret = root.path().join("secret.txt");
    tokio::fs::write(&secret, b"keep me").await.unwrap();

    let storage = DiskStorage::new(root.path());
    storage.ensure_roots().await.unwrap();
    storage.remove("/images/../secret.txt").await;

    assert!(secret.exists());
}

#[tokio::test]
async fn test_discard_removes_every_asset() {
    let root = TempDir::new().unwrap();
    let storage = DiskStorage::new(root.path());
    let a = storage
        .persist(accepted_jpeg("a.jpg"), NamingPolicy::new("cover_"))
        .await
        .unwrap();
    let b = storage
        .persist(accepted_pdf(), NamingPolicy::new("publication_"))
        .await
        .unwrap();

    storage.discard(&[a.clone(), b.clone()]).await;

    assert!(!root.path().join("images").join(&a.filename).exists());
    assert!(!root.path().join("pdfs").join(&b.filename).exists());
}

// --- Mock Storage ---

#[tokio::test]
async fn test_mock_storage_records_calls() {
    let storage = MockStorageService::new();
    let asset = storage
        .persist(accepted_jpeg("a.jpg"), NamingPolicy::new("cover_"))
        .await
        .unwrap();
    storage.remove(&asset.url).await;

    assert_eq!(storage.persisted().len(), 1);
    assert_eq!(storage.removed(), vec![asset.url]);

    let failing = MockStorageService::new_failing();
    let err = failing
        .persist(accepted_pdf(), NamingPolicy::new("Archive_"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "StorageWriteError");
}
