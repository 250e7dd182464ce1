use axum::body::Bytes;
use portfolio_api::{
    LocalDiskStorage,
    storage::{LOCAL_IMAGE_PREFIX, StorageService},
    upload::UploadedImage,
};
use std::path::PathBuf;
use uuid::Uuid;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("portfolio-storage-{}", Uuid::new_v4()))
}

fn png() -> UploadedImage {
    UploadedImage {
        file_name: Some("avatar.PNG".to_string()),
        content_type: "image/png".to_string(),
        bytes: Bytes::from_static(b"\x89PNG-bytes"),
    }
}

#[tokio::test]
async fn local_storage_saves_and_deletes() {
    let root = scratch_dir();
    let storage = LocalDiskStorage::new(&root);
    storage.ensure_ready().await.unwrap();

    let path = storage.save_image(&png()).await.unwrap();
    assert!(path.starts_with(LOCAL_IMAGE_PREFIX));
    assert!(path.ends_with(".png"));

    let file = root.join("images").join(path.trim_start_matches(LOCAL_IMAGE_PREFIX));
    assert_eq!(tokio::fs::read(&file).await.unwrap(), b"\x89PNG-bytes");

    storage.delete(&path).await.unwrap();
    assert!(!file.exists());

    // Deleting again is not an error.
    storage.delete(&path).await.unwrap();

    tokio::fs::remove_dir_all(&root).await.ok();
}

#[tokio::test]
async fn local_storage_ignores_foreign_and_traversal_paths() {
    let root = scratch_dir();
    let storage = LocalDiskStorage::new(&root);
    storage.ensure_ready().await.unwrap();

    let outside = root.join("keep.txt");
    tokio::fs::write(&outside, b"keep").await.unwrap();

    storage.delete("https://cdn.example.com/pic.png").await.unwrap();
    storage.delete("").await.unwrap();
    storage
        .delete(&format!("{LOCAL_IMAGE_PREFIX}../keep.txt"))
        .await
        .unwrap();

    assert!(outside.exists());
    tokio::fs::remove_dir_all(&root).await.ok();
}
