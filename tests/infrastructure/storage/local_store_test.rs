use std::io;

use bytes::Bytes;
use futures::stream;

use vaultd::application::ports::StagingStore;
use vaultd::domain::{JobId, StoragePath};
use vaultd::infrastructure::storage::LocalStagingStore;

fn create_test_store() -> (tempfile::TempDir, LocalStagingStore) {
    let dir = tempfile::TempDir::new().unwrap();
    let store = LocalStagingStore::new(dir.path().to_path_buf()).unwrap();
    (dir, store)
}

#[tokio::test]
async fn given_chunked_stream_when_storing_then_file_is_persisted_whole() {
    let (_dir, store) = create_test_store();
    let path = StoragePath::new(&JobId::new(), "test.txt");

    let chunks = vec![Ok(Bytes::from("hello ")), Ok(Bytes::from("world"))];
    let size = store
        .store(&path, Box::pin(stream::iter(chunks)))
        .await
        .unwrap();

    assert_eq!(size, 11);
    let local = store.local_path(&path).unwrap();
    assert_eq!(std::fs::read(local).unwrap(), b"hello world");
}

#[tokio::test]
async fn given_stored_file_when_deleting_then_staged_bytes_are_gone() {
    let (_dir, store) = create_test_store();
    let path = StoragePath::new(&JobId::new(), "test.txt");
    let chunks = vec![Ok(Bytes::from("data"))];
    store
        .store(&path, Box::pin(stream::iter(chunks)))
        .await
        .unwrap();
    let local = store.local_path(&path).unwrap();
    assert!(local.exists());

    store.delete(&path).await.unwrap();

    assert!(!local.exists());
}

#[tokio::test]
async fn given_stream_error_when_storing_then_returns_error_and_leaves_no_file() {
    let (_dir, store) = create_test_store();
    let path = StoragePath::new(&JobId::new(), "test.txt");

    let chunks: Vec<Result<Bytes, io::Error>> = vec![
        Ok(Bytes::from("partial")),
        Err(io::Error::new(
            io::ErrorKind::ConnectionReset,
            "client went away",
        )),
    ];
    let result = store.store(&path, Box::pin(stream::iter(chunks))).await;

    assert!(result.is_err());
    assert!(!store.local_path(&path).unwrap().exists());
}

#[tokio::test]
async fn given_storage_path_when_resolving_local_path_then_it_is_under_base_dir() {
    let (dir, store) = create_test_store();
    let path = StoragePath::new(&JobId::new(), "photo.jpg");

    let local = store.local_path(&path).unwrap();

    assert!(local.starts_with(dir.path().canonicalize().unwrap()));
    assert!(local.ends_with(path.as_str()));
}
