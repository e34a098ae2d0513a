use std::sync::Arc;

use vaultd::application::ports::{JobLedger, MessageBroker, STATUS_QUEUE, UPLOAD_QUEUE};
use vaultd::application::services::{IngestionWorker, IngestionWorkerError};
use vaultd::domain::{JobStatus, JobUpdate, RelocationTask, StatusEvent, VaultPath};
use vaultd::infrastructure::storage::LocalFileRelocator;

use crate::helpers::{DenyingRelocator, ReadOnlyLedger, TestVault, write_file};

#[tokio::test]
async fn given_photo_upload_when_worker_runs_then_file_lands_and_job_is_done() {
    let vault = TestVault::new().await;
    let service = vault.upload_service();
    let staged = vault.stage(&service, "photo.jpg", b"jpeg bytes").await;
    let accepted = service
        .enqueue(staged, &VaultPath::parse("photos").unwrap())
        .await
        .unwrap();

    vault.drain_uploads(&vault.worker()).await;

    let landed = vault.vault_file("photos/photo.jpg");
    assert_eq!(std::fs::read(&landed).unwrap(), b"jpeg bytes");
    let job = vault.ledger.get(accepted.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.file.as_deref(), Some("photo.jpg"));
    assert_eq!(std::fs::read_dir(&vault.staging_dir).unwrap().count(), 0);
}

#[tokio::test]
async fn given_existing_file_with_same_name_when_worker_runs_then_suffix_is_added() {
    let vault = TestVault::new().await;
    write_file(&vault.vault_file("photos/photo.jpg"), b"original");
    let service = vault.upload_service();
    let staged = vault.stage(&service, "photo.jpg", b"second").await;
    let accepted = service
        .enqueue(staged, &VaultPath::parse("photos").unwrap())
        .await
        .unwrap();

    vault.drain_uploads(&vault.worker()).await;

    assert_eq!(
        std::fs::read(vault.vault_file("photos/photo.jpg")).unwrap(),
        b"original"
    );
    assert_eq!(
        std::fs::read(vault.vault_file("photos/photo(1).jpg")).unwrap(),
        b"second"
    );
    let job = vault.ledger.get(accepted.job_id).await.unwrap().unwrap();
    assert_eq!(job.file.as_deref(), Some("photo(1).jpg"));
}

#[tokio::test]
async fn given_two_uploads_with_same_name_when_processed_then_both_are_kept() {
    let vault = TestVault::new().await;
    let service = vault.upload_service();
    for content in [b"first".as_slice(), b"second".as_slice()] {
        let staged = vault.stage(&service, "README", content).await;
        service.enqueue(staged, &VaultPath::default()).await.unwrap();
    }

    vault.drain_uploads(&vault.worker()).await;

    assert_eq!(std::fs::read(vault.vault_file("README")).unwrap(), b"first");
    assert_eq!(std::fs::read(vault.vault_file("README(1)")).unwrap(), b"second");
}

#[tokio::test]
async fn given_refused_move_when_worker_runs_then_job_fails_and_delivery_is_acked() {
    let vault = TestVault::new().await;
    let service = vault.upload_service();
    let staged = vault.stage(&service, "locked.txt", b"data").await;
    let accepted = service.enqueue(staged, &VaultPath::default()).await.unwrap();

    vault
        .drain_uploads(&vault.worker_with(Arc::new(DenyingRelocator)))
        .await;

    let job = vault.ledger.get(accepted.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.file.is_none());
    assert!(!vault.vault_file("locked.txt").exists());
    assert!(job.error.unwrap().contains("permission denied"));
    assert_eq!(vault.broker.pending(UPLOAD_QUEUE), 0);

    let mut events = vault.broker.subscribe(STATUS_QUEUE, 1).await.unwrap();
    let delivery = events.next().await.unwrap().unwrap();
    let event: StatusEvent = serde_json::from_slice(&delivery.payload).unwrap();
    assert_eq!(event.id, accepted.job_id);
    assert_eq!(event.status, JobStatus::Failed);
    assert!(event.file.is_none());
    assert!(event.error.is_some());
}

#[tokio::test]
async fn given_completed_job_when_task_is_redelivered_then_file_is_not_duplicated() {
    let vault = TestVault::new().await;
    let service = vault.upload_service();
    let staged = vault.stage(&service, "photo.jpg", b"jpeg").await;
    let accepted = service.enqueue(staged, &VaultPath::default()).await.unwrap();

    let mut subscription = vault.broker.subscribe(UPLOAD_QUEUE, 1).await.unwrap();
    let delivery = subscription.next().await.unwrap().unwrap();
    let payload = delivery.payload.clone();
    let worker = vault.worker();
    worker
        .handle_delivery(&mut *subscription, delivery)
        .await
        .unwrap();

    // Same task arrives again, as after a crash before the ack reached the broker.
    vault.broker.publish(UPLOAD_QUEUE, &payload).await.unwrap();
    let redelivery = subscription.next().await.unwrap().unwrap();
    worker
        .handle_delivery(&mut *subscription, redelivery)
        .await
        .unwrap();

    let names: Vec<_> = std::fs::read_dir(&vault.storage_root)
        .unwrap()
        .map(|e| e.unwrap().file_name())
        .collect();
    assert_eq!(names, vec!["photo.jpg"]);
    let job = vault.ledger.get(accepted.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Done);
}

#[tokio::test]
async fn given_crash_after_move_when_task_is_redelivered_then_job_completes_from_recorded_name() {
    let vault = TestVault::new().await;
    let service = vault.upload_service();
    let staged = vault.stage(&service, "clip.mp4", b"video").await;
    let accepted = service.enqueue(staged, &VaultPath::default()).await.unwrap();

    let mut subscription = vault.broker.subscribe(UPLOAD_QUEUE, 1).await.unwrap();
    let delivery = subscription.next().await.unwrap().unwrap();
    let task: RelocationTask = serde_json::from_slice(&delivery.payload).unwrap();

    // The previous worker recorded its chosen name and moved the file, then died.
    vault
        .ledger
        .merge(task.job_id, JobUpdate::resolved_file("clip.mp4"))
        .await
        .unwrap();
    std::fs::rename(&task.temp_path, &task.target_path).unwrap();

    vault
        .worker()
        .handle_delivery(&mut *subscription, delivery)
        .await
        .unwrap();

    let job = vault.ledger.get(accepted.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Done);
    assert_eq!(job.file.as_deref(), Some("clip.mp4"));
}

#[tokio::test]
async fn given_missing_staged_file_when_worker_runs_then_job_fails() {
    let vault = TestVault::new().await;
    let service = vault.upload_service();
    let staged = vault.stage(&service, "gone.txt", b"x").await;
    let accepted = service.enqueue(staged, &VaultPath::default()).await.unwrap();
    for entry in std::fs::read_dir(&vault.staging_dir).unwrap() {
        std::fs::remove_file(entry.unwrap().path()).unwrap();
    }

    vault.drain_uploads(&vault.worker()).await;

    let job = vault.ledger.get(accepted.job_id).await.unwrap().unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.error.unwrap().contains("staged upload is missing"));
}

#[tokio::test]
async fn given_undecodable_task_when_delivered_then_it_is_acked_and_dropped() {
    let vault = TestVault::new().await;
    vault.broker.publish(UPLOAD_QUEUE, b"not json").await.unwrap();

    vault.drain_uploads(&vault.worker()).await;

    assert_eq!(vault.broker.pending(UPLOAD_QUEUE), 0);
    assert_eq!(vault.broker.pending(STATUS_QUEUE), 0);
}

#[tokio::test]
async fn given_unwritable_ledger_when_worker_runs_then_delivery_stays_unacked() {
    let vault = TestVault::new().await;
    let service = vault.upload_service();
    let staged = vault.stage(&service, "photo.jpg", b"jpeg").await;
    service.enqueue(staged, &VaultPath::default()).await.unwrap();
    let worker = IngestionWorker::new(
        vault.broker.clone(),
        Arc::new(ReadOnlyLedger),
        Arc::new(LocalFileRelocator::new()),
    );

    {
        let mut subscription = vault.broker.subscribe(UPLOAD_QUEUE, 1).await.unwrap();
        let delivery = subscription.next().await.unwrap().unwrap();
        let result = worker.handle_delivery(&mut *subscription, delivery).await;
        assert!(matches!(result, Err(IngestionWorkerError::Ledger(_))));
    }

    let mut subscription = vault.broker.subscribe(UPLOAD_QUEUE, 1).await.unwrap();
    let redelivery = subscription.next().await.unwrap().unwrap();
    assert!(redelivery.redelivered);
    assert!(!vault.vault_file("photo.jpg").exists());
}

#[tokio::test]
async fn given_shutdown_signal_when_worker_is_idle_then_run_returns() {
    let vault = TestVault::new().await;
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let handle = tokio::spawn(vault.worker().run(shutdown_rx));

    shutdown_tx.send(true).unwrap();

    let result = tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
