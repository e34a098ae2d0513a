use std::path::Path;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::Instrument;

use crate::application::ports::{
    BrokerError, Delivery, FileRelocator, JobLedger, LedgerError, MessageBroker, STATUS_QUEUE,
    Subscription, UPLOAD_QUEUE,
};
use crate::domain::{Job, JobUpdate, RelocationTask, StatusEvent};

/// Relocation tasks are handled strictly one at a time.
const WORKER_PREFETCH: usize = 1;

/// Singleton consumer that moves staged uploads into the vault tree.
///
/// A delivery is acknowledged only after its outcome is in the ledger. The
/// ledger doubles as the idempotency record: a redelivered task whose job is
/// already settled is acknowledged without touching the filesystem.
pub struct IngestionWorker {
    broker: Arc<dyn MessageBroker>,
    ledger: Arc<dyn JobLedger>,
    relocator: Arc<dyn FileRelocator>,
}

impl IngestionWorker {
    pub fn new(
        broker: Arc<dyn MessageBroker>,
        ledger: Arc<dyn JobLedger>,
        relocator: Arc<dyn FileRelocator>,
    ) -> Self {
        Self {
            broker,
            ledger,
            relocator,
        }
    }

    /// Consumes until `shutdown` flips, the broker closes, or the ledger
    /// becomes unwritable. The task in progress always runs to completion.
    pub async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), IngestionWorkerError> {
        let mut subscription = self.broker.subscribe(UPLOAD_QUEUE, WORKER_PREFETCH).await?;
        tracing::info!("Ingestion worker started");

        loop {
            if *shutdown.borrow() {
                break;
            }
            let next = tokio::select! {
                _ = shutdown.changed() => break,
                next = subscription.next() => next?,
            };
            let Some(delivery) = next else {
                break;
            };
            self.handle_delivery(&mut *subscription, delivery).await?;
        }

        tracing::info!("Ingestion worker stopped");
        Ok(())
    }

    pub async fn handle_delivery(
        &self,
        subscription: &mut dyn Subscription,
        delivery: Delivery,
    ) -> Result<(), IngestionWorkerError> {
        let task: RelocationTask = match serde_json::from_slice(&delivery.payload) {
            Ok(task) => task,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    tag = %delivery.tag,
                    "Dropping undecodable relocation task"
                );
                subscription.ack(&delivery).await?;
                return Ok(());
            }
        };

        let span = tracing::info_span!(
            "relocation_job",
            job_id = %task.job_id,
            redelivered = delivery.redelivered,
        );
        let job = self.process_task(&task).instrument(span).await?;

        self.publish_status(&job).await;
        subscription.ack(&delivery).await?;
        Ok(())
    }

    async fn process_task(&self, task: &RelocationTask) -> Result<Job, IngestionWorkerError> {
        let existing = self.ledger.get(task.job_id).await?;
        if let Some(job) = &existing {
            if job.status.is_terminal() {
                tracing::info!(status = %job.status, "Job already settled, skipping relocation");
                return Ok(job.clone());
            }
        }

        let update = if self.relocator.exists(&task.temp_path).await {
            self.relocate(task).await?
        } else {
            self.recover_missing_source(task, existing.as_ref()).await
        };

        let job = self.ledger.merge(task.job_id, update).await?;
        match &job.error {
            Some(error) => tracing::warn!(error = %error, "Relocation failed"),
            None => tracing::info!(file = ?job.file, "File relocated"),
        }
        Ok(job)
    }

    /// Collision resolution then move. Filesystem failures become a failed
    /// job; only ledger failures escape.
    async fn relocate(&self, task: &RelocationTask) -> Result<JobUpdate, IngestionWorkerError> {
        let final_path = match self.relocator.resolve_collision(&task.target_path).await {
            Ok(path) => path,
            Err(e) => return Ok(JobUpdate::failed(e.to_string())),
        };
        let file = display_name(&final_path);
        tracing::debug!(destination = %final_path.display(), "Target resolved");

        self.ledger
            .merge(task.job_id, JobUpdate::resolved_file(file.clone()))
            .await?;

        Ok(match self.relocator.relocate(&task.temp_path, &final_path).await {
            Ok(()) => JobUpdate::done(file),
            Err(e) => JobUpdate::failed(e.to_string()),
        })
    }

    /// A redelivery after a crash between the move and the ledger write finds
    /// the staged file gone; the name recorded before the move tells whether
    /// the move landed.
    async fn recover_missing_source(
        &self,
        task: &RelocationTask,
        existing: Option<&Job>,
    ) -> JobUpdate {
        let recorded = existing.and_then(|job| job.file.as_deref());
        let target_dir = task.target_path.parent();

        if let (Some(file), Some(dir)) = (recorded, target_dir) {
            if self.relocator.exists(&dir.join(file)).await {
                tracing::info!(file = %file, "Staged file already relocated");
                return JobUpdate::done(file);
            }
        }

        JobUpdate::failed(format!(
            "staged upload is missing: {}",
            task.temp_path.display()
        ))
    }

    async fn publish_status(&self, job: &Job) {
        let event = StatusEvent::from(job);
        let payload = match serde_json::to_vec(&event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to encode status event");
                return;
            }
        };
        if let Err(e) = self.broker.publish(STATUS_QUEUE, &payload).await {
            tracing::warn!(error = %e, job_id = %job.id, "Failed to publish status event");
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, thiserror::Error)]
pub enum IngestionWorkerError {
    #[error("broker: {0}")]
    Broker(#[from] BrokerError),
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}
