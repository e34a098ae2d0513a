use std::sync::Arc;

use tokio::sync::watch;

use crate::application::ports::{BrokerError, JobLedger, LedgerError, MessageBroker, STATUS_QUEUE};
use crate::domain::{JobUpdate, StatusEvent};

const STATUS_PREFETCH: usize = 1;

/// Front-door consumer of worker status events.
///
/// Each event is merged into the ledger before it is acknowledged. The merge
/// is monotonic, so an event for a job the worker already settled is a no-op
/// and the two writers converge on the same record whatever order they land in.
pub struct StatusSubscriber {
    broker: Arc<dyn MessageBroker>,
    ledger: Arc<dyn JobLedger>,
}

impl StatusSubscriber {
    pub fn new(broker: Arc<dyn MessageBroker>, ledger: Arc<dyn JobLedger>) -> Self {
        Self { broker, ledger }
    }

    pub async fn run(
        self,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), StatusSubscriberError> {
        let mut subscription = self.broker.subscribe(STATUS_QUEUE, STATUS_PREFETCH).await?;
        tracing::info!("Status subscriber started");

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

            match serde_json::from_slice::<StatusEvent>(&delivery.payload) {
                Ok(event) => {
                    let job = self.ledger.merge(event.id, JobUpdate::from(&event)).await?;
                    tracing::debug!(job_id = %job.id, status = %job.status, "Status event applied");
                }
                Err(e) => tracing::warn!(error = %e, "Dropping undecodable status event"),
            }
            subscription.ack(&delivery).await?;
        }

        tracing::info!("Status subscriber stopped");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StatusSubscriberError {
    #[error("broker: {0}")]
    Broker(#[from] BrokerError),
    #[error("ledger: {0}")]
    Ledger(#[from] LedgerError),
}
