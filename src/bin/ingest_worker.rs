//! Standalone ingestion worker for deployments where the front door and the
//! worker share a Redis broker.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;

use vaultd::application::ports::JobLedger;
use vaultd::application::services::IngestionWorker;
use vaultd::infrastructure::broker::BrokerFactory;
use vaultd::infrastructure::observability::init_tracing;
use vaultd::infrastructure::persistence::FileJobLedger;
use vaultd::infrastructure::storage::LocalFileRelocator;
use vaultd::presentation::{BrokerProvider, Environment, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;
    init_tracing(&settings.tracing_config(environment), "ingest-worker");

    if settings.broker.provider == BrokerProvider::Memory {
        anyhow::bail!(
            "broker.provider is \"memory\"; the front door runs the worker in-process, \
             a standalone worker needs the redis broker"
        );
    }

    let broker = BrokerFactory::create(&settings.broker, &settings.broker.worker_consumer)
        .await
        .context("Failed to connect to the message broker")?;
    let ledger: Arc<dyn JobLedger> = Arc::new(
        FileJobLedger::open(settings.storage.ledger_dir())
            .await
            .context("Failed to open the job ledger")?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    tracing::info!(
        consumer = %settings.broker.worker_consumer,
        storage_root = %settings.storage.root.display(),
        "Starting ingestion worker"
    );

    IngestionWorker::new(broker, ledger, Arc::new(LocalFileRelocator::new()))
        .run(shutdown_rx)
        .await
        .context("Ingestion worker stopped with an error")?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, finishing current task");
}
