use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::watch;

use vaultd::application::ports::{CredentialVerifier, JobLedger, StagingStore};
use vaultd::application::services::{
    BackgroundTasks, IngestionWorker, StatusSubscriber, ThumbnailCache, UploadService,
};
use vaultd::infrastructure::auth::StaticCredentialVerifier;
use vaultd::infrastructure::broker::BrokerFactory;
use vaultd::infrastructure::imaging::ImageThumbnailer;
use vaultd::infrastructure::observability::init_tracing;
use vaultd::infrastructure::persistence::FileJobLedger;
use vaultd::infrastructure::storage::{LocalFileRelocator, LocalStagingStore};
use vaultd::presentation::{AppState, BrokerProvider, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;
    init_tracing(&settings.tracing_config(environment), "vaultd");

    let password = settings
        .auth
        .password
        .clone()
        .context("auth.password must be set (APP__AUTH__PASSWORD)")?;
    let credential_verifier: Arc<dyn CredentialVerifier> = Arc::new(
        StaticCredentialVerifier::new(settings.auth.username.clone(), password),
    );

    tokio::fs::create_dir_all(&settings.storage.root)
        .await
        .with_context(|| format!("Failed to create {}", settings.storage.root.display()))?;

    let broker = BrokerFactory::create(&settings.broker, &settings.broker.status_consumer)
        .await
        .context("Failed to connect to the message broker")?;
    let job_ledger: Arc<dyn JobLedger> = Arc::new(
        FileJobLedger::open(settings.storage.ledger_dir())
            .await
            .context("Failed to open the job ledger")?,
    );
    let staging_store: Arc<dyn StagingStore> =
        Arc::new(LocalStagingStore::new(settings.storage.staging_dir.clone())?);

    let upload_service = Arc::new(UploadService::new(
        staging_store,
        Arc::clone(&broker),
        Arc::clone(&job_ledger),
        settings.storage.root.clone(),
    ));

    let thumbnail_cache = Arc::new(ThumbnailCache::new(
        settings.storage.root.clone(),
        settings.thumbnails.cache_dir.clone(),
        Arc::new(ImageThumbnailer::new(
            settings.thumbnails.size,
            settings.thumbnails.size,
        )),
        settings.thumbnails.max_entries,
    ));
    thumbnail_cache
        .flush()
        .await
        .context("Failed to flush the thumbnail cache")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut background = BackgroundTasks::new();

    let subscriber = StatusSubscriber::new(Arc::clone(&broker), Arc::clone(&job_ledger));
    background.spawn("status subscriber", subscriber.run(shutdown_rx.clone()));

    if settings.broker.provider == BrokerProvider::Memory {
        tracing::info!("In-memory broker selected, running the ingestion worker in-process");
        let worker = IngestionWorker::new(
            Arc::clone(&broker),
            Arc::clone(&job_ledger),
            Arc::new(LocalFileRelocator::new()),
        );
        background.spawn("ingestion worker", worker.run(shutdown_rx.clone()));
    }

    let state = AppState {
        upload_service,
        job_ledger,
        thumbnail_cache,
        credential_verifier,
        recent_limit: settings.jobs.recent_limit,
        max_upload_bytes: settings.server.max_upload_bytes,
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, storage_root = %settings.storage.root.display(), "Listening");

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .into_future();

    // Uploads are only accepted while their consumers are alive.
    let outcome = tokio::select! {
        served = server => served.context("HTTP server failed"),
        exit = background.first_exit() => {
            tracing::error!(error = %exit, "Background task ended, shutting down");
            Err(anyhow::Error::new(exit))
        }
    };

    let _ = shutdown_tx.send(true);
    background.join_all().await;

    outcome?;
    tracing::info!("Shutdown complete");
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
    tracing::info!("Shutdown signal received");
}
