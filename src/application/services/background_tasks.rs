use std::error::Error;

use tokio::task::{JoinError, JoinSet};

type BoxError = Box<dyn Error + Send + Sync>;
type Joined = Result<(&'static str, Result<(), BoxError>), JoinError>;

/// Long-running consumers spawned next to the HTTP server.
///
/// None of them is expected to return while the server is up, so the first
/// exit, clean or not, is reported as a [`BackgroundTaskError`].
#[derive(Default)]
pub struct BackgroundTasks {
    tasks: JoinSet<(&'static str, Result<(), BoxError>)>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F, E>(&mut self, name: &'static str, task: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Into<BoxError> + 'static,
    {
        self.tasks.spawn(async move { (name, task.await.map_err(Into::into)) });
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Resolves when the first task ends. Never resolves for an empty set.
    pub async fn first_exit(&mut self) -> BackgroundTaskError {
        match self.tasks.join_next().await {
            Some(joined) => exit_error(joined),
            None => std::future::pending().await,
        }
    }

    /// Waits for every remaining task, logging the ones that failed.
    pub async fn join_all(mut self) {
        while let Some(joined) = self.tasks.join_next().await {
            match joined {
                Ok((_, Ok(()))) => {}
                other => tracing::error!(error = %exit_error(other), "Background task failed"),
            }
        }
    }
}

fn exit_error(joined: Joined) -> BackgroundTaskError {
    match joined {
        Ok((name, Ok(()))) => BackgroundTaskError::Stopped { name },
        Ok((name, Err(source))) => BackgroundTaskError::Failed { name, source },
        Err(e) => BackgroundTaskError::Panicked(e),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackgroundTaskError {
    #[error("{name} stopped unexpectedly")]
    Stopped { name: &'static str },
    #[error("{name} failed: {source}")]
    Failed {
        name: &'static str,
        #[source]
        source: BoxError,
    },
    #[error("background task panicked: {0}")]
    Panicked(JoinError),
}
