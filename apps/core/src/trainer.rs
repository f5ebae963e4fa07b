use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{timeout, Duration};
use tracing::{error, info, instrument};

use crate::engine::Engine;
use crate::error::{AppError, Result};
use crate::nn::NetworkSummary;

/// Upper bound for a single retraining run.
const TRAINING_TIMEOUT: Duration = Duration::from_secs(30 * 60);

#[derive(Debug)]
enum TrainerMessage {
    Retrain {
        locale: String,
        responder: oneshot::Sender<Result<NetworkSummary>>,
    },
}

/// A handle to the background trainer.
///
/// Retraining runs on the blocking thread pool, one locale at a time, and
/// installs the new model only once it is trained and saved. Requests keep
/// being served by the previous model meanwhile.
#[derive(Clone)]
pub struct TrainerHandle {
    sender: mpsc::Sender<TrainerMessage>,
}

impl TrainerHandle {
    /// Spawns the trainer for `engine` and returns a handle to it.
    pub fn new(engine: Arc<Engine>) -> Self {
        let (sender, receiver) = mpsc::channel(8);
        let runner = TrainerRunner { receiver, engine };
        tokio::spawn(async move { runner.run().await });
        Self { sender }
    }

    /// Retrains `locale` and returns the summary of the installed network.
    #[instrument(skip(self))]
    pub async fn retrain(&self, locale: &str) -> Result<NetworkSummary> {
        let (send, recv) = oneshot::channel();
        let msg = TrainerMessage::Retrain {
            locale: locale.to_string(),
            responder: send,
        };
        self.sender
            .send(msg)
            .await
            .map_err(|e| AppError::Actor(e.to_string()))?;
        timeout(TRAINING_TIMEOUT, recv)
            .await?
            .map_err(|e| AppError::Actor(e.to_string()))?
    }
}

struct TrainerRunner {
    receiver: mpsc::Receiver<TrainerMessage>,
    engine: Arc<Engine>,
}

impl TrainerRunner {
    async fn run(mut self) {
        info!("Trainer started");
        while let Some(msg) = self.receiver.recv().await {
            match msg {
                TrainerMessage::Retrain { locale, responder } => {
                    let result = self.retrain(locale).await;
                    if let Err(e) = &result {
                        error!("Error retraining: {}", e);
                    }
                    let _ = responder.send(result);
                }
            }
        }
        info!("Trainer stopped");
    }

    async fn retrain(&self, locale: String) -> Result<NetworkSummary> {
        let engine = self.engine.clone();
        let training_locale = locale.clone();
        let snapshot = tokio::task::spawn_blocking(move || engine.train(&training_locale))
            .await
            .map_err(|e| AppError::Actor(format!("Training task failed: {}", e)))??;

        let model = self.engine.install(&locale, snapshot);
        info!("Installed the retrained {} model", locale);
        Ok(model.network.summary())
    }
}
