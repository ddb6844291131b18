//! Background delivery of preference writes
//!
//! Flushing the store touches disk and runs every observer, so callers on
//! the quizzes worker hand writes to [`PreferencesWriteQueue`] instead of
//! calling the store directly. A single task drains the queue in dispatch
//! order and performs each write on tokio's blocking pool.

use tokio::sync::{mpsc, oneshot};

use super::PreferencesWriter;
use super::store::PreferencesStore;
use crate::error::PrefsError;

enum WriteOp {
    QuizSaved { quiz_id: String, saved: bool },
    Flushed(oneshot::Sender<()>),
}

/// [`PreferencesWriter`] that queues writes for a background task
#[derive(Debug, Clone)]
pub struct PreferencesWriteQueue {
    sender: mpsc::UnboundedSender<WriteOp>,
}

impl PreferencesWriteQueue {
    /// Start the writer task; must be called from within a tokio runtime.
    /// The task exits once every clone of the queue is dropped.
    pub fn spawn(store: PreferencesStore) -> Self {
        let (sender, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(store, rx));
        Self { sender }
    }

    /// Wait until every write dispatched before this call has been applied
    pub async fn flushed(&self) -> Result<(), PrefsError> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(WriteOp::Flushed(tx)).map_err(|_| PrefsError::WriterGone)?;
        rx.await.map_err(|_| PrefsError::WriterGone)
    }
}

impl PreferencesWriter for PreferencesWriteQueue {
    fn dispatch_quiz_saved(&self, quiz_id: &str, saved: bool) {
        let op = WriteOp::QuizSaved { quiz_id: quiz_id.to_string(), saved };
        if self.sender.send(op).is_err() {
            tracing::warn!("Preferences writer stopped, bookmark for '{}' was not saved", quiz_id);
        }
    }
}

async fn run(store: PreferencesStore, mut rx: mpsc::UnboundedReceiver<WriteOp>) {
    while let Some(op) = rx.recv().await {
        match op {
            WriteOp::QuizSaved { quiz_id, saved } => {
                let store = store.clone();
                let written = tokio::task::spawn_blocking(move || {
                    store.set_quiz_saved(&quiz_id, saved).map_err(|e| (quiz_id, e))
                })
                .await;

                match written {
                    Ok(Ok(())) => {}
                    Ok(Err((quiz_id, e))) => {
                        tracing::warn!("Saving bookmark for '{}' did not persist: {}", quiz_id, e);
                    }
                    Err(e) => tracing::error!("Preferences write task failed: {}", e),
                }
            }
            WriteOp::Flushed(done) => {
                done.send(()).ok();
            }
        }
    }
    tracing::debug!("Preferences writer stopped");
}
