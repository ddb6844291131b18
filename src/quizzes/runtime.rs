//! Background worker driving a [`QuizzesAggregator`]
//!
//! Intents are queued on an unbounded channel and applied strictly in
//! arrival order by a single task, so every recompute sees a consistent
//! pair of catalog and preferences. Each new state is published on a
//! watch channel.

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{QuizzesAggregator, QuizzesIntent, QuizzesUiState};
use crate::error::QuizzesError;
use crate::prefs::{PreferencesStore, Subscription};

enum Msg {
    Intent(QuizzesIntent),
    Snapshot(oneshot::Sender<QuizzesUiState>),
}

/// Handle to a running quizzes worker
pub struct QuizzesHandle {
    sender: mpsc::UnboundedSender<Msg>,
    state: watch::Receiver<QuizzesUiState>,
    cancel_token: CancellationToken,
    worker: Option<JoinHandle<()>>,
    prefs_subscription: Option<Subscription>,
}

impl QuizzesHandle {
    /// Move the aggregator onto a tokio task
    pub fn spawn(aggregator: QuizzesAggregator) -> Self {
        let (sender, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(aggregator.state().clone());
        let cancel_token = CancellationToken::new();

        let worker = tokio::spawn(run(aggregator, rx, state_tx, cancel_token.clone()));

        Self { sender, state, cancel_token, worker: Some(worker), prefs_subscription: None }
    }

    /// Queue an intent
    pub fn send(&self, intent: QuizzesIntent) -> Result<(), QuizzesError> {
        self.sender.send(Msg::Intent(intent)).map_err(|_| QuizzesError::WorkerGone)
    }

    /// Forward every preferences snapshot to the worker, starting with the current one.
    ///
    /// Replaces any earlier subscription.
    pub fn observe_preferences(&mut self, store: &PreferencesStore) {
        let sender = self.sender.clone();
        let subscription = store.observe(move |snapshot| {
            let intent = QuizzesIntent::PreferencesChanged(snapshot.clone());
            if sender.send(Msg::Intent(intent)).is_err() {
                tracing::debug!("Quizzes worker gone, dropping preferences snapshot");
            }
        });
        self.prefs_subscription = Some(subscription);
    }

    /// State after every intent queued before this call has been applied
    pub async fn current(&self) -> Result<QuizzesUiState, QuizzesError> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(Msg::Snapshot(tx)).map_err(|_| QuizzesError::WorkerGone)?;
        rx.await.map_err(|_| QuizzesError::WorkerGone)
    }

    /// Most recently published state, without waiting for queued intents
    pub fn latest(&self) -> QuizzesUiState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified whenever the state changes
    pub fn subscribe(&self) -> watch::Receiver<QuizzesUiState> {
        self.state.clone()
    }

    /// Stop the worker and wait for it to exit
    pub async fn shutdown(&mut self) {
        self.prefs_subscription = None;
        self.cancel_token.cancel();
        if let Some(worker) = self.worker.take() {
            if let Err(e) = worker.await {
                tracing::error!("Quizzes worker panicked: {}", e);
            }
        }
    }
}

impl Drop for QuizzesHandle {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

async fn run(
    mut aggregator: QuizzesAggregator,
    mut rx: mpsc::UnboundedReceiver<Msg>,
    state_tx: watch::Sender<QuizzesUiState>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::debug!("Quizzes worker cancelled");
                break;
            }

            msg = rx.recv() => {
                let Some(msg) = msg else {
                    break;
                };
                match msg {
                    Msg::Intent(intent) => {
                        aggregator.apply(intent);
                        state_tx.send_if_modified(|published| {
                            if *published == *aggregator.state() {
                                return false;
                            }
                            *published = aggregator.state().clone();
                            true
                        });
                    }
                    Msg::Snapshot(resp) => {
                        resp.send(aggregator.state().clone()).ok();
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::model::tests::quiz;
    use crate::catalog::{Level, QuizCatalog, seed_catalog};
    use crate::config::AppContext;
    use crate::prefs::PreferencesWriteQueue;
    use crate::quizzes::{NoopTelemetry, QuizzesTab};

    fn spawn_with(store: &PreferencesStore) -> (QuizzesHandle, PreferencesWriteQueue) {
        let writes = PreferencesWriteQueue::spawn(store.clone());
        let aggregator = QuizzesAggregator::new(
            AppContext::new("en"),
            seed_catalog("en"),
            Arc::new(writes.clone()),
            Arc::new(NoopTelemetry),
        );
        let mut handle = QuizzesHandle::spawn(aggregator);
        handle.observe_preferences(store);
        (handle, writes)
    }

    fn single_quiz_catalog() -> QuizCatalog {
        QuizCatalog {
            language: "en".into(),
            quizzes: vec![quiz("Q1", "Basics", 2, Level::Low)],
            tracks: Vec::new(),
        }
    }

    #[tokio::test]
    async fn intents_apply_in_order() {
        let store = PreferencesStore::in_memory();
        let (handle, _writes) = spawn_with(&store);

        handle.send(QuizzesIntent::CatalogLoaded(single_quiz_catalog())).unwrap();
        handle.send(QuizzesIntent::SelectTab(QuizzesTab::History)).unwrap();
        handle.send(QuizzesIntent::SelectTab(QuizzesTab::Saved)).unwrap();

        let state = handle.current().await.unwrap();
        assert!(!state.using_seed_catalog);
        assert_eq!(state.quizzes.len(), 1);
        assert_eq!(state.selected_tab, QuizzesTab::Saved);
    }

    #[tokio::test]
    async fn bookmark_round_trips_through_store() {
        let store = PreferencesStore::in_memory();
        let (handle, writes) = spawn_with(&store);

        handle.send(QuizzesIntent::CatalogLoaded(single_quiz_catalog())).unwrap();
        handle.send(QuizzesIntent::ToggleSaved { quiz_id: "Q1".into(), saved: true }).unwrap();

        let state = handle.current().await.unwrap();
        assert!(state.quiz("Q1").unwrap().is_saved);

        writes.flushed().await.unwrap();
        assert!(store.snapshot().is_saved("Q1"));
        assert!(handle.current().await.unwrap().quiz("Q1").unwrap().is_saved);
    }

    #[tokio::test]
    #[allow(clippy::await_holding_lock)]
    async fn save_intent_does_not_wait_for_the_write() {
        let store = PreferencesStore::in_memory();
        let (handle, writes) = spawn_with(&store);
        handle.send(QuizzesIntent::CatalogLoaded(single_quiz_catalog())).unwrap();
        handle.current().await.unwrap();

        let busy = store.lock_values();
        handle.send(QuizzesIntent::ToggleSaved { quiz_id: "Q1".into(), saved: true }).unwrap();
        handle.send(QuizzesIntent::SelectTab(QuizzesTab::Saved)).unwrap();

        // The worker keeps answering while the durable write is stuck
        let state = handle.current().await.unwrap();
        assert!(state.quiz("Q1").unwrap().is_saved);
        assert_eq!(state.selected_tab, QuizzesTab::Saved);
        drop(busy);

        writes.flushed().await.unwrap();
        assert!(store.snapshot().is_saved("Q1"));
    }

    #[tokio::test]
    async fn external_preference_writes_reach_state() {
        let store = PreferencesStore::in_memory();
        let (handle, _writes) = spawn_with(&store);
        handle.send(QuizzesIntent::CatalogLoaded(single_quiz_catalog())).unwrap();

        store.mark_quiz_started("Q1", 42).unwrap();

        let state = handle.current().await.unwrap();
        let ui = state.quiz("Q1").unwrap();
        assert!(ui.in_progress);
        assert_eq!(state.continue_quiz.as_ref().map(|q| q.id()), Some("Q1"));
    }

    #[tokio::test]
    async fn subscribers_see_published_state() {
        let store = PreferencesStore::in_memory();
        let (handle, _writes) = spawn_with(&store);
        let mut rx = handle.subscribe();

        handle.send(QuizzesIntent::SelectTab(QuizzesTab::Tracks)).unwrap();
        rx.wait_for(|state| state.selected_tab == QuizzesTab::Tracks).await.unwrap();
        assert_eq!(handle.latest().selected_tab, QuizzesTab::Tracks);
    }

    #[tokio::test]
    async fn shutdown_stops_worker_and_unsubscribes() {
        let store = PreferencesStore::in_memory();
        let (mut handle, _writes) = spawn_with(&store);
        assert_eq!(store.observer_count(), 1);

        handle.shutdown().await;

        assert_eq!(store.observer_count(), 0);
        assert!(matches!(
            handle.send(QuizzesIntent::ResetFilters),
            Err(QuizzesError::WorkerGone)
        ));
        assert!(matches!(handle.current().await, Err(QuizzesError::WorkerGone)));
    }
}
