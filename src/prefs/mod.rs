//! User preferences: saved quizzes, scores, in-progress markers and the attempt log

pub mod model;
pub mod store;
pub mod writer;

pub use model::{
    AttemptInput, PrefValue, PreferencesSnapshot, QuizAttemptRecord, QuizInProgressState,
    QuizProgress, now_millis,
};
pub use store::{PreferencesStore, Subscription};
pub use writer::PreferencesWriteQueue;

/// Write side of the preferences store as seen by the quizzes screen.
///
/// Calls are fire-and-forget: implementations report their own failures
/// and the caller never waits for or inspects the outcome.
pub trait PreferencesWriter: Send + Sync {
    /// Persist a quiz's bookmark flag
    fn dispatch_quiz_saved(&self, quiz_id: &str, saved: bool);
}
