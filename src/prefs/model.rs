//! Progress records and the preferences snapshot

use std::collections::{BTreeSet, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::catalog::Level;

/// Key prefix for saved-quiz flags
pub const SAVED_PREFIX: &str = "quiz.saved.";
/// Key prefix for best scores
pub const BEST_PREFIX: &str = "quiz.best.";
/// Key prefix for last scores
pub const LAST_PREFIX: &str = "quiz.last.";
/// Key prefix for last-attempt timestamps
pub const LAST_AT_PREFIX: &str = "quiz.last_at.";
/// Key prefix for in-progress markers
pub const IN_PROGRESS_PREFIX: &str = "quiz.in_progress.";
/// Key holding the JSON-encoded attempt log
pub const ATTEMPTS_KEY: &str = "quiz.attempts";

/// A scalar preference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i32),
    Long(i64),
    Str(String),
}

impl PrefValue {
    /// Name of the scalar type, for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PrefValue::Bool(_) => "bool",
            PrefValue::Int(_) => "int",
            PrefValue::Long(_) => "long",
            PrefValue::Str(_) => "string",
        }
    }
}

/// Per-quiz score history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizProgress {
    /// Best score ever achieved
    pub best_score: u32,
    /// Score of the most recent attempt
    pub last_score: u32,
    /// Time of the most recent attempt (ms since epoch, 0 = never)
    pub last_attempt_at: i64,
}

/// Marker for an attempt that was started but not finished
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizInProgressState {
    /// When the attempt was last touched (ms since epoch)
    pub updated_at: i64,
}

/// One completed quiz attempt; never modified after it is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAttemptRecord {
    /// Unique attempt id
    pub id: String,
    /// Quiz that was attempted
    pub quiz_id: String,
    /// Track the attempt was started from, if any
    #[serde(default)]
    pub track_id: Option<String>,
    /// Correct answers
    pub score: u32,
    /// Questions in the quiz at the time
    pub total_questions: u32,
    /// Quiz level at the time
    pub level: Level,
    /// Quiz duration at the time
    #[serde(default)]
    pub duration_minutes: u32,
    /// Completion time (ms since epoch)
    pub completed_at: i64,
}

/// Data needed to log a finished attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptInput {
    pub quiz_id: String,
    pub track_id: Option<String>,
    pub score: u32,
    pub total_questions: u32,
    pub level: Level,
    pub duration_minutes: u32,
    pub completed_at: i64,
}

/// Everything the quizzes screen reads from preferences
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreferencesSnapshot {
    pub quiz_progress: HashMap<String, QuizProgress>,
    pub saved_quiz_ids: BTreeSet<String>,
    pub quiz_attempts: Vec<QuizAttemptRecord>,
    pub quiz_in_progress: HashMap<String, QuizInProgressState>,
}

impl PreferencesSnapshot {
    /// Whether a quiz is bookmarked
    pub fn is_saved(&self, quiz_id: &str) -> bool {
        self.saved_quiz_ids.contains(quiz_id)
    }
}

/// Current time in milliseconds since the Unix epoch
pub fn now_millis() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as i64).unwrap_or(0)
}
