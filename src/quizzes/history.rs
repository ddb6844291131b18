//! Attempt history

use std::collections::HashMap;

use serde::Serialize;

use crate::catalog::{QuizCatalog, QuizTopic};
use crate::prefs::QuizAttemptRecord;

/// An attempt record joined with its quiz
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptUi {
    pub record: QuizAttemptRecord,
    pub quiz_title: String,
    pub category: String,
}

impl AttemptUi {
    /// Whether every question was answered correctly on this attempt
    pub fn is_perfect(&self) -> bool {
        self.record.total_questions > 0 && self.record.score >= self.record.total_questions
    }
}

/// Join attempts with the live catalog, newest first. Attempts on quizzes
/// that are no longer in the catalog are left out.
pub fn build_history(catalog: &QuizCatalog, attempts: &[QuizAttemptRecord]) -> Vec<AttemptUi> {
    let quizzes: HashMap<&str, &QuizTopic> = catalog.quizzes.iter().map(|q| (q.id.as_str(), q)).collect();

    let mut history: Vec<AttemptUi> = attempts
        .iter()
        .filter_map(|record| {
            let quiz = quizzes.get(record.quiz_id.as_str())?;
            Some(AttemptUi {
                record: record.clone(),
                quiz_title: quiz.title.clone(),
                category: quiz.category.clone(),
            })
        })
        .collect();

    history.sort_by(|a, b| b.record.completed_at.cmp(&a.record.completed_at));
    history
}
