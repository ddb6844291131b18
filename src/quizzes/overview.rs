//! Track progress, certificate eligibility and category/overall progress

use std::collections::HashMap;

use serde::Serialize;

use super::view::QuizUi;
use crate::catalog::{QuizCatalog, QuizTrack};

/// Completed-out-of-total counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub completed: usize,
    pub total: usize,
}

impl ProgressSummary {
    /// Completion ratio in 0.0..=1.0; an empty summary is 0.0
    pub fn fraction(&self) -> f32 {
        if self.total == 0 { 0.0 } else { self.completed as f32 / self.total as f32 }
    }

    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0).round() as u8
    }
}

/// A track with its resolved member quizzes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackUi {
    pub track: QuizTrack,
    pub quizzes: Vec<QuizUi>,
    pub completed: usize,
    pub total: usize,
    pub certificate_available: bool,
    pub duration_minutes: u32,
}

impl TrackUi {
    pub fn id(&self) -> &str {
        &self.track.id
    }

    pub fn progress(&self) -> ProgressSummary {
        ProgressSummary { completed: self.completed, total: self.total }
    }

    /// First member quiz not yet completed
    pub fn next_quiz(&self) -> Option<&QuizUi> {
        self.quizzes.iter().find(|q| !q.is_completed())
    }
}

/// Resolve every track against the current quizzes, dropping unknown
/// member ids and tracks left with no members
pub fn build_tracks(catalog: &QuizCatalog, quizzes: &[QuizUi]) -> Vec<TrackUi> {
    let by_id: HashMap<&str, &QuizUi> = quizzes.iter().map(|q| (q.id(), q)).collect();

    catalog
        .tracks
        .iter()
        .filter_map(|track| {
            let members: Vec<QuizUi> = track
                .quiz_ids
                .iter()
                .filter_map(|id| by_id.get(id.as_str()).map(|q| (*q).clone()))
                .collect();
            if members.is_empty() {
                tracing::debug!("Hiding track '{}' with no resolvable quizzes", track.id);
                return None;
            }

            let completed = members.iter().filter(|q| q.is_completed()).count();
            let total = members.len();
            let duration_minutes = if track.estimated_minutes > 0 {
                track.estimated_minutes
            } else {
                members.iter().map(|q| q.quiz.duration_minutes).sum()
            };

            Some(TrackUi {
                track: track.clone(),
                quizzes: members,
                completed,
                total,
                certificate_available: completed == total,
                duration_minutes,
            })
        })
        .collect()
}

/// Completion within one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryProgress {
    pub category: String,
    pub completed: usize,
    pub total: usize,
}

/// Per-category completion, keyed case-sensitively and listed case-insensitively
pub fn category_progress(quizzes: &[QuizUi]) -> Vec<CategoryProgress> {
    let mut rows: Vec<CategoryProgress> = Vec::new();
    for quiz in quizzes {
        let index = match rows.iter().position(|r| r.category == quiz.category()) {
            Some(index) => index,
            None => {
                rows.push(CategoryProgress { category: quiz.category().to_string(), completed: 0, total: 0 });
                rows.len() - 1
            }
        };
        let row = &mut rows[index];
        row.total += 1;
        if quiz.is_completed() {
            row.completed += 1;
        }
    }

    rows.sort_by(|a, b| {
        a.category.to_lowercase().cmp(&b.category.to_lowercase()).then_with(|| a.category.cmp(&b.category))
    });
    rows
}

/// Overall progress as the sum of the category rows
pub fn overall_progress(categories: &[CategoryProgress]) -> ProgressSummary {
    categories.iter().fold(ProgressSummary::default(), |acc, row| ProgressSummary {
        completed: acc.completed + row.completed,
        total: acc.total + row.total,
    })
}
