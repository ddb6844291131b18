//! Per-quiz view state

use std::fmt;

use serde::Serialize;

use crate::catalog::{QuizCatalog, QuizTopic};
use crate::prefs::{PreferencesSnapshot, QuizInProgressState, QuizProgress};

/// Label of a quiz card's primary button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CtaLabel {
    Start,
    Resume,
    Retake,
}

impl CtaLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CtaLabel::Start => "Start",
            CtaLabel::Resume => "Resume",
            CtaLabel::Retake => "Retake",
        }
    }
}

impl fmt::Display for CtaLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A quiz combined with the user's progress on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizUi {
    pub quiz: QuizTopic,
    pub best_score: Option<u32>,
    pub passed: bool,
    pub in_progress: bool,
    pub last_attempt_at: Option<i64>,
    pub is_saved: bool,
}

impl QuizUi {
    /// Derive the view for one quiz
    pub fn derive(
        quiz: &QuizTopic,
        progress: Option<&QuizProgress>,
        marker: Option<&QuizInProgressState>,
        is_saved: bool,
    ) -> Self {
        let best_score = progress.map(|p| p.best_score);
        let passed = best_score.is_some_and(|best| best as usize >= quiz.question_count());
        // An explicit started marker wins over any completed score
        let in_progress = marker.is_some();
        let last_attempt_at = progress
            .map(|p| p.last_attempt_at)
            .filter(|at| *at > 0)
            .or_else(|| marker.map(|m| m.updated_at));

        Self { quiz: quiz.clone(), best_score, passed, in_progress, last_attempt_at, is_saved }
    }

    pub fn id(&self) -> &str {
        &self.quiz.id
    }

    pub fn category(&self) -> &str {
        &self.quiz.category
    }

    pub fn question_count(&self) -> usize {
        self.quiz.question_count()
    }

    /// Completed means a positive passing bar that the best score reaches
    pub fn is_completed(&self) -> bool {
        let required = self.question_count();
        required > 0 && self.best_score.is_some_and(|best| best as usize >= required)
    }

    /// Primary button label: Resume, then Retake, then Start
    pub fn cta(&self) -> CtaLabel {
        if self.in_progress {
            CtaLabel::Resume
        } else if self.best_score.is_some() {
            CtaLabel::Retake
        } else {
            CtaLabel::Start
        }
    }
}

/// Derive a view for every quiz in catalog order
pub fn build_quiz_uis(catalog: &QuizCatalog, prefs: &PreferencesSnapshot) -> Vec<QuizUi> {
    catalog
        .quizzes
        .iter()
        .map(|quiz| {
            QuizUi::derive(
                quiz,
                prefs.quiz_progress.get(&quiz.id),
                prefs.quiz_in_progress.get(&quiz.id),
                prefs.is_saved(&quiz.id),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Level;
    use crate::catalog::model::tests::quiz;

    #[test]
    fn untouched_quiz_starts() {
        let q = quiz("Q1", "Basics", 2, Level::Low);
        let ui = QuizUi::derive(&q, None, None, false);
        assert_eq!(ui.best_score, None);
        assert!(!ui.passed);
        assert!(!ui.in_progress);
        assert_eq!(ui.last_attempt_at, None);
        assert_eq!(ui.cta(), CtaLabel::Start);
    }

    #[test]
    fn scored_quiz_offers_retake() {
        let q = quiz("Q1", "Basics", 2, Level::Low);
        let progress = QuizProgress { best_score: 2, last_score: 1, last_attempt_at: 50 };
        let ui = QuizUi::derive(&q, Some(&progress), None, false);
        assert!(ui.passed);
        assert_eq!(ui.last_attempt_at, Some(50));
        assert_eq!(ui.cta(), CtaLabel::Retake);
    }

    #[test]
    fn marker_wins_over_passed_score() {
        let q = quiz("Q1", "Basics", 2, Level::Low);
        let progress = QuizProgress { best_score: 2, last_score: 2, last_attempt_at: 50 };
        let marker = QuizInProgressState { updated_at: 70 };
        let ui = QuizUi::derive(&q, Some(&progress), Some(&marker), false);
        assert!(ui.passed);
        assert!(ui.in_progress);
        assert_eq!(ui.cta(), CtaLabel::Resume);
        // the completed attempt's timestamp still takes priority
        assert_eq!(ui.last_attempt_at, Some(50));
    }

    #[test]
    fn never_completed_uses_marker_time() {
        let q = quiz("Q1", "Basics", 2, Level::Low);
        let progress = QuizProgress { best_score: 0, last_score: 0, last_attempt_at: 0 };
        let marker = QuizInProgressState { updated_at: 70 };
        let ui = QuizUi::derive(&q, Some(&progress), Some(&marker), false);
        assert_eq!(ui.last_attempt_at, Some(70));
        assert!(!ui.passed);
    }

    #[test]
    fn partial_score_is_not_passed() {
        let q = quiz("Q1", "Basics", 3, Level::Low);
        let progress = QuizProgress { best_score: 2, last_score: 2, last_attempt_at: 1 };
        let ui = QuizUi::derive(&q, Some(&progress), None, true);
        assert!(!ui.passed);
        assert!(!ui.is_completed());
        assert!(ui.is_saved);
    }
}
