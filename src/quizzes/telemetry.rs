//! Analytics side-channel for the quizzes screen

use super::filter::ChipGroup;
use super::state::QuizzesTab;
use super::view::CtaLabel;

/// Receives user-interaction events; has no influence on view state
pub trait QuizzesTelemetry: Send + Sync {
    fn primary_cta_clicked(&self, quiz_id: &str, cta: CtaLabel);
    fn resume_clicked(&self, quiz_id: &str);
    fn track_opened(&self, track_id: &str);
    fn tab_selected(&self, _tab: QuizzesTab) {}
    fn filter_toggled(&self, _group: ChipGroup, _chip_id: &str) {}
}

/// Writes events to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl QuizzesTelemetry for TracingTelemetry {
    fn primary_cta_clicked(&self, quiz_id: &str, cta: CtaLabel) {
        tracing::info!(quiz_id, cta = cta.as_str(), "quiz primary cta clicked");
    }

    fn resume_clicked(&self, quiz_id: &str) {
        tracing::info!(quiz_id, "quiz resume clicked");
    }

    fn track_opened(&self, track_id: &str) {
        tracing::info!(track_id, "quiz track opened");
    }

    fn tab_selected(&self, tab: QuizzesTab) {
        tracing::debug!(tab = ?tab, "quizzes tab selected");
    }

    fn filter_toggled(&self, group: ChipGroup, chip_id: &str) {
        tracing::debug!(group = ?group, chip_id, "quiz filter toggled");
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl QuizzesTelemetry for NoopTelemetry {
    fn primary_cta_clicked(&self, _quiz_id: &str, _cta: CtaLabel) {}
    fn resume_clicked(&self, _quiz_id: &str) {}
    fn track_opened(&self, _track_id: &str) {}
}
