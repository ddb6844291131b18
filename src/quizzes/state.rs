//! Quizzes screen state definitions

use serde::Serialize;

use super::filter::{self, FilterChips, FilterState, QuizGroup};
use super::history::{self, AttemptUi};
use super::overview::{self, CategoryProgress, ProgressSummary, TrackUi};
use super::view::{self, QuizUi};
use crate::catalog::{CatalogSource, QuizCatalog};
use crate::error::QuizzesError;
use crate::prefs::PreferencesSnapshot;

/// Which tab of the quizzes screen is showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum QuizzesTab {
    #[default]
    Explore,
    Tracks,
    Saved,
    History,
}

impl QuizzesTab {
    pub const ALL: [QuizzesTab; 4] =
        [QuizzesTab::Explore, QuizzesTab::Tracks, QuizzesTab::Saved, QuizzesTab::History];

    pub fn label(&self) -> &'static str {
        match self {
            QuizzesTab::Explore => "Explore",
            QuizzesTab::Tracks => "Tracks",
            QuizzesTab::Saved => "Saved",
            QuizzesTab::History => "History",
        }
    }
}

/// Everything the presentation layer renders for the quizzes screen.
///
/// Rebuilt from scratch on every change; never patched in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuizzesUiState {
    /// Language of the catalog in use
    pub language: String,
    /// Whether the bundled seed catalog is in use
    pub using_seed_catalog: bool,

    pub selected_tab: QuizzesTab,
    pub filter: FilterState,
    pub filter_sheet_visible: bool,
    pub chips: FilterChips,

    /// Every quiz in recommended order
    pub quizzes: Vec<QuizUi>,
    /// Filtered, sorted quizzes grouped by category
    pub groups: Vec<QuizGroup>,
    /// The filters matched nothing and `groups` holds everything
    pub filters_fell_back: bool,

    /// Bookmarked quizzes in recommended order
    pub saved: Vec<QuizUi>,
    /// Most recently touched quiz that was started but not finished
    pub continue_quiz: Option<QuizUi>,

    pub tracks: Vec<TrackUi>,
    pub categories: Vec<CategoryProgress>,
    pub overall: ProgressSummary,
    pub history: Vec<AttemptUi>,
}

/// Inputs to a full recompute
pub struct StateInputs<'a> {
    pub catalog: &'a QuizCatalog,
    pub source: CatalogSource,
    pub prefs: &'a PreferencesSnapshot,
    pub filter: &'a FilterState,
    pub tab: QuizzesTab,
    pub filter_sheet_visible: bool,
}

impl QuizzesUiState {
    /// Derive the complete screen state from the catalog and preferences
    pub fn derive(inputs: StateInputs<'_>) -> Result<Self, QuizzesError> {
        let StateInputs { catalog, source, prefs, filter, tab, filter_sheet_visible } = inputs;
        catalog.check()?;

        let mut quizzes = view::build_quiz_uis(catalog, prefs);
        filter::sort_quizzes(&mut quizzes, filter::SortOrder::Recommended);

        let outcome = filter::apply_filters(filter, &quizzes);
        let chips = filter::available_chips(filter, &quizzes);

        let saved: Vec<QuizUi> = quizzes.iter().filter(|q| q.is_saved).cloned().collect();
        let continue_quiz = quizzes
            .iter()
            .filter(|q| q.in_progress)
            .max_by_key(|q| q.last_attempt_at.unwrap_or(i64::MIN))
            .cloned();

        let tracks = overview::build_tracks(catalog, &quizzes);
        let categories = overview::category_progress(&quizzes);
        let overall = overview::overall_progress(&categories);
        let history = history::build_history(catalog, &prefs.quiz_attempts);

        Ok(Self {
            language: catalog.language.clone(),
            using_seed_catalog: source == CatalogSource::Seed,
            selected_tab: tab,
            filter: filter.clone(),
            filter_sheet_visible,
            chips,
            quizzes,
            groups: outcome.groups,
            filters_fell_back: outcome.fell_back,
            saved,
            continue_quiz,
            tracks,
            categories,
            overall,
            history,
        })
    }

    /// Look up a quiz view by id
    pub fn quiz(&self, quiz_id: &str) -> Option<&QuizUi> {
        self.quizzes.iter().find(|q| q.id() == quiz_id)
    }

    /// Look up a track view by id
    pub fn track(&self, track_id: &str) -> Option<&TrackUi> {
        self.tracks.iter().find(|t| t.id() == track_id)
    }
}
