//! Quizzes screen: catalog and progress aggregation
//!
//! [`QuizzesAggregator`] owns the screen state. It takes catalog snapshots,
//! preference snapshots and user intents one at a time, and after each one
//! rebuilds [`QuizzesUiState`] from the full source collections.

pub mod filter;
pub mod history;
pub mod overview;
pub mod runtime;
pub mod state;
pub mod telemetry;
pub mod view;

use std::sync::Arc;

use crate::catalog::{CatalogLoader, QuizCatalog};
use crate::config::AppContext;
use crate::error::QuizzesError;
use crate::prefs::{PreferencesSnapshot, PreferencesWriter};

pub use filter::{ChipGroup, DurationRange, FilterChip, FilterState, QuizGroup, SortOrder};
pub use overview::{CategoryProgress, ProgressSummary, TrackUi};
pub use runtime::QuizzesHandle;
pub use state::{QuizzesTab, QuizzesUiState};
pub use telemetry::{NoopTelemetry, QuizzesTelemetry, TracingTelemetry};
pub use view::{CtaLabel, QuizUi};

use state::StateInputs;

/// Everything that can change the quizzes screen
#[derive(Debug, Clone)]
pub enum QuizzesIntent {
    /// New catalog snapshot from the content store
    CatalogLoaded(QuizCatalog),
    /// New preferences snapshot
    PreferencesChanged(PreferencesSnapshot),
    /// The user picked another content language
    LanguageChanged(String),
    SelectTab(QuizzesTab),
    ToggleFilterChip { group: ChipGroup, chip_id: String },
    ResetFilters,
    ToggleSaved { quiz_id: String, saved: bool },
    PrimaryCtaClicked { quiz_id: String, cta: CtaLabel },
    ResumeClicked { quiz_id: String },
    TrackOpened { track_id: String },
    SetFilterSheetVisible(bool),
}

/// State container for the quizzes screen
pub struct QuizzesAggregator {
    context: AppContext,
    loader: CatalogLoader,
    prefs: PreferencesSnapshot,
    filter: FilterState,
    tab: QuizzesTab,
    filter_sheet_visible: bool,
    state: QuizzesUiState,
    writer: Arc<dyn PreferencesWriter>,
    telemetry: Arc<dyn QuizzesTelemetry>,
}

impl QuizzesAggregator {
    /// Create an aggregator working from `seed` until a catalog arrives
    pub fn new(
        context: AppContext,
        seed: QuizCatalog,
        writer: Arc<dyn PreferencesWriter>,
        telemetry: Arc<dyn QuizzesTelemetry>,
    ) -> Self {
        let mut aggregator = Self {
            context,
            loader: CatalogLoader::new(seed),
            prefs: PreferencesSnapshot::default(),
            filter: FilterState::default(),
            tab: QuizzesTab::default(),
            filter_sheet_visible: false,
            state: QuizzesUiState::default(),
            writer,
            telemetry,
        };
        aggregator.recompute_or_seed();
        aggregator
    }

    /// Current screen state
    pub fn state(&self) -> &QuizzesUiState {
        &self.state
    }

    /// Active context
    pub fn context(&self) -> &AppContext {
        &self.context
    }

    /// Handle one intent, recomputing as needed
    pub fn apply(&mut self, intent: QuizzesIntent) {
        match intent {
            QuizzesIntent::CatalogLoaded(catalog) => self.on_catalog(catalog),
            QuizzesIntent::PreferencesChanged(snapshot) => self.on_preferences(snapshot),
            QuizzesIntent::LanguageChanged(language) => self.set_language(language),
            QuizzesIntent::SelectTab(tab) => self.select_tab(tab),
            QuizzesIntent::ToggleFilterChip { group, chip_id } => {
                self.toggle_filter_chip(group, &chip_id)
            }
            QuizzesIntent::ResetFilters => self.reset_filters(),
            QuizzesIntent::ToggleSaved { quiz_id, saved } => self.toggle_saved(&quiz_id, saved),
            QuizzesIntent::PrimaryCtaClicked { quiz_id, cta } => {
                self.record_primary_cta_click(&quiz_id, cta)
            }
            QuizzesIntent::ResumeClicked { quiz_id } => self.record_resume_click(&quiz_id),
            QuizzesIntent::TrackOpened { track_id } => self.record_track_open(&track_id),
            QuizzesIntent::SetFilterSheetVisible(visible) => self.set_filter_sheet_visible(visible),
        }
    }

    /// Take a catalog snapshot; catalogs for another language are ignored
    pub fn on_catalog(&mut self, catalog: QuizCatalog) {
        if !catalog.language.is_empty() && catalog.language != self.context.language {
            tracing::debug!(
                "Ignoring {} catalog while showing {}",
                catalog.language,
                self.context.language
            );
            return;
        }
        self.loader.observe_external(catalog);
        self.recompute();
    }

    /// Take a preferences snapshot
    pub fn on_preferences(&mut self, snapshot: PreferencesSnapshot) {
        self.prefs = snapshot;
        self.recompute();
    }

    /// Switch language; the seed catalog is shown until the new catalog arrives
    pub fn set_language(&mut self, language: String) {
        if language == self.context.language {
            return;
        }
        tracing::info!("Switching quizzes language to {}", language);
        self.loader.reset_for_language(&language);
        self.context.language = language;
        self.filter = FilterState::default();
        self.recompute();
    }

    pub fn select_tab(&mut self, tab: QuizzesTab) {
        self.telemetry.tab_selected(tab);
        self.tab = tab;
        self.recompute();
    }

    pub fn toggle_filter_chip(&mut self, group: ChipGroup, chip_id: &str) {
        self.telemetry.filter_toggled(group, chip_id);
        if self.filter.toggle(group, chip_id) {
            self.recompute();
        }
    }

    pub fn reset_filters(&mut self) {
        self.filter = FilterState::default();
        self.recompute();
    }

    /// Bookmark a quiz. The screen updates at once; the durable write is
    /// dispatched afterwards and not awaited.
    pub fn toggle_saved(&mut self, quiz_id: &str, saved: bool) {
        if saved {
            self.prefs.saved_quiz_ids.insert(quiz_id.to_string());
        } else {
            self.prefs.saved_quiz_ids.remove(quiz_id);
        }
        self.recompute();
        self.writer.dispatch_quiz_saved(quiz_id, saved);
    }

    pub fn record_primary_cta_click(&self, quiz_id: &str, cta: CtaLabel) {
        self.telemetry.primary_cta_clicked(quiz_id, cta);
    }

    pub fn record_resume_click(&self, quiz_id: &str) {
        self.telemetry.resume_clicked(quiz_id);
    }

    pub fn record_track_open(&self, track_id: &str) {
        self.telemetry.track_opened(track_id);
    }

    pub fn set_filter_sheet_visible(&mut self, visible: bool) {
        if self.filter_sheet_visible != visible {
            self.filter_sheet_visible = visible;
            self.recompute();
        }
    }

    fn derive(&mut self) -> Result<QuizzesUiState, QuizzesError> {
        self.loader.resolve();
        QuizzesUiState::derive(StateInputs {
            catalog: self.loader.current(),
            source: self.loader.source(),
            prefs: &self.prefs,
            filter: &self.filter,
            tab: self.tab,
            filter_sheet_visible: self.filter_sheet_visible,
        })
    }

    /// Rebuild the state, keeping the previous one if derivation fails
    fn recompute(&mut self) {
        match self.derive() {
            Ok(state) => self.state = state,
            Err(e) => {
                tracing::error!(
                    language = %self.context.language,
                    "Failed to rebuild quizzes state, keeping previous state: {}",
                    e
                );
            }
        }
    }

    /// First computation: with no previous state to keep, fall back to the
    /// seed catalog, and to an empty state if even that fails
    fn recompute_or_seed(&mut self) {
        match self.derive() {
            Ok(state) => self.state = state,
            Err(e) => {
                tracing::error!("Failed to build initial quizzes state: {}", e);
                let seed = self.loader.seed().clone();
                self.state = QuizzesUiState::derive(StateInputs {
                    catalog: &seed,
                    source: crate::catalog::CatalogSource::Seed,
                    prefs: &self.prefs,
                    filter: &self.filter,
                    tab: self.tab,
                    filter_sheet_visible: self.filter_sheet_visible,
                })
                .unwrap_or_else(|e| {
                    tracing::error!("Seed catalog is unusable: {}", e);
                    QuizzesUiState {
                        language: self.context.language.clone(),
                        using_seed_catalog: true,
                        selected_tab: self.tab,
                        ..Default::default()
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::catalog::model::tests::quiz;
    use crate::catalog::{Level, QuizTrack, seed_catalog};
    use crate::prefs::{QuizAttemptRecord, QuizInProgressState, QuizProgress};

    #[derive(Default)]
    struct RecordingWriter {
        writes: Mutex<Vec<(String, bool)>>,
    }

    impl PreferencesWriter for RecordingWriter {
        fn dispatch_quiz_saved(&self, quiz_id: &str, saved: bool) {
            self.writes.lock().unwrap().push((quiz_id.to_string(), saved));
        }
    }

    #[derive(Default)]
    struct RecordingTelemetry {
        events: Mutex<Vec<String>>,
    }

    impl QuizzesTelemetry for RecordingTelemetry {
        fn primary_cta_clicked(&self, quiz_id: &str, cta: CtaLabel) {
            self.events.lock().unwrap().push(format!("cta:{quiz_id}:{cta}"));
        }
        fn resume_clicked(&self, quiz_id: &str) {
            self.events.lock().unwrap().push(format!("resume:{quiz_id}"));
        }
        fn track_opened(&self, track_id: &str) {
            self.events.lock().unwrap().push(format!("track:{track_id}"));
        }
    }

    fn catalog(quizzes: Vec<crate::catalog::QuizTopic>) -> QuizCatalog {
        QuizCatalog { language: "en".into(), quizzes, tracks: Vec::new() }
    }

    fn aggregator() -> (QuizzesAggregator, Arc<RecordingWriter>) {
        let writer = Arc::new(RecordingWriter::default());
        let aggregator = QuizzesAggregator::new(
            AppContext::new("en"),
            seed_catalog("en"),
            writer.clone(),
            Arc::new(NoopTelemetry),
        );
        (aggregator, writer)
    }

    #[test]
    fn starts_from_seed_catalog() {
        let (aggregator, _) = aggregator();
        let state = aggregator.state();
        assert!(state.using_seed_catalog);
        assert_eq!(state.quizzes.len(), seed_catalog("en").quizzes.len());
        assert!(!state.groups.is_empty());
        assert!(!state.tracks.is_empty());
    }

    #[test]
    fn end_to_end_single_quiz() {
        let (mut aggregator, writer) = aggregator();
        aggregator.on_catalog(catalog(vec![quiz("Q1", "Basics", 2, Level::Low)]));

        let ui = aggregator.state().quiz("Q1").unwrap().clone();
        assert_eq!(ui.best_score, None);
        assert!(!ui.passed);
        assert!(!ui.in_progress);
        assert_eq!(ui.last_attempt_at, None);
        assert_eq!(ui.cta(), CtaLabel::Start);
        assert!(!aggregator.state().using_seed_catalog);

        aggregator.toggle_saved("Q1", true);
        assert!(aggregator.state().quiz("Q1").unwrap().is_saved);
        assert_eq!(aggregator.state().saved.len(), 1);
        assert_eq!(*writer.writes.lock().unwrap(), vec![("Q1".to_string(), true)]);
    }

    #[test]
    fn unsave_removes_from_saved_list() {
        let (mut aggregator, writer) = aggregator();
        aggregator.on_catalog(catalog(vec![quiz("Q1", "Basics", 2, Level::Low)]));
        aggregator.toggle_saved("Q1", true);
        aggregator.toggle_saved("Q1", false);

        assert!(aggregator.state().saved.is_empty());
        assert_eq!(writer.writes.lock().unwrap().len(), 2);
    }

    #[test]
    fn empty_catalog_keeps_accepted_baseline() {
        let (mut aggregator, _) = aggregator();
        aggregator.on_catalog(catalog(vec![quiz("Q1", "Basics", 2, Level::Low)]));
        aggregator.on_catalog(catalog(Vec::new()));

        assert_eq!(aggregator.state().quizzes.len(), 1);
        assert!(!aggregator.state().using_seed_catalog);
    }

    #[test]
    fn catalog_for_other_language_is_ignored() {
        let (mut aggregator, _) = aggregator();
        let mut other = catalog(vec![quiz("Q1", "Basics", 2, Level::Low)]);
        other.language = "zh".into();
        aggregator.on_catalog(other);
        assert!(aggregator.state().using_seed_catalog);
    }

    #[test]
    fn language_change_returns_to_seed_until_catalog_arrives() {
        let (mut aggregator, _) = aggregator();
        aggregator.on_catalog(catalog(vec![quiz("Q1", "Basics", 2, Level::Low)]));
        aggregator.toggle_filter_chip(ChipGroup::Level, "L");

        aggregator.apply(QuizzesIntent::LanguageChanged("zh".into()));
        let state = aggregator.state();
        assert!(state.using_seed_catalog);
        assert_eq!(state.language, "en");
        assert_eq!(aggregator.context().language, "zh");
        assert!(!state.filter.is_active());

        let mut zh = catalog(vec![quiz("Z1", "基础", 1, Level::Low)]);
        zh.language = "zh".into();
        aggregator.on_catalog(zh);
        assert_eq!(aggregator.state().quizzes[0].id(), "Z1");
    }

    #[test]
    fn preferences_drive_progress_views() {
        let (mut aggregator, _) = aggregator();
        let mut cat = catalog(vec![
            quiz("a", "Basics", 2, Level::Low),
            quiz("b", "Basics", 2, Level::Low),
        ]);
        cat.tracks.push(QuizTrack {
            id: "t".into(),
            title: "Track".into(),
            description: String::new(),
            quiz_ids: vec!["a".into(), "b".into(), "missing".into()],
            estimated_minutes: 0,
            goal_tag: String::new(),
            category: String::new(),
        });
        aggregator.on_catalog(cat);

        let mut prefs = PreferencesSnapshot::default();
        prefs.quiz_progress.insert("a".into(), QuizProgress { best_score: 2, last_score: 2, last_attempt_at: 10 });
        prefs.quiz_in_progress.insert("b".into(), QuizInProgressState { updated_at: 20 });
        prefs.quiz_attempts.push(QuizAttemptRecord {
            id: "x".into(),
            quiz_id: "a".into(),
            track_id: Some("t".into()),
            score: 2,
            total_questions: 2,
            level: Level::Low,
            duration_minutes: 5,
            completed_at: 10,
        });
        aggregator.apply(QuizzesIntent::PreferencesChanged(prefs));

        let state = aggregator.state();
        assert_eq!(state.overall, ProgressSummary { completed: 1, total: 2 });
        assert_eq!(state.tracks[0].completed, 1);
        assert_eq!(state.tracks[0].total, 2);
        assert_eq!(state.tracks[0].duration_minutes, 10);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.continue_quiz.as_ref().map(|q| q.id()), Some("b"));
        assert_eq!(state.quizzes[0].id(), "b");
    }

    #[test]
    fn filters_and_tabs_flow_into_state() {
        let (mut aggregator, _) = aggregator();
        aggregator.on_catalog(catalog(vec![
            quiz("a", "Basics", 2, Level::Low),
            quiz("b", "Funds", 2, Level::High),
        ]));

        aggregator.apply(QuizzesIntent::ToggleFilterChip { group: ChipGroup::Level, chip_id: "h".into() });
        aggregator.apply(QuizzesIntent::SelectTab(QuizzesTab::Saved));
        aggregator.apply(QuizzesIntent::SetFilterSheetVisible(true));

        let state = aggregator.state();
        assert_eq!(state.groups.len(), 1);
        assert_eq!(state.groups[0].category, "Funds");
        assert_eq!(state.selected_tab, QuizzesTab::Saved);
        assert!(state.filter_sheet_visible);

        aggregator.apply(QuizzesIntent::ResetFilters);
        assert_eq!(aggregator.state().groups.len(), 2);
    }

    #[test]
    fn telemetry_intents_do_not_touch_state() {
        let telemetry = Arc::new(RecordingTelemetry::default());
        let mut aggregator = QuizzesAggregator::new(
            AppContext::new("en"),
            seed_catalog("en"),
            Arc::new(RecordingWriter::default()),
            telemetry.clone(),
        );
        let before = aggregator.state().clone();

        aggregator.apply(QuizzesIntent::PrimaryCtaClicked { quiz_id: "q".into(), cta: CtaLabel::Start });
        aggregator.apply(QuizzesIntent::ResumeClicked { quiz_id: "q".into() });
        aggregator.apply(QuizzesIntent::TrackOpened { track_id: "t".into() });

        assert_eq!(aggregator.state(), &before);
        assert_eq!(*telemetry.events.lock().unwrap(), vec!["cta:q:Start", "resume:q", "track:t"]);
    }

    #[test]
    fn failed_recompute_keeps_previous_state() {
        let (mut aggregator, _) = aggregator();
        aggregator.on_catalog(catalog(vec![quiz("a", "Basics", 2, Level::Low)]));
        let before = aggregator.state().clone();

        // A duplicate id can only get this far through the seed slot
        let mut broken = catalog(vec![quiz("a", "Basics", 2, Level::Low)]);
        broken.quizzes.push(quiz("a", "Other", 2, Level::Low));
        aggregator.loader = CatalogLoader::new(broken);
        aggregator.select_tab(QuizzesTab::Tracks);

        assert_eq!(aggregator.state().quizzes, before.quizzes);
        assert_eq!(aggregator.state().selected_tab, before.selected_tab);
    }

    #[test]
    fn unusable_seed_yields_empty_state() {
        let mut bad_seed = seed_catalog("en");
        bad_seed.quizzes[0].questions.clear();
        let aggregator = QuizzesAggregator::new(
            AppContext::new("en"),
            bad_seed,
            Arc::new(RecordingWriter::default()),
            Arc::new(NoopTelemetry),
        );
        let state = aggregator.state();
        assert!(state.quizzes.is_empty());
        assert!(state.groups.is_empty());
        assert!(state.tracks.is_empty());
        assert_eq!(state.language, "en");
    }
}
