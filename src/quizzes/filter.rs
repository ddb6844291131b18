//! Filter chips, sorting and category grouping

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::Serialize;

use super::view::QuizUi;
use crate::catalog::Level;

/// Which row of chips a chip belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChipGroup {
    Goal,
    Duration,
    Level,
    Sort,
}

/// Inclusive duration window in minutes; `max: None` is open-ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DurationRange {
    pub min: u32,
    pub max: Option<u32>,
}

impl DurationRange {
    pub const SHORT: DurationRange = DurationRange { min: 0, max: Some(5) };
    pub const MEDIUM: DurationRange = DurationRange { min: 6, max: Some(10) };
    pub const LONG: DurationRange = DurationRange { min: 11, max: None };

    /// The three buckets offered as chips
    pub const BUCKETS: [DurationRange; 3] = [Self::SHORT, Self::MEDIUM, Self::LONG];

    pub fn contains(&self, minutes: u32) -> bool {
        minutes >= self.min && self.max.is_none_or(|max| minutes <= max)
    }

    /// Stable chip id for the bucket
    pub fn chip_id(&self) -> &'static str {
        match *self {
            Self::SHORT => "short",
            Self::MEDIUM => "medium",
            Self::LONG => "long",
            _ => "custom",
        }
    }

    pub fn label(&self) -> String {
        match *self {
            Self::SHORT => "≤5".to_string(),
            Self::MEDIUM => "6–10".to_string(),
            Self::LONG => "10+".to_string(),
            DurationRange { min, max: Some(max) } => format!("{min}–{max}"),
            DurationRange { min, max: None } => format!("{min}+"),
        }
    }

    pub fn from_chip_id(id: &str) -> Option<Self> {
        Self::BUCKETS.into_iter().find(|bucket| bucket.chip_id().eq_ignore_ascii_case(id))
    }
}

/// Ordering applied before grouping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum SortOrder {
    #[default]
    Recommended,
    Shortest,
    Title,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Recommended, SortOrder::Shortest, SortOrder::Title];

    pub fn chip_id(&self) -> &'static str {
        match self {
            SortOrder::Recommended => "recommended",
            SortOrder::Shortest => "shortest",
            SortOrder::Title => "title",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::Recommended => "Recommended",
            SortOrder::Shortest => "Shortest first",
            SortOrder::Title => "A–Z",
        }
    }

    pub fn from_chip_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|order| order.chip_id().eq_ignore_ascii_case(id))
    }
}

/// Session-only filter selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterState {
    /// At most one goal tag
    pub goals: BTreeSet<String>,
    pub duration: Option<DurationRange>,
    /// At most one level
    pub levels: BTreeSet<Level>,
    pub sort: SortOrder,
}

impl FilterState {
    /// Toggle a chip. Chips in the goal, level and duration groups are
    /// mutually exclusive: picking another replaces the selection and
    /// picking the active one clears it. Returns whether anything changed.
    pub fn toggle(&mut self, group: ChipGroup, chip_id: &str) -> bool {
        match group {
            ChipGroup::Goal => toggle_exclusive(&mut self.goals, chip_id.to_string()),
            ChipGroup::Level => match chip_id.parse::<Level>() {
                Ok(level) => toggle_exclusive(&mut self.levels, level),
                Err(e) => {
                    tracing::debug!("Ignoring level chip: {}", e);
                    false
                }
            },
            ChipGroup::Duration => match DurationRange::from_chip_id(chip_id) {
                Some(range) if self.duration == Some(range) => {
                    self.duration = None;
                    true
                }
                Some(range) => {
                    self.duration = Some(range);
                    true
                }
                None => {
                    tracing::debug!("Ignoring unknown duration chip '{}'", chip_id);
                    false
                }
            },
            ChipGroup::Sort => match SortOrder::from_chip_id(chip_id) {
                Some(order) if self.sort == order => {
                    let changed = order != SortOrder::Recommended;
                    self.sort = SortOrder::Recommended;
                    changed
                }
                Some(order) => {
                    self.sort = order;
                    true
                }
                None => {
                    tracing::debug!("Ignoring unknown sort chip '{}'", chip_id);
                    false
                }
            },
        }
    }

    /// Whether any narrowing filter is selected
    pub fn is_active(&self) -> bool {
        !self.goals.is_empty() || self.duration.is_some() || !self.levels.is_empty()
    }

    /// Number of narrowing filters selected, for the filter button badge
    pub fn active_count(&self) -> usize {
        self.goals.len() + usize::from(self.duration.is_some()) + self.levels.len()
    }

    fn matches(&self, quiz: &QuizUi) -> bool {
        if !self.goals.is_empty() && !quiz.quiz.matches_any_tag(self.goals.iter()) {
            return false;
        }
        if let Some(range) = self.duration {
            if !range.contains(quiz.quiz.duration_minutes) {
                return false;
            }
        }
        if !self.levels.is_empty() && !self.levels.contains(&quiz.quiz.level) {
            return false;
        }
        true
    }
}

fn toggle_exclusive<T: Ord>(selected: &mut BTreeSet<T>, value: T) -> bool {
    let was_selected = selected.contains(&value);
    selected.clear();
    if !was_selected {
        selected.insert(value);
    }
    true
}

/// Quizzes sharing a category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuizGroup {
    pub category: String,
    pub quizzes: Vec<QuizUi>,
}

/// Result of running the filter engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOutcome {
    pub groups: Vec<QuizGroup>,
    /// Set when the filters matched nothing and the full list is shown instead
    pub fell_back: bool,
}

impl FilterOutcome {
    pub fn quiz_count(&self) -> usize {
        self.groups.iter().map(|g| g.quizzes.len()).sum()
    }
}

/// Saved first, then in progress, then not yet passed, then most recently
/// attempted; quizzes never attempted sort last
pub fn recommended_cmp(a: &QuizUi, b: &QuizUi) -> Ordering {
    b.is_saved
        .cmp(&a.is_saved)
        .then_with(|| b.in_progress.cmp(&a.in_progress))
        .then_with(|| a.passed.cmp(&b.passed))
        .then_with(|| {
            let a_at = a.last_attempt_at.unwrap_or(i64::MIN);
            let b_at = b.last_attempt_at.unwrap_or(i64::MIN);
            b_at.cmp(&a_at)
        })
}

/// Sort in place; stable, so ties keep catalog order
pub fn sort_quizzes(quizzes: &mut [QuizUi], order: SortOrder) {
    match order {
        SortOrder::Recommended => quizzes.sort_by(recommended_cmp),
        SortOrder::Shortest => quizzes.sort_by_key(|q| q.quiz.duration_minutes),
        SortOrder::Title => quizzes.sort_by_key(|q| q.quiz.title.to_lowercase()),
    }
}

/// Group an already-sorted list by category, categories in case-insensitive order
pub fn group_by_category(quizzes: Vec<QuizUi>) -> Vec<QuizGroup> {
    let mut groups: Vec<QuizGroup> = Vec::new();
    for quiz in quizzes {
        match groups.iter_mut().find(|g| g.category == quiz.quiz.category) {
            Some(group) => group.quizzes.push(quiz),
            None => groups.push(QuizGroup { category: quiz.quiz.category.clone(), quizzes: vec![quiz] }),
        }
    }
    groups.sort_by(|a, b| {
        a.category.to_lowercase().cmp(&b.category.to_lowercase()).then_with(|| a.category.cmp(&b.category))
    });
    groups
}

/// Filter, sort and group. If the filters leave nothing but the source is
/// non-empty, the whole source list is grouped instead.
pub fn apply_filters(filter: &FilterState, quizzes: &[QuizUi]) -> FilterOutcome {
    let mut matched: Vec<QuizUi> = quizzes.iter().filter(|q| filter.matches(q)).cloned().collect();

    let fell_back = matched.is_empty() && !quizzes.is_empty();
    if fell_back {
        tracing::debug!("Filters matched no quizzes, showing all {}", quizzes.len());
        matched = quizzes.to_vec();
    }

    sort_quizzes(&mut matched, filter.sort);
    FilterOutcome { groups: group_by_category(matched), fell_back }
}

/// A selectable chip
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterChip {
    pub group: ChipGroup,
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// Every chip row offered by the filter sheet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterChips {
    pub goals: Vec<FilterChip>,
    pub durations: Vec<FilterChip>,
    pub levels: Vec<FilterChip>,
    pub sorts: Vec<FilterChip>,
}

/// Derive the chip rows from the quizzes on offer and the current selection
pub fn available_chips(filter: &FilterState, quizzes: &[QuizUi]) -> FilterChips {
    let mut tags: Vec<&str> = quizzes.iter().flat_map(|q| q.quiz.all_tags()).collect();
    tags.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    tags.dedup();

    let levels: BTreeSet<Level> = quizzes.iter().map(|q| q.quiz.level).collect();

    FilterChips {
        goals: tags
            .into_iter()
            .map(|tag| FilterChip {
                group: ChipGroup::Goal,
                id: tag.to_string(),
                label: tag.to_string(),
                selected: filter.goals.contains(tag),
            })
            .collect(),
        durations: DurationRange::BUCKETS
            .iter()
            .map(|bucket| FilterChip {
                group: ChipGroup::Duration,
                id: bucket.chip_id().to_string(),
                label: bucket.label(),
                selected: filter.duration == Some(*bucket),
            })
            .collect(),
        levels: levels
            .into_iter()
            .map(|level| FilterChip {
                group: ChipGroup::Level,
                id: level.code().to_string(),
                label: level.label().to_string(),
                selected: filter.levels.contains(&level),
            })
            .collect(),
        sorts: SortOrder::ALL
            .iter()
            .map(|order| FilterChip {
                group: ChipGroup::Sort,
                id: order.chip_id().to_string(),
                label: order.label().to_string(),
                selected: filter.sort == *order,
            })
            .collect(),
    }
}
