//! Quiz catalog model
//!
//! Quizzes, tracks and the per-language catalog that bundles them. All of
//! these are immutable once loaded; a new language selection produces a
//! fresh catalog rather than mutating the current one.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QuizzesError;

/// Difficulty level of a quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    /// All levels, easiest first
    pub const ALL: [Level; 3] = [Level::Low, Level::Medium, Level::High];

    /// Single-letter code used by the content service
    pub fn code(&self) -> &'static str {
        match self {
            Level::Low => "L",
            Level::Medium => "M",
            Level::High => "H",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            Level::Low => "Beginner",
            Level::Medium => "Intermediate",
            Level::High => "Advanced",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Level {
    type Err = QuizzesError;

    /// Parse a level code, ignoring case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Level::ALL
            .into_iter()
            .find(|level| level.code().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| QuizzesError::UnknownLevel(s.to_string()))
    }
}

impl TryFrom<String> for Level {
    type Error = QuizzesError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        level.code().to_string()
    }
}

/// A single multiple-choice question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// Question text
    pub prompt: String,
    /// Answer options in display order
    pub options: Vec<String>,
    /// Zero-based index into `options`
    pub correct_index: usize,
}

impl QuizQuestion {
    /// Create a new question
    pub fn new(
        prompt: impl Into<String>,
        options: impl IntoIterator<Item = impl Into<String>>,
        correct_index: usize,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            options: options.into_iter().map(Into::into).collect(),
            correct_index,
        }
    }

    /// Check the option-count and answer-index invariants
    pub fn validate(&self) -> Result<(), String> {
        if self.options.len() < 2 {
            return Err(format!("question '{}' has fewer than two options", self.prompt));
        }
        if self.correct_index >= self.options.len() {
            return Err(format!(
                "question '{}' points at option {} of {}",
                self.prompt,
                self.correct_index,
                self.options.len()
            ));
        }
        Ok(())
    }

    /// Whether the given option index is the right answer
    pub fn is_correct(&self, option_index: usize) -> bool {
        option_index == self.correct_index
    }
}

/// A quiz topic as delivered by the content store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizTopic {
    /// Unique identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Optional one-paragraph summary
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Top-level category used for grouping
    #[serde(default)]
    pub category: String,
    /// Finer category shown under the title
    #[serde(default)]
    pub subcategory: String,
    /// Tracks this quiz belongs to
    #[serde(default)]
    pub track_ids: Vec<String>,
    /// Goal tags the quiz serves
    #[serde(default)]
    pub goal_tags: Vec<String>,
    /// Format label (e.g. "Quiz", "Scenario")
    #[serde(default)]
    pub format: String,
    /// Difficulty level
    pub level: Level,
    /// Estimated duration
    #[serde(default)]
    pub duration_minutes: u32,
    /// Questions in order
    pub questions: Vec<QuizQuestion>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl QuizTopic {
    /// Number of questions, which is also the passing score
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// Goal tags followed by free-form tags, without duplicates
    pub fn all_tags(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.goal_tags
            .iter()
            .chain(self.tags.iter())
            .map(String::as_str)
            .filter(|tag| seen.insert(*tag))
            .collect()
    }

    /// Whether any of the quiz's tags is in `wanted`
    pub fn matches_any_tag<'a>(&self, mut wanted: impl Iterator<Item = &'a String>) -> bool {
        let tags = self.all_tags();
        wanted.any(|w| tags.contains(&w.as_str()))
    }

    /// Check the data-model invariants for this quiz
    pub fn validate(&self) -> Result<(), QuizzesError> {
        if self.questions.is_empty() {
            return Err(QuizzesError::InvalidQuiz {
                quiz_id: self.id.clone(),
                reason: "quiz has no questions".into(),
            });
        }
        for question in &self.questions {
            question
                .validate()
                .map_err(|reason| QuizzesError::InvalidQuiz { quiz_id: self.id.clone(), reason })?;
        }
        Ok(())
    }
}

/// A named, ordered sequence of quizzes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizTrack {
    /// Unique identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Longer description
    #[serde(default)]
    pub description: String,
    /// Member quiz ids in order; unknown ids are skipped when resolving
    #[serde(default)]
    pub quiz_ids: Vec<String>,
    /// Declared duration, 0 when unset
    #[serde(default)]
    pub estimated_minutes: u32,
    /// Goal tag the track serves
    #[serde(default)]
    pub goal_tag: String,
    /// Category for display
    #[serde(default)]
    pub category: String,
}

/// Quizzes and tracks for one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizCatalog {
    /// Language code the catalog was produced for
    #[serde(default)]
    pub language: String,
    /// All quizzes
    #[serde(default)]
    pub quizzes: Vec<QuizTopic>,
    /// All tracks
    #[serde(default)]
    pub tracks: Vec<QuizTrack>,
}

impl QuizCatalog {
    /// Create an empty catalog for a language
    pub fn empty(language: impl Into<String>) -> Self {
        Self { language: language.into(), ..Default::default() }
    }

    /// A catalog counts as empty when it has no quizzes, whatever its tracks
    pub fn is_empty(&self) -> bool {
        self.quizzes.is_empty()
    }

    /// Find a quiz by id
    pub fn quiz(&self, id: &str) -> Option<&QuizTopic> {
        self.quizzes.iter().find(|q| q.id == id)
    }

    /// Find a track by id
    pub fn track(&self, id: &str) -> Option<&QuizTrack> {
        self.tracks.iter().find(|t| t.id == id)
    }

    /// Strict check used before deriving view state
    pub fn check(&self) -> Result<(), QuizzesError> {
        let mut ids = HashSet::new();
        for quiz in &self.quizzes {
            quiz.validate()?;
            if !ids.insert(quiz.id.as_str()) {
                return Err(QuizzesError::DuplicateQuiz(quiz.id.clone()));
            }
        }
        Ok(())
    }

    /// Drop quizzes that break invariants, keeping the first of any duplicate id
    pub fn sanitized(mut self) -> Self {
        let mut ids = HashSet::new();
        self.quizzes.retain(|quiz| {
            if let Err(e) = quiz.validate() {
                tracing::warn!("Dropping quiz from {} catalog: {}", self.language, e);
                return false;
            }
            if !ids.insert(quiz.id.clone()) {
                tracing::warn!("Dropping duplicate quiz '{}' from {} catalog", quiz.id, self.language);
                return false;
            }
            true
        });
        self
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn quiz(id: &str, category: &str, questions: usize, level: Level) -> QuizTopic {
        QuizTopic {
            id: id.into(),
            title: format!("Quiz {id}"),
            summary: None,
            category: category.into(),
            subcategory: String::new(),
            track_ids: Vec::new(),
            goal_tags: Vec::new(),
            format: "Quiz".into(),
            level,
            duration_minutes: 5,
            questions: (0..questions)
                .map(|i| QuizQuestion::new(format!("Question {i}"), ["Yes", "No"], 0))
                .collect(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn level_parses_case_insensitively() {
        assert_eq!("l".parse::<Level>().unwrap(), Level::Low);
        assert_eq!(" M ".parse::<Level>().unwrap(), Level::Medium);
        assert_eq!("H".parse::<Level>().unwrap(), Level::High);
        assert!("X".parse::<Level>().is_err());
    }

    #[test]
    fn level_round_trips_through_json_as_code() {
        let json = serde_json::to_string(&Level::Medium).unwrap();
        assert_eq!(json, "\"M\"");
        let level: Level = serde_json::from_str("\"h\"").unwrap();
        assert_eq!(level, Level::High);
    }

    #[test]
    fn question_validation_catches_bad_index() {
        let q = QuizQuestion::new("Pick", ["a", "b"], 2);
        assert!(q.validate().is_err());
        let q = QuizQuestion::new("Pick", ["a"], 0);
        assert!(q.validate().is_err());
        let q = QuizQuestion::new("Pick", ["a", "b"], 1);
        assert!(q.validate().is_ok());
        assert!(q.is_correct(1));
    }

    #[test]
    fn all_tags_merges_and_dedups() {
        let mut q = quiz("q1", "Basics", 1, Level::Low);
        q.goal_tags = vec!["visa".into(), "funds".into()];
        q.tags = vec!["funds".into(), "jobs".into()];
        assert_eq!(q.all_tags(), vec!["visa", "funds", "jobs"]);
    }

    #[test]
    fn quiz_without_questions_is_invalid() {
        let q = quiz("q1", "Basics", 0, Level::Low);
        assert!(matches!(q.validate(), Err(QuizzesError::InvalidQuiz { .. })));
    }

    #[test]
    fn check_rejects_duplicate_ids() {
        let catalog = QuizCatalog {
            language: "en".into(),
            quizzes: vec![quiz("q1", "A", 1, Level::Low), quiz("q1", "B", 1, Level::Low)],
            tracks: Vec::new(),
        };
        assert!(matches!(catalog.check(), Err(QuizzesError::DuplicateQuiz(id)) if id == "q1"));
    }

    #[test]
    fn sanitized_drops_invalid_and_duplicate_quizzes() {
        let catalog = QuizCatalog {
            language: "en".into(),
            quizzes: vec![
                quiz("q1", "A", 1, Level::Low),
                quiz("q2", "A", 0, Level::Low),
                quiz("q1", "B", 2, Level::High),
            ],
            tracks: Vec::new(),
        }
        .sanitized();
        assert_eq!(catalog.quizzes.len(), 1);
        assert_eq!(catalog.quizzes[0].category, "A");
        assert!(catalog.check().is_ok());
    }

    #[test]
    fn topic_deserializes_with_defaults() {
        let json = r#"{
            "id": "q1",
            "title": "What is EB-5?",
            "level": "l",
            "questions": [{"prompt": "p", "options": ["a", "b"], "correct_index": 1}]
        }"#;
        let topic: QuizTopic = serde_json::from_str(json).unwrap();
        assert_eq!(topic.level, Level::Low);
        assert_eq!(topic.question_count(), 1);
        assert!(topic.tags.is_empty());
        assert_eq!(topic.duration_minutes, 0);
    }
}
