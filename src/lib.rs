//! EB-5 Guide - catalog and progress core for the EB-5 learning app
//!
//! Combines the localized quiz catalog with the user's saved quizzes,
//! scores and attempt history into the state the quizzes screen renders.

pub mod catalog;
pub mod config;
pub mod error;
pub mod prefs;
pub mod quizzes;

pub use catalog::{BundledContentStore, ContentStore, QuizCatalog};
pub use config::{AppContext, Config};
pub use prefs::PreferencesStore;
pub use quizzes::{QuizzesAggregator, QuizzesHandle, QuizzesIntent, QuizzesUiState};
