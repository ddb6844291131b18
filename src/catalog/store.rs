//! Content store boundary
//!
//! The aggregator never talks to the content service directly; it receives
//! typed records from a [`ContentStore`]. [`BundledContentStore`] serves
//! JSON assets laid out per language:
//!
//! ```text
//! <root>/<lang>/quizzes.json
//! <root>/<lang>/articles.json
//! <root>/<lang>/projects.json
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::de::DeserializeOwned;

use super::blocks::{Article, Project};
use super::model::QuizCatalog;
use crate::error::ContentError;

/// Source of localized content records
pub trait ContentStore: Send + Sync {
    /// Quiz catalog for a language; an empty catalog is a valid answer
    fn quiz_catalog(&self, language: &str) -> Result<QuizCatalog, ContentError>;

    /// Articles for a language
    fn articles(&self, language: &str) -> Result<Vec<Article>, ContentError>;

    /// Investment projects for a language
    fn projects(&self, language: &str) -> Result<Vec<Project>, ContentError>;

    /// Quiz catalog with every failure mapped to an empty catalog, so the
    /// caller's fallback policy takes over
    fn quiz_catalog_or_empty(&self, language: &str) -> QuizCatalog {
        match self.quiz_catalog(language) {
            Ok(catalog) => catalog,
            Err(e) if e.is_missing() => {
                tracing::debug!("{}", e);
                QuizCatalog::empty(language)
            }
            Err(e) => {
                tracing::warn!("Failed to load quiz catalog: {}", e);
                QuizCatalog::empty(language)
            }
        }
    }
}

/// Content served from bundled JSON files with an in-memory cache
#[derive(Debug)]
pub struct BundledContentStore {
    root: PathBuf,
    catalogs: Mutex<HashMap<String, QuizCatalog>>,
}

impl BundledContentStore {
    /// Create a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into(), catalogs: Mutex::new(HashMap::new()) }
    }

    /// Root directory of the bundled assets
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Drop every cached catalog
    pub fn clear_cache(&self) {
        if let Ok(mut cache) = self.catalogs.lock() {
            cache.clear();
        }
    }

    fn asset_path(&self, language: &str, file: &str) -> PathBuf {
        self.root.join(language).join(file)
    }

    fn read_json<T: DeserializeOwned>(
        &self,
        language: &str,
        kind: &'static str,
    ) -> Result<T, ContentError> {
        let path = self.asset_path(language, &format!("{kind}.json"));
        if !path.exists() {
            return Err(ContentError::NotFound { kind, language: language.to_string() });
        }

        let contents = fs::read_to_string(&path)
            .map_err(|source| ContentError::Io { path: path.clone(), source })?;
        serde_json::from_str(&contents).map_err(|source| ContentError::Parse { path, source })
    }
}

impl ContentStore for BundledContentStore {
    fn quiz_catalog(&self, language: &str) -> Result<QuizCatalog, ContentError> {
        if let Some(cached) = self.catalogs.lock().ok().and_then(|c| c.get(language).cloned()) {
            return Ok(cached);
        }

        let mut catalog: QuizCatalog = self.read_json(language, "quizzes")?;
        if catalog.language.is_empty() {
            catalog.language = language.to_string();
        }
        tracing::debug!("Loaded {} quizzes for '{}'", catalog.quizzes.len(), language);

        if let Ok(mut cache) = self.catalogs.lock() {
            cache.insert(language.to_string(), catalog.clone());
        }
        Ok(catalog)
    }

    fn articles(&self, language: &str) -> Result<Vec<Article>, ContentError> {
        let mut articles: Vec<Article> = self.read_json(language, "articles")?;
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(articles)
    }

    fn projects(&self, language: &str) -> Result<Vec<Project>, ContentError> {
        self.read_json(language, "projects")
    }
}
