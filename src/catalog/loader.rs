//! Catalog fallback policy
//!
//! Decides which catalog the quizzes screen works from. An external catalog
//! with at least one quiz always wins and becomes the accepted baseline; an
//! empty external snapshot never displaces an accepted baseline. Until a
//! baseline exists the seed catalog is used, and the seed is re-applied
//! whenever the resolved catalog turns out empty.

use super::model::QuizCatalog;
use super::seed::seed_catalog;

/// Where the resolved catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogSource {
    Seed,
    External,
}

/// Resolves the active quiz catalog for the current language
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    seed: QuizCatalog,
    current: QuizCatalog,
    source: CatalogSource,
    accepted_external: bool,
}

impl CatalogLoader {
    /// Start out on the seed catalog
    pub fn new(seed: QuizCatalog) -> Self {
        Self {
            current: seed.clone(),
            seed,
            source: CatalogSource::Seed,
            accepted_external: false,
        }
    }

    /// Feed a catalog snapshot from the content store
    pub fn observe_external(&mut self, external: QuizCatalog) {
        let external = external.sanitized();

        if !external.is_empty() {
            tracing::debug!(
                "Accepting external {} catalog with {} quizzes",
                external.language,
                external.quizzes.len()
            );
            self.current = external;
            self.source = CatalogSource::External;
            self.accepted_external = true;
        } else if !self.accepted_external {
            tracing::info!("External catalog is empty, using seed catalog");
            self.use_seed();
        } else {
            tracing::debug!("Ignoring empty external catalog, keeping accepted baseline");
        }
    }

    /// The catalog to derive view state from, re-seeding if it is empty
    pub fn resolve(&mut self) -> &QuizCatalog {
        if self.current.is_empty() {
            tracing::warn!("Resolved catalog is empty, re-applying seed catalog");
            self.use_seed();
        }
        &self.current
    }

    /// Forget the accepted baseline ahead of a new language's catalog
    pub fn reset_for_language(&mut self, language: &str) {
        self.seed = seed_catalog(language);
        self.accepted_external = false;
        self.use_seed();
    }

    /// The current catalog as last resolved
    pub fn current(&self) -> &QuizCatalog {
        &self.current
    }

    /// The bundled fallback
    pub fn seed(&self) -> &QuizCatalog {
        &self.seed
    }

    /// Where the current catalog came from
    pub fn source(&self) -> CatalogSource {
        self.source
    }

    /// Whether an external catalog has been accepted since the last reset
    pub fn has_accepted_external(&self) -> bool {
        self.accepted_external
    }

    fn use_seed(&mut self) {
        self.current = self.seed.clone();
        self.source = CatalogSource::Seed;
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::catalog::model::Level;
    use crate::catalog::model::tests::quiz;
    use crate::catalog::seed::seed_catalog;

    fn external(ids: &[&str]) -> QuizCatalog {
        QuizCatalog {
            language: "en".into(),
            quizzes: ids.iter().map(|id| quiz(id, "Basics", 2, Level::Low)).collect(),
            tracks: Vec::new(),
        }
    }

    #[test]
    fn starts_on_seed() {
        let mut loader = CatalogLoader::new(seed_catalog("en"));
        assert_eq!(loader.source(), CatalogSource::Seed);
        assert!(!loader.resolve().is_empty());
    }

    #[test]
    fn empty_external_before_acceptance_uses_seed() {
        let mut loader = CatalogLoader::new(seed_catalog("en"));
        loader.observe_external(QuizCatalog::empty("en"));
        assert_eq!(loader.source(), CatalogSource::Seed);
        assert_eq!(loader.resolve(), &seed_catalog("en"));
    }

    #[test]
    fn non_empty_external_is_accepted() {
        let mut loader = CatalogLoader::new(seed_catalog("en"));
        loader.observe_external(external(&["x1"]));
        assert_eq!(loader.source(), CatalogSource::External);
        assert_eq!(loader.resolve().quizzes[0].id, "x1");
    }

    #[test]
    fn acceptance_is_sticky_across_empty_snapshots() {
        let mut loader = CatalogLoader::new(seed_catalog("en"));
        loader.observe_external(external(&["x1", "x2"]));
        loader.observe_external(QuizCatalog::empty("en"));

        assert_eq!(loader.source(), CatalogSource::External);
        assert_eq!(loader.resolve().quizzes.len(), 2);

        loader.observe_external(external(&["x3"]));
        assert_eq!(loader.resolve().quizzes[0].id, "x3");
    }

    #[test]
    fn external_with_only_invalid_quizzes_counts_as_empty() {
        let mut loader = CatalogLoader::new(seed_catalog("en"));
        let mut broken = external(&["x1"]);
        broken.quizzes[0].questions.clear();
        loader.observe_external(broken);
        assert_eq!(loader.source(), CatalogSource::Seed);
    }

    #[test]
    fn language_reset_drops_baseline() {
        let mut loader = CatalogLoader::new(seed_catalog("en"));
        loader.observe_external(external(&["x1"]));
        loader.reset_for_language("zh");

        assert!(!loader.has_accepted_external());
        assert_eq!(loader.source(), CatalogSource::Seed);
        // The seed only ships in English and says so
        assert_eq!(loader.resolve().language, "en");

        loader.observe_external(QuizCatalog::empty("zh"));
        assert_eq!(loader.source(), CatalogSource::Seed);
    }

    proptest! {
        #[test]
        fn resolved_catalog_is_never_empty(
            snapshots in proptest::collection::vec(0usize..4, 0..12)
        ) {
            let mut loader = CatalogLoader::new(seed_catalog("en"));
            for (round, size) in snapshots.into_iter().enumerate() {
                let ids: Vec<String> = (0..size).map(|i| format!("r{round}-q{i}")).collect();
                let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
                loader.observe_external(external(&refs));
                prop_assert!(!loader.resolve().is_empty());
            }
        }
    }
}
