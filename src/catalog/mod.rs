//! Quiz catalog: model, seed data, fallback policy and the content boundary

pub mod blocks;
pub mod loader;
pub mod model;
pub mod seed;
pub mod store;

pub use blocks::{Article, ContentBlock, Project};
pub use loader::{CatalogLoader, CatalogSource};
pub use model::{Level, QuizCatalog, QuizQuestion, QuizTopic, QuizTrack};
pub use seed::{SEED_LANGUAGE, seed_catalog};
pub use store::{BundledContentStore, ContentStore};
