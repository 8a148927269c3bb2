pub mod config;
pub mod config_loader;
pub mod model;

pub use config::{AppConfig, EngineConfig, MatcherConfig, MatcherStrategy, SimilarityMetric};
pub use config_loader::ConfigLoader;
pub use model::{
    batches_from, Batch, Batches, BatchWindow, ModelError, Outcome, Quote, SourceId,
    SourceRecord,
};
