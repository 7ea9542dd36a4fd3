pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{HttpPageFetcher, LlmExtractor, LocalStorage};
pub use config::{toml_config::TomlConfig, CliConfig};
pub use crate::core::contacts::ContactFinder;
pub use crate::core::orchestrator::{SearchConfig, SearchOrchestrator};
pub use crate::core::registry::{Source, SourceRegistry};
pub use crate::core::sink::ResultSink;
pub use domain::model::{ContactPerson, JobRecord, SearchQuery, SearchResult, SourceOutcome};
pub use utils::error::{JobScoutError, Result};
