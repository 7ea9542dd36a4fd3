pub mod contacts;
pub mod dedup;
pub mod orchestrator;
pub mod registry;
pub mod sink;
pub mod worker;

pub use crate::domain::model::{
    JobRecord, OutcomeStatus, SearchQuery, SearchResult, SourceOutcome,
};
pub use crate::domain::ports::{ContactExtractor, PageFetcher, RecordExtractor, Storage};
pub use crate::utils::error::Result;
