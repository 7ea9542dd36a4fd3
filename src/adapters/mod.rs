// Adapters layer: concrete implementations for external systems
// (filesystem storage, HTTP fetching, the LLM extraction endpoint).

pub mod http_fetcher;
pub mod llm_extractor;
pub mod storage;

pub use http_fetcher::HttpPageFetcher;
pub use llm_extractor::LlmExtractor;
pub use storage::LocalStorage;
