use crate::domain::model::{ContactPerson, SearchQuery, SearchResult};
use crate::domain::ports::Storage;
use crate::utils::error::Result;

/// Persists a SearchResult as a JSON document. Field names and nesting are
/// part of the external contract and must stay stable across versions.
pub struct ResultSink<S: Storage> {
    storage: S,
}

impl<S: Storage> ResultSink<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// `{jobs, meta{...}}`，需要時再附上 `connections`
    pub fn build_document(
        result: &SearchResult,
        query: &SearchQuery,
        contacts: Option<&[ContactPerson]>,
    ) -> serde_json::Value {
        let sources: Vec<serde_json::Value> = result
            .outcomes
            .iter()
            .map(|outcome| {
                serde_json::json!({
                    "name": outcome.source,
                    "status": outcome.status.as_str(),
                    "jobs": outcome.records.len(),
                    "invalid_dropped": outcome.invalid_records,
                    "elapsed_ms": outcome.elapsed.as_millis() as u64,
                    "error": outcome.error,
                })
            })
            .collect();

        let mut document = serde_json::json!({
            "jobs": result.jobs,
            "meta": {
                "keywords": query.keywords,
                "location": query.location,
                "timestamp": chrono::Local::now().to_rfc3339(),
                "total_jobs": result.jobs.len(),
                "invalid_dropped": result.invalid_dropped(),
                "elapsed_ms": result.elapsed.as_millis() as u64,
                "sources": sources,
            },
        });

        if let Some(contacts) = contacts {
            document["connections"] = serde_json::json!(contacts);
        }

        document
    }

    /// Writes the document and returns the relative output filename.
    pub async fn write(
        &self,
        result: &SearchResult,
        query: &SearchQuery,
        contacts: Option<&[ContactPerson]>,
    ) -> Result<String> {
        let document = Self::build_document(result, query, contacts);
        let filename = format!(
            "job_search_results_{}.json",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        );

        let data = serde_json::to_vec_pretty(&document)?;
        tracing::debug!("💾 Writing {} bytes to {}", data.len(), filename);
        self.storage.write_file(&filename, &data).await?;

        tracing::info!("💾 Saved {} jobs to {}", result.jobs.len(), filename);
        Ok(filename)
    }
}
