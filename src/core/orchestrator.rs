use crate::core::dedup::Deduplicator;
use crate::core::registry::{Source, SourceRegistry};
use crate::core::worker::{RetryPolicy, SourceWorker};
use crate::domain::model::{OutcomeStatus, SearchQuery, SearchResult, SourceOutcome};
use crate::domain::ports::{PageFetcher, RecordExtractor};
use crate::utils::error::{JobScoutError, Result};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Runtime knobs for a search run.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub max_parallel: usize,
    pub source_timeout: Duration,
    pub search_timeout: Duration,
    pub retry: RetryPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_parallel: 5,
            source_timeout: Duration::from_secs(30),
            search_timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }
}

/// Fans out one SourceWorker per enabled source, bounded by a semaphore,
/// and aggregates every outcome into a deterministic SearchResult. A failing
/// source never fails the search; only an empty registry does.
pub struct SearchOrchestrator<F, E> {
    registry: SourceRegistry,
    worker: SourceWorker<F, E>,
    dedup: Deduplicator,
    max_parallel: usize,
    search_timeout: Duration,
}

impl<F, E> SearchOrchestrator<F, E>
where
    F: PageFetcher + 'static,
    E: RecordExtractor + 'static,
{
    pub fn new(
        registry: SourceRegistry,
        fetcher: Arc<F>,
        extractor: Arc<E>,
        config: SearchConfig,
    ) -> Self {
        let worker = SourceWorker::new(fetcher, extractor, config.source_timeout, config.retry);
        let dedup = Deduplicator::new(registry.priority_order());
        Self {
            registry,
            worker,
            dedup,
            max_parallel: config.max_parallel,
            search_timeout: config.search_timeout,
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult> {
        let started = Instant::now();

        let enabled: Vec<Source> = self
            .registry
            .enabled_sources()
            .into_iter()
            .cloned()
            .collect();
        if enabled.is_empty() {
            return Err(JobScoutError::NoEnabledSources);
        }

        tracing::info!(
            "🚀 Searching {} sources for '{}' in '{}'",
            enabled.len(),
            query.keywords,
            if query.location.is_empty() {
                "any location"
            } else {
                &query.location
            }
        );

        // 全域唯一的共享資源：並發上限的 semaphore
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let query = Arc::new(query.clone());
        let mut workers: JoinSet<SourceOutcome> = JoinSet::new();
        let mut task_sources: HashMap<tokio::task::Id, String> = HashMap::new();

        for source in &enabled {
            let worker = self.worker.clone();
            let source = source.clone();
            let name = source.name.clone();
            let query = Arc::clone(&query);
            let semaphore = Arc::clone(&semaphore);
            let handle = workers.spawn(async move {
                // semaphore 在整個搜尋期間都不會被關閉
                let _permit = semaphore.acquire_owned().await;
                worker.run(&source, &query).await
            });
            task_sources.insert(handle.id(), name);
        }

        let deadline = tokio::time::Instant::now() + self.search_timeout;
        let mut outcomes: Vec<SourceOutcome> = Vec::with_capacity(enabled.len());
        let mut completed: HashSet<String> = HashSet::new();

        loop {
            match tokio::time::timeout_at(deadline, workers.join_next_with_id()).await {
                Ok(None) => break,
                Ok(Some(Ok((_task_id, outcome)))) => {
                    completed.insert(outcome.source.clone());
                    outcomes.push(outcome);
                }
                Ok(Some(Err(join_error))) => {
                    // panic 掉的 worker 要有自己的結論，不能混進 deadline 取消
                    tracing::error!("❌ Worker task failed: {}", join_error);
                    if let Some(name) = task_sources.get(&join_error.id()) {
                        completed.insert(name.clone());
                        outcomes.push(SourceOutcome::failed(
                            name,
                            OutcomeStatus::ExtractionError,
                            started.elapsed(),
                            format!("worker task panicked: {}", join_error),
                        ));
                    }
                }
                Err(_) => {
                    tracing::warn!(
                        "⏱️ Global search deadline ({:?}) elapsed, cancelling pending sources",
                        self.search_timeout
                    );
                    workers.abort_all();
                    break;
                }
            }
        }

        // 被全域 deadline 取消的來源記為 timeout，部分輸出一律丟棄
        for source in &enabled {
            if !completed.contains(&source.name) {
                outcomes.push(SourceOutcome::failed(
                    &source.name,
                    OutcomeStatus::Timeout,
                    self.search_timeout,
                    "cancelled by the global search deadline",
                ));
            }
        }

        // 完成順序不影響結果：一律照 registry 優先序排
        let order = self.registry.priority_order();
        let priority: HashMap<&str, usize> = order
            .iter()
            .enumerate()
            .map(|(index, name)| (name.as_str(), index))
            .collect();
        outcomes.sort_by_key(|o| priority.get(o.source.as_str()).copied().unwrap_or(usize::MAX));

        let jobs = self.dedup.merge(&outcomes);

        tracing::info!(
            "🎯 Search finished: {} unique jobs from {} sources in {:?}",
            jobs.len(),
            outcomes.len(),
            started.elapsed()
        );

        Ok(SearchResult {
            jobs,
            outcomes,
            elapsed: started.elapsed(),
        })
    }
}
