use crate::core::registry::Source;
use crate::domain::model::{JobRecord, OutcomeStatus, RawJobRecord, SearchQuery, SourceOutcome};
use crate::domain::ports::{FetchedPage, PageFetcher, RecordExtractor};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::{form_urlencoded::byte_serialize, Url};

/// 看板頁面上常見的導覽/廣告假職缺標題
const SPAM_TITLE_KEYWORDS: &[&str] = &[
    "similar jobs",
    "related jobs",
    "more jobs",
    "view all",
    "job alert",
    "email alert",
    "save search",
    "job search",
    "sign up",
    "create account",
    "login",
    "register",
];

const MIN_TITLE_LENGTH: usize = 3;
const MIN_COMPANY_LENGTH: usize = 2;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retry a failed fetch at most once
    pub retry_fetch: bool,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_fetch: false,
            backoff: Duration::from_secs(2),
        }
    }
}

enum FetchFailure {
    Timeout,
    Failed(String),
}

/// Per-source unit of work: fetch, extract, validate, classify. `run` never
/// returns an error; every failure inside this boundary becomes outcome data.
pub struct SourceWorker<F, E> {
    fetcher: Arc<F>,
    extractor: Arc<E>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl<F, E> Clone for SourceWorker<F, E> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            extractor: Arc::clone(&self.extractor),
            timeout: self.timeout,
            retry: self.retry.clone(),
        }
    }
}

impl<F: PageFetcher, E: RecordExtractor> SourceWorker<F, E> {
    pub fn new(fetcher: Arc<F>, extractor: Arc<E>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            fetcher,
            extractor,
            timeout,
            retry,
        }
    }

    /// 單一來源的完整流程；fetch 與 extract 共用同一個 deadline
    pub async fn run(&self, source: &Source, query: &SearchQuery) -> SourceOutcome {
        let started = Instant::now();
        let deadline = tokio::time::Instant::now() + self.timeout;
        let url = build_search_url(source, query);

        tracing::info!("🔍 Searching {} ({})", source.name, url);

        let page = match self.fetch_with_retry(&url, deadline).await {
            Ok(page) => page,
            Err(FetchFailure::Timeout) => {
                tracing::warn!("⏱️ {} timed out after {:?}", source.name, self.timeout);
                return SourceOutcome::failed(
                    &source.name,
                    OutcomeStatus::Timeout,
                    started.elapsed(),
                    format!("fetch did not complete within {:?}", self.timeout),
                );
            }
            Err(FetchFailure::Failed(message)) => {
                tracing::warn!("❌ {} fetch failed: {}", source.name, message);
                return SourceOutcome::failed(
                    &source.name,
                    OutcomeStatus::FetchError,
                    started.elapsed(),
                    message,
                );
            }
        };

        let raw_records = match tokio::time::timeout_at(
            deadline,
            self.extractor.extract(&page, &source.name),
        )
        .await
        {
            Err(_) => {
                tracing::warn!("⏱️ {} extraction hit the per-source deadline", source.name);
                return SourceOutcome::failed(
                    &source.name,
                    OutcomeStatus::Timeout,
                    started.elapsed(),
                    format!("extraction did not complete within {:?}", self.timeout),
                );
            }
            Ok(Err(e)) => {
                tracing::warn!("❌ {} extraction failed: {}", source.name, e);
                return SourceOutcome::failed(
                    &source.name,
                    OutcomeStatus::ExtractionError,
                    started.elapsed(),
                    e.to_string(),
                );
            }
            Ok(Ok(raw)) => raw,
        };

        let total = raw_records.len();
        let records: Vec<JobRecord> = raw_records
            .into_iter()
            .filter_map(|raw| normalize_record(raw, &source.name, &url))
            .collect();
        let invalid_records = total - records.len();

        if invalid_records > 0 {
            tracing::debug!(
                "🧹 {}: dropped {} invalid/spam records",
                source.name,
                invalid_records
            );
        }

        let status = if records.is_empty() {
            OutcomeStatus::Empty
        } else {
            OutcomeStatus::Ok
        };

        tracing::info!("✅ {}: {} jobs", source.name, records.len());

        SourceOutcome {
            source: source.name.clone(),
            records,
            status,
            elapsed: started.elapsed(),
            error: None,
            invalid_records,
        }
    }

    async fn fetch_with_retry(
        &self,
        url: &str,
        deadline: tokio::time::Instant,
    ) -> Result<FetchedPage, FetchFailure> {
        match self.fetch_bounded(url, deadline).await {
            Ok(page) => Ok(page),
            Err(FetchFailure::Failed(first)) if self.retry.retry_fetch => {
                // 只重試一次，而且 backoff 不能吃掉剩下的 deadline
                let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
                if remaining <= self.retry.backoff {
                    return Err(FetchFailure::Failed(first));
                }
                tracing::debug!("🔁 Retrying {} after {:?}", url, self.retry.backoff);
                tokio::time::sleep(self.retry.backoff).await;
                self.fetch_bounded(url, deadline).await
            }
            Err(other) => Err(other),
        }
    }

    async fn fetch_bounded(
        &self,
        url: &str,
        deadline: tokio::time::Instant,
    ) -> Result<FetchedPage, FetchFailure> {
        match tokio::time::timeout_at(deadline, self.fetcher.fetch(url)).await {
            Err(_) => Err(FetchFailure::Timeout),
            Ok(Ok(page)) => Ok(page),
            Ok(Err(e)) => Err(FetchFailure::Failed(e.to_string())),
        }
    }
}

pub(crate) fn quote_plus(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

/// Expands the source template with urlencoded query parameters.
pub fn build_search_url(source: &Source, query: &SearchQuery) -> String {
    let path = source
        .query_template
        .replace("{keywords}", &quote_plus(&query.keywords))
        .replace("{location}", &quote_plus(&query.location));
    format!("{}{}", source.base_url.trim_end_matches('/'), path)
}

/// 看板常給相對路徑的申請連結，存檔前以頁面 URL 補全
fn resolve_application_url(candidate: Option<String>, page_url: &str) -> Option<String> {
    let candidate = clean_optional(candidate)?;
    if candidate.starts_with("http://") || candidate.starts_with("https://") {
        return Some(candidate);
    }
    Url::parse(page_url)
        .ok()?
        .join(&candidate)
        .ok()
        .map(|resolved| resolved.to_string())
}

fn clean_optional(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Turns a structurally partial extractor record into a validated JobRecord.
/// Returns None for records that must be dropped: both identity fields blank,
/// identity fields below minimum length, or a spam title.
pub fn normalize_record(
    raw: RawJobRecord,
    source_site: &str,
    source_url: &str,
) -> Option<JobRecord> {
    let title = clean_optional(raw.job_title).unwrap_or_default();
    let company = clean_optional(raw.company_name).unwrap_or_default();

    // 同時缺 title 跟 company 的紀錄沒有身分，直接丟棄
    if title.is_empty() && company.is_empty() {
        return None;
    }
    if !title.is_empty() && title.chars().count() < MIN_TITLE_LENGTH {
        return None;
    }
    if !company.is_empty() && company.chars().count() < MIN_COMPANY_LENGTH {
        return None;
    }

    let title_lower = title.to_lowercase();
    if SPAM_TITLE_KEYWORDS.iter().any(|kw| title_lower.contains(kw)) {
        return None;
    }

    Some(JobRecord {
        title,
        company,
        location: clean_optional(raw.location),
        // 缺 description 時明確給空字串，而不是讓 None 流到下游
        description: clean_optional(raw.job_description).unwrap_or_default(),
        skills: raw.required_skills,
        salary_range: clean_optional(raw.salary_range),
        job_type: clean_optional(raw.job_type),
        experience_level: clean_optional(raw.experience_level),
        remote_option: clean_optional(raw.remote_option),
        benefits: raw.benefits,
        application_url: resolve_application_url(raw.application_url, source_url),
        posted_date: clean_optional(raw.posted_date),
        source_site: source_site.to_string(),
        source_url: source_url.to_string(),
    })
}
