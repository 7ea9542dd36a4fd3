use serde::{Deserialize, Deserializer, Serialize};
use std::time::Duration;

/// 一次搜尋的輸入參數
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub keywords: String,
    pub location: String,
}

impl SearchQuery {
    pub fn new(keywords: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            location: location.into(),
        }
    }
}

/// Structurally partial record as returned by the extractor. Every field is
/// either an `Option` or a defaulted container, so an absent value can never
/// be dereferenced downstream; the worker decides what survives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJobRecord {
    #[serde(default)]
    pub job_title: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub application_url: Option<String>,
    #[serde(default)]
    pub posted_date: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub remote_option: Option<String>,
    #[serde(default, deserialize_with = "string_or_seq")]
    pub benefits: Vec<String>,
}

/// A validated job listing. Produced by a worker, immutable afterwards.
/// JSON field names match the persisted artifact format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    #[serde(rename = "job_title")]
    pub title: String,
    #[serde(rename = "company_name")]
    pub company: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(rename = "job_description", default)]
    pub description: String,
    #[serde(rename = "required_skills", default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub experience_level: Option<String>,
    #[serde(default)]
    pub remote_option: Option<String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub application_url: Option<String>,
    #[serde(default)]
    pub posted_date: Option<String>,
    pub source_site: String,
    pub source_url: String,
}

impl JobRecord {
    /// 非空欄位數，作為去重時的優先依據
    pub fn filled_fields(&self) -> usize {
        let opt = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty()) as usize;
        let txt = |s: &str| (!s.trim().is_empty()) as usize;

        txt(&self.title)
            + txt(&self.company)
            + opt(&self.location)
            + txt(&self.description)
            + (!self.skills.is_empty()) as usize
            + opt(&self.salary_range)
            + opt(&self.job_type)
            + opt(&self.experience_level)
            + opt(&self.remote_option)
            + (!self.benefits.is_empty()) as usize
            + opt(&self.application_url)
            + opt(&self.posted_date)
    }
}

/// A professional contact found for a specific job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactPerson {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub twitter_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub connection_path: Option<String>,
    #[serde(default)]
    pub relevance_score: Option<f64>,
    #[serde(default)]
    pub relevance_reason: Option<String>,
    #[serde(default)]
    pub mutual_connections: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ok,
    Empty,
    FetchError,
    ExtractionError,
    Timeout,
}

impl OutcomeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Empty => "empty",
            Self::FetchError => "fetch_error",
            Self::ExtractionError => "extraction_error",
            Self::Timeout => "timeout",
        }
    }
}

/// Per-source result of one search run; the unit the orchestrator joins on.
#[derive(Debug, Clone)]
pub struct SourceOutcome {
    pub source: String,
    pub records: Vec<JobRecord>,
    pub status: OutcomeStatus,
    pub elapsed: Duration,
    pub error: Option<String>,
    pub invalid_records: usize,
}

impl SourceOutcome {
    pub fn failed(
        source: impl Into<String>,
        status: OutcomeStatus,
        elapsed: Duration,
        error: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            records: Vec::new(),
            status,
            elapsed,
            error: Some(error.into()),
            invalid_records: 0,
        }
    }
}

/// Final artifact of a search: deduplicated jobs plus per-source outcomes.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub jobs: Vec<JobRecord>,
    pub outcomes: Vec<SourceOutcome>,
    pub elapsed: Duration,
}

impl SearchResult {
    pub fn invalid_dropped(&self) -> usize {
        self.outcomes.iter().map(|o| o.invalid_records).sum()
    }
}

/// The LLM sometimes returns skills/benefits as one comma- or
/// semicolon-joined string instead of an array; accept both.
fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrSeq {
        Str(String),
        Seq(Vec<String>),
    }

    match Option::<StringOrSeq>::deserialize(deserializer)? {
        None => Ok(Vec::new()),
        Some(StringOrSeq::Seq(items)) => Ok(items
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()),
        Some(StringOrSeq::Str(s)) => Ok(s
            .split([',', ';'])
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect()),
    }
}
