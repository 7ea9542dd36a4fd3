use crate::utils::error::{JobScoutError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_query_template, validate_url};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A job board definition. Immutable after registry construction;
/// enable/disable is a config change, not a runtime mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub enabled: bool,
    pub base_url: String,
    /// Path-and-query template with {keywords} / {location} placeholders
    pub query_template: String,
}

impl Source {
    fn new(name: &str, enabled: bool, base_url: &str, query_template: &str) -> Self {
        Self {
            name: name.to_string(),
            enabled,
            base_url: base_url.to_string(),
            query_template: query_template.to_string(),
        }
    }
}

/// Static table of known sources. Position in the table is the source
/// priority used for deterministic merging.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    /// Validates and wraps a source table loaded from configuration.
    pub fn new(sources: Vec<Source>) -> Result<Self> {
        let mut seen = HashSet::new();
        for source in &sources {
            validate_non_empty_string("sources.name", &source.name)?;
            validate_url("sources.base_url", &source.base_url)?;
            validate_query_template("sources.query_template", &source.query_template)?;

            if !seen.insert(source.name.to_lowercase()) {
                return Err(JobScoutError::ConfigError {
                    message: format!("Duplicate source name: {}", source.name),
                });
            }
        }

        Ok(Self { sources })
    }

    /// 內建看板列表；反爬蟲嚴重或已知結果不相關的站台預設停用
    pub fn builtin() -> Self {
        let sources = vec![
            // LinkedIn/Glassdoor block headless crawlers outright
            Source::new(
                "LinkedIn",
                false,
                "https://www.linkedin.com",
                "/jobs/search/?keywords={keywords}&location={location}&f_TPR=r86400",
            ),
            Source::new(
                "Indeed",
                true,
                "https://www.indeed.com",
                "/jobs?q={keywords}&l={location}&fromage=1&sort=date",
            ),
            Source::new(
                "Glassdoor",
                false,
                "https://www.glassdoor.com",
                "/Job/jobs.htm?sc.keyword={keywords}&locT=C&locId=&locKeyword={location}",
            ),
            Source::new(
                "ZipRecruiter",
                true,
                "https://www.ziprecruiter.com",
                "/jobs/search?search={keywords}&location={location}&days=1",
            ),
            // AngelList returns unrelated tech roles for most queries
            Source::new(
                "AngelList",
                false,
                "https://angel.co",
                "/jobs?keywords={keywords}&location={location}",
            ),
            Source::new(
                "Remote.co",
                true,
                "https://remote.co",
                "/remote-jobs/search/?search_keywords={keywords}",
            ),
            Source::new(
                "SimplyHired",
                true,
                "https://www.simplyhired.com",
                "/search?q={keywords}&l={location}&fdb=1",
            ),
            Source::new(
                "Monster",
                false,
                "https://www.monster.com",
                "/jobs/search?q={keywords}&where={location}&tm=1",
            ),
            Source::new(
                "Dice",
                true,
                "https://www.dice.com",
                "/jobs?q={keywords}&location={location}&filters.postedDate=ONE",
            ),
        ];

        // 內建表為常量，驗證不可能失敗
        Self::new(sources).expect("builtin registry is valid")
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn enabled_sources(&self) -> Vec<&Source> {
        self.sources.iter().filter(|s| s.enabled).collect()
    }

    /// Source names in priority order (registry position).
    pub fn priority_order(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
