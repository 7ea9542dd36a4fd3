use crate::core::orchestrator::SearchConfig;
use crate::core::registry::{Source, SourceRegistry};
use crate::core::worker::RetryPolicy;
use crate::utils::error::{JobScoutError, Result};
use crate::utils::validation::{validate_positive_number, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// File-based configuration. Loaded once at startup; everything derived from
/// it is immutable for the lifetime of the process.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub search: Option<SearchSection>,
    pub output: Option<OutputSection>,
    pub llm: Option<LlmSection>,
    /// 留空表示使用內建看板列表
    #[serde(default)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchSection {
    pub max_parallel: Option<usize>,
    pub source_timeout_seconds: Option<u64>,
    pub search_timeout_seconds: Option<u64>,
    pub retry_fetch: Option<bool>,
    pub retry_backoff_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSection {
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// 通常寫成 "${OPENAI_API_KEY}" 由環境變數帶入
    pub api_key: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(JobScoutError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| JobScoutError::InvalidConfigValueError {
            field: "toml_parsing".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${OPENAI_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static regex is valid");

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Builds the validated source registry; an empty [[sources]] table means
    /// the built-in board list.
    pub fn registry(&self) -> Result<SourceRegistry> {
        if self.sources.is_empty() {
            Ok(SourceRegistry::builtin())
        } else {
            SourceRegistry::new(self.sources.clone())
        }
    }

    pub fn search_config(&self) -> SearchConfig {
        let defaults = SearchConfig::default();
        let section = self.search.clone().unwrap_or_default();

        SearchConfig {
            max_parallel: section.max_parallel.unwrap_or(defaults.max_parallel),
            source_timeout: section
                .source_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.source_timeout),
            search_timeout: section
                .search_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(defaults.search_timeout),
            retry: RetryPolicy {
                retry_fetch: section.retry_fetch.unwrap_or(defaults.retry.retry_fetch),
                backoff: section
                    .retry_backoff_seconds
                    .map(Duration::from_secs)
                    .unwrap_or(defaults.retry.backoff),
            },
        }
    }

    pub fn output_path(&self) -> &str {
        self.output
            .as_ref()
            .and_then(|o| o.path.as_deref())
            .unwrap_or("./output")
    }

    pub fn llm_base_url(&self) -> Option<String> {
        self.llm.as_ref().and_then(|l| l.base_url.clone())
    }

    pub fn llm_model(&self) -> Option<String> {
        self.llm.as_ref().and_then(|l| l.model.clone())
    }

    /// API key 優先吃配置檔，其次環境變數
    pub fn llm_api_key(&self) -> Option<String> {
        self.llm
            .as_ref()
            .and_then(|l| l.api_key.clone())
            // 配置檔裡沒替換成功的佔位符視同未設定
            .filter(|key| !key.starts_with("${"))
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        if let Some(section) = &self.search {
            if let Some(max_parallel) = section.max_parallel {
                validate_positive_number("search.max_parallel", max_parallel, 1)?;
            }
            if let Some(timeout) = section.source_timeout_seconds {
                validate_positive_number("search.source_timeout_seconds", timeout as usize, 1)?;
            }
            if let Some(timeout) = section.search_timeout_seconds {
                validate_positive_number("search.search_timeout_seconds", timeout as usize, 1)?;
            }
        }

        // 來源表本身的驗證交給 registry
        self.registry().map(|_| ())
    }
}
