use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobScoutError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    // 欄位不能叫 source，thiserror 會把它當 error chain 的 source
    #[error("Fetch failed for {site}: {message}")]
    FetchError { site: String, message: String },

    #[error("Extraction failed for {site}: {message}")]
    ExtractionError { site: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("No enabled sources in the registry")]
    NoEnabledSources,

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Processing,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl JobScoutError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::FetchError { .. } => ErrorCategory::Network,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::NoEnabledSources => ErrorCategory::Configuration,
            Self::ExtractionError { .. }
            | Self::SerializationError(_)
            | Self::ProcessingError { .. } => ErrorCategory::Processing,
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一來源的失敗會在 worker 邊界被隔離，不影響整體搜尋
            Self::FetchError { .. } | Self::ExtractionError { .. } => ErrorSeverity::Low,
            Self::HttpError(_) => ErrorSeverity::Medium,
            Self::SerializationError(_) | Self::ProcessingError { .. } => ErrorSeverity::High,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. }
            | Self::NoEnabledSources => ErrorSeverity::Critical,
            Self::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::HttpError(_) | Self::FetchError { .. } => {
                "Check your network connection and retry; the board may also be rate-limiting"
            }
            Self::ExtractionError { .. } => {
                "Verify the LLM endpoint and API key; the page content may be unparseable"
            }
            Self::SerializationError(_) => "The response payload was not valid JSON",
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => "Fix the configuration file and run again",
            Self::NoEnabledSources => {
                "Enable at least one source in the [[sources]] table of your config"
            }
            Self::ProcessingError { .. } => "Inspect the log for the failing record",
            Self::IoError(_) => "Check that the output path exists and is writable",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Processing => format!("Processing problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, JobScoutError>;
