pub mod toml_config;

use clap::Parser;

/// Command-line surface. File values come from `--config`; the flags here
/// override them for a single run.
#[derive(Debug, Clone, Parser)]
#[command(name = "job-scout")]
#[command(about = "Multi-board job search with LLM-based listing extraction")]
pub struct CliConfig {
    /// Job title or keywords, e.g. "software engineer"
    #[arg(long)]
    pub keywords: String,

    /// City, state, or "remote"; empty means any location
    #[arg(long, default_value = "")]
    pub location: String,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Override the output directory from the config file
    #[arg(long)]
    pub output_path: Option<String>,

    /// Override the maximum number of concurrent source searches
    #[arg(long)]
    pub max_parallel: Option<usize>,

    /// After the search, find contacts for this job number (1-based)
    #[arg(long)]
    pub contacts: Option<usize>,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,
}
