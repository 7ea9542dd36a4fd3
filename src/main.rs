use clap::Parser;
use job_scout::utils::{error::ErrorSeverity, logger, validation::Validate};
use job_scout::{
    CliConfig, ContactFinder, ContactPerson, HttpPageFetcher, LlmExtractor, LocalStorage,
    ResultSink, SearchOrchestrator, SearchQuery, SearchResult, TomlConfig,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("🚀 Starting job-scout");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    // 載入配置檔（沒給就用內建預設）
    let config = match &cli.config {
        Some(path) => match TomlConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("❌ Failed to load config file '{}': {}", path, e);
                eprintln!("💡 Make sure the file exists and is valid TOML format");
                std::process::exit(1);
            }
        },
        None => TomlConfig::default(),
    };

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    // 套用命令列覆蓋設定
    let mut search_config = config.search_config();
    if let Some(max_parallel) = cli.max_parallel {
        if max_parallel == 0 {
            eprintln!("❌ --max-parallel must be at least 1");
            std::process::exit(1);
        }
        search_config.max_parallel = max_parallel;
        tracing::info!("🔧 max_parallel overridden to: {}", max_parallel);
    }
    let output_path = cli
        .output_path
        .clone()
        .unwrap_or_else(|| config.output_path().to_string());

    let api_key = match config.llm_api_key() {
        Some(key) => key,
        None => {
            eprintln!("❌ An OpenAI API key is required for job extraction");
            eprintln!("💡 Set OPENAI_API_KEY or add [llm] api_key to your config file");
            std::process::exit(1);
        }
    };

    // registry 在 validate() 已驗過，這裡不會失敗
    let registry = config.registry()?;
    let enabled = registry.enabled_sources().len();
    tracing::info!(
        "📋 {} of {} sources enabled",
        enabled,
        registry.sources().len()
    );

    let fetcher = Arc::new(HttpPageFetcher::new(search_config.source_timeout)?);
    let extractor = Arc::new(LlmExtractor::new(
        config.llm_base_url(),
        api_key,
        config.llm_model(),
    ));

    let orchestrator = SearchOrchestrator::new(
        registry,
        Arc::clone(&fetcher),
        Arc::clone(&extractor),
        search_config.clone(),
    );

    let query = SearchQuery::new(cli.keywords.clone(), cli.location.clone());
    println!(
        "🔍 Searching for '{}' jobs in '{}'...",
        query.keywords,
        if query.location.is_empty() {
            "any location"
        } else {
            &query.location
        }
    );
    println!("This searches multiple job boards and may take several minutes.\n");

    match orchestrator.search(&query).await {
        Ok(result) => {
            print_job_summary(&result);

            // 可選：替指定職缺找人脈
            let contacts = match cli.contacts {
                Some(number) => find_contacts(&result, number, &fetcher, &extractor, &search_config).await,
                None => None,
            };

            let storage = LocalStorage::new(output_path.clone());
            let sink = ResultSink::new(storage);
            match sink.write(&result, &query, contacts.as_deref()).await {
                Ok(filename) => {
                    println!("\n✅ Job search completed successfully!");
                    println!("📁 Results saved to: {}/{}", output_path, filename);
                }
                Err(e) => {
                    tracing::error!("❌ Failed to persist results: {}", e);
                    eprintln!("❌ {}", e.user_friendly_message());
                    eprintln!("💡 {}", e.recovery_suggestion());
                    std::process::exit(exit_code(e.severity()));
                }
            }
        }
        Err(e) => {
            // 只有配置問題會讓整個搜尋失敗；個別來源的錯誤都在結果裡
            tracing::error!(
                "❌ Search failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let code = exit_code(e.severity());
            if code > 0 {
                std::process::exit(code);
            }
        }
    }

    Ok(())
}

fn exit_code(severity: ErrorSeverity) -> i32 {
    match severity {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

async fn find_contacts(
    result: &SearchResult,
    number: usize,
    fetcher: &Arc<HttpPageFetcher>,
    extractor: &Arc<LlmExtractor>,
    search_config: &job_scout::SearchConfig,
) -> Option<Vec<ContactPerson>> {
    let job = match number.checked_sub(1).and_then(|i| result.jobs.get(i)) {
        Some(job) => job,
        None => {
            eprintln!(
                "❌ Invalid job number {} (found {} jobs)",
                number,
                result.jobs.len()
            );
            return None;
        }
    };

    println!("\n🤝 Finding contacts for: {} at {}", job.title, job.company);
    let finder = ContactFinder::new(
        Arc::clone(fetcher),
        Arc::clone(extractor),
        search_config.source_timeout,
    );
    let contacts = finder.find(job).await;

    if contacts.is_empty() {
        println!("❌ No contacts found for this job.");
        return Some(contacts);
    }

    println!("👥 Found {} potential contacts:", contacts.len());
    for (i, person) in contacts.iter().take(10).enumerate() {
        println!("{}. {}", i + 1, person.name);
        if let Some(title) = &person.title {
            println!("   Title: {}", title);
        }
        if let Some(company) = &person.company {
            println!("   Company: {}", company);
        }
        if let Some(url) = &person.linkedin_url {
            println!("   LinkedIn: {}", url);
        }
        if let Some(score) = person.relevance_score {
            println!("   Relevance score: {:.2}", score);
        }
    }

    Some(contacts)
}

fn print_job_summary(result: &SearchResult) {
    println!("{}", "=".repeat(80));
    println!("FOUND {} UNIQUE JOBS", result.jobs.len());
    println!("{}", "=".repeat(80));

    println!("\nPer-source outcomes:");
    for outcome in &result.outcomes {
        let detail = outcome
            .error
            .as_deref()
            .map(|e| format!(" — {}", e))
            .unwrap_or_default();
        println!(
            "  {}: {} ({} jobs, {} ms){}",
            outcome.source,
            outcome.status.as_str(),
            outcome.records.len(),
            outcome.elapsed.as_millis(),
            detail
        );
    }

    if result.jobs.is_empty() {
        println!("\nNo jobs found. Try different keywords or location.");
        return;
    }

    println!("\n{}", "-".repeat(80));
    for (i, job) in result.jobs.iter().enumerate() {
        println!("\n{}. {}", i + 1, job.title);
        println!("   Company: {}", job.company);
        if let Some(location) = &job.location {
            println!("   Location: {}", location);
        }
        println!("   Source: {}", job.source_site);

        if let Some(salary) = &job.salary_range {
            println!("   Salary: {}", salary);
        }
        if let Some(job_type) = &job.job_type {
            println!("   Type: {}", job_type);
        }
        if let Some(level) = &job.experience_level {
            println!("   Level: {}", level);
        }
        if let Some(remote) = &job.remote_option {
            println!("   Remote: {}", remote);
        }

        if !job.skills.is_empty() {
            let mut skills = job.skills.iter().take(5).cloned().collect::<Vec<_>>().join(", ");
            if job.skills.len() > 5 {
                skills.push_str(&format!(" (+{} more)", job.skills.len() - 5));
            }
            println!("   Skills: {}", skills);
        }

        if let Some(url) = &job.application_url {
            println!("   Apply: {}", url);
        }
        if let Some(posted) = &job.posted_date {
            println!("   Posted: {}", posted);
        }

        if job.description.len() > 10 {
            let description: String = job.description.chars().take(200).collect();
            let suffix = if job.description.chars().count() > 200 { "..." } else { "" };
            println!("   Description: {}{}", description, suffix);
        }

        println!("{}", "-".repeat(80));
    }
}
