use async_trait::async_trait;
use httpmock::prelude::*;
use job_scout::domain::model::{OutcomeStatus, RawJobRecord};
use job_scout::domain::ports::{FetchedPage, RecordExtractor};
use job_scout::{
    HttpPageFetcher, LlmExtractor, LocalStorage, ResultSink, SearchConfig, SearchOrchestrator,
    SearchQuery, Source, SourceRegistry,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Stub extractor that maps a site name to canned records. Lets the tests
/// drive real HTTP fetching without a live LLM endpoint.
struct MapExtractor {
    by_site: HashMap<String, Vec<RawJobRecord>>,
}

#[async_trait]
impl RecordExtractor for MapExtractor {
    async fn extract(
        &self,
        _page: &FetchedPage,
        site_name: &str,
    ) -> job_scout::Result<Vec<RawJobRecord>> {
        Ok(self.by_site.get(site_name).cloned().unwrap_or_default())
    }
}

fn raw(title: &str, company: &str, location: &str) -> RawJobRecord {
    RawJobRecord {
        job_title: Some(title.to_string()),
        company_name: Some(company.to_string()),
        location: Some(location.to_string()),
        ..Default::default()
    }
}

fn source(name: &str, enabled: bool, base_url: &str, path: &str) -> Source {
    Source {
        name: name.to_string(),
        enabled,
        base_url: base_url.to_string(),
        query_template: format!("{}?q={{keywords}}&l={{location}}", path),
    }
}

fn fast_config() -> SearchConfig {
    SearchConfig {
        source_timeout: Duration::from_secs(5),
        search_timeout: Duration::from_secs(30),
        ..SearchConfig::default()
    }
}

#[tokio::test]
async fn test_partial_failure_keeps_healthy_sources() {
    let server = MockServer::start();
    let good_mock = server.mock(|when, then| {
        when.method(GET).path("/good");
        then.status(200).body("<html>job board page</html>");
    });
    let bad_mock = server.mock(|when, then| {
        when.method(GET).path("/bad");
        then.status(500).body("internal error");
    });

    let registry = SourceRegistry::new(vec![
        source("GoodBoard", true, &server.url(""), "/good"),
        source("BadBoard", true, &server.url(""), "/bad"),
    ])
    .unwrap();

    let mut by_site = HashMap::new();
    by_site.insert(
        "GoodBoard".to_string(),
        vec![raw("Software Engineer", "Acme", "Austin, TX")],
    );

    let fetcher = Arc::new(HttpPageFetcher::new(Duration::from_secs(5)).unwrap());
    let extractor = Arc::new(MapExtractor { by_site });
    let orchestrator = SearchOrchestrator::new(registry, fetcher, extractor, fast_config());

    let query = SearchQuery::new("software engineer", "Austin, TX");
    let result = orchestrator.search(&query).await.unwrap();

    good_mock.assert();
    bad_mock.assert();

    assert_eq!(result.jobs.len(), 1);
    assert_eq!(result.jobs[0].title, "Software Engineer");
    assert_eq!(result.jobs[0].source_site, "GoodBoard");

    assert_eq!(result.outcomes.len(), 2);
    assert_eq!(result.outcomes[0].source, "GoodBoard");
    assert_eq!(result.outcomes[0].status, OutcomeStatus::Ok);
    assert_eq!(result.outcomes[1].source, "BadBoard");
    assert_eq!(result.outcomes[1].status, OutcomeStatus::FetchError);
    assert!(result.outcomes[1].error.is_some());
}

#[tokio::test]
async fn test_all_sources_failing_still_completes() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(503);
    });

    let registry = SourceRegistry::new(vec![
        source("BoardA", true, &server.url(""), "/a"),
        source("BoardB", true, &server.url(""), "/b"),
    ])
    .unwrap();

    let fetcher = Arc::new(HttpPageFetcher::new(Duration::from_secs(5)).unwrap());
    let extractor = Arc::new(MapExtractor {
        by_site: HashMap::new(),
    });
    let orchestrator = SearchOrchestrator::new(registry, fetcher, extractor, fast_config());

    let result = orchestrator
        .search(&SearchQuery::new("nurse", ""))
        .await
        .unwrap();

    assert!(result.jobs.is_empty());
    assert_eq!(result.outcomes.len(), 2);
    for outcome in &result.outcomes {
        assert_eq!(outcome.status, OutcomeStatus::FetchError);
        assert!(outcome.records.is_empty());
    }
}

#[tokio::test]
async fn test_disabled_source_is_never_contacted() {
    let server = MockServer::start();
    let enabled_mock = server.mock(|when, then| {
        when.method(GET).path("/enabled");
        then.status(200).body("<html>listings</html>");
    });
    let disabled_mock = server.mock(|when, then| {
        when.method(GET).path("/disabled");
        then.status(200).body("<html>should never be hit</html>");
    });

    let registry = SourceRegistry::new(vec![
        source("Enabled", true, &server.url(""), "/enabled"),
        source("Disabled", false, &server.url(""), "/disabled"),
    ])
    .unwrap();

    let fetcher = Arc::new(HttpPageFetcher::new(Duration::from_secs(5)).unwrap());
    let extractor = Arc::new(MapExtractor {
        by_site: HashMap::new(),
    });
    let orchestrator = SearchOrchestrator::new(registry, fetcher, extractor, fast_config());

    let result = orchestrator
        .search(&SearchQuery::new("therapist", ""))
        .await
        .unwrap();

    enabled_mock.assert();
    disabled_mock.assert_hits(0);

    assert_eq!(result.outcomes.len(), 1);
    assert_eq!(result.outcomes[0].source, "Enabled");
    assert_eq!(result.outcomes[0].status, OutcomeStatus::Empty);
}

#[tokio::test]
async fn test_slow_source_is_recorded_as_timeout() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/slow");
        then.status(200)
            .body("<html>late</html>")
            .delay(Duration::from_secs(5));
    });
    server.mock(|when, then| {
        when.method(GET).path("/fast");
        then.status(200).body("<html>listings</html>");
    });

    let registry = SourceRegistry::new(vec![
        source("SlowBoard", true, &server.url(""), "/slow"),
        source("FastBoard", true, &server.url(""), "/fast"),
    ])
    .unwrap();

    let mut by_site = HashMap::new();
    by_site.insert(
        "FastBoard".to_string(),
        vec![raw("Data Analyst", "Beta Inc", "Remote")],
    );

    let config = SearchConfig {
        source_timeout: Duration::from_millis(300),
        search_timeout: Duration::from_secs(30),
        ..SearchConfig::default()
    };
    let fetcher = Arc::new(HttpPageFetcher::new(Duration::from_secs(10)).unwrap());
    let extractor = Arc::new(MapExtractor { by_site });
    let orchestrator = SearchOrchestrator::new(registry, fetcher, extractor, config);

    let result = orchestrator
        .search(&SearchQuery::new("data analyst", "remote"))
        .await
        .unwrap();

    assert_eq!(result.outcomes[0].source, "SlowBoard");
    assert_eq!(result.outcomes[0].status, OutcomeStatus::Timeout);
    assert!(result.outcomes[0].records.is_empty());

    assert_eq!(result.outcomes[1].source, "FastBoard");
    assert_eq!(result.outcomes[1].status, OutcomeStatus::Ok);
    assert_eq!(result.jobs.len(), 1);
}

#[tokio::test]
async fn test_duplicates_across_sources_collapse_by_priority() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET);
        then.status(200).body("<html>listings</html>");
    });

    // Indeed is declared first, so its copy of a duplicated job wins.
    let registry = SourceRegistry::new(vec![
        source("Indeed", true, &server.url(""), "/indeed"),
        source("ZipRecruiter", true, &server.url(""), "/zip"),
    ])
    .unwrap();

    let mut by_site = HashMap::new();
    by_site.insert(
        "Indeed".to_string(),
        vec![
            raw("Speech Language Pathologist", "Sunrise Schools", "Fresno, CA"),
            raw("School Nurse", "Sunrise Schools", "Fresno, CA"),
        ],
    );
    by_site.insert(
        "ZipRecruiter".to_string(),
        vec![
            // Same identity as the Indeed job, differing only in whitespace and case.
            raw("speech  language pathologist", "SUNRISE SCHOOLS", "fresno, ca"),
            raw("Occupational Therapist", "Valley Health", "Fresno, CA"),
        ],
    );

    let fetcher = Arc::new(HttpPageFetcher::new(Duration::from_secs(5)).unwrap());
    let extractor = Arc::new(MapExtractor { by_site });
    let orchestrator = SearchOrchestrator::new(registry, fetcher, extractor, fast_config());

    let result = orchestrator
        .search(&SearchQuery::new("slp", "Fresno, CA"))
        .await
        .unwrap();

    assert_eq!(result.jobs.len(), 3);
    let winner = result
        .jobs
        .iter()
        .find(|job| job.title == "Speech Language Pathologist")
        .unwrap();
    assert_eq!(winner.source_site, "Indeed");
    assert!(result
        .jobs
        .iter()
        .any(|job| job.title == "Occupational Therapist"));
}

#[tokio::test]
async fn test_end_to_end_search_with_llm_and_persistence() {
    let temp_dir = TempDir::new().unwrap();
    let output_path = temp_dir.path().to_str().unwrap().to_string();

    // Job board page.
    let board = MockServer::start();
    let board_mock = board.mock(|when, then| {
        when.method(GET).path("/jobs");
        then.status(200)
            .header("Content-Type", "text/html")
            .body("<html><body>Speech Language Pathologist at Acme Therapy</body></html>");
    });

    // OpenAI-compatible chat completions endpoint.
    let llm = MockServer::start();
    let jobs_json = serde_json::json!([{
        "job_title": "Speech Language Pathologist",
        "company_name": "Acme Therapy",
        "location": "Fresno, CA",
        "job_description": "Provide speech therapy services to students.",
        "required_skills": "Speech Therapy, IEP; Assessment",
        "salary_range": "$75,000 - $90,000"
    }]);
    let llm_mock = llm.mock(|when, then| {
        when.method(POST).path("/chat/completions");
        then.status(200).json_body(serde_json::json!({
            "choices": [{"message": {"content": jobs_json.to_string()}}]
        }));
    });

    let registry =
        SourceRegistry::new(vec![source("TestBoard", true, &board.url(""), "/jobs")]).unwrap();

    let fetcher = Arc::new(HttpPageFetcher::new(Duration::from_secs(5)).unwrap());
    let extractor = Arc::new(LlmExtractor::new(
        Some(llm.url("")),
        "test-key".to_string(),
        None,
    ));
    let orchestrator = SearchOrchestrator::new(registry, fetcher, extractor, fast_config());

    let query = SearchQuery::new("speech language pathologist", "Fresno, CA");
    let result = orchestrator.search(&query).await.unwrap();

    board_mock.assert();
    llm_mock.assert();

    assert_eq!(result.jobs.len(), 1);
    let job = &result.jobs[0];
    assert_eq!(job.title, "Speech Language Pathologist");
    assert_eq!(job.company, "Acme Therapy");
    assert_eq!(job.skills, vec!["Speech Therapy", "IEP", "Assessment"]);

    // Persist and inspect the artifact.
    let sink = ResultSink::new(LocalStorage::new(output_path.clone()));
    let filename = sink.write(&result, &query, None).await.unwrap();
    assert!(filename.starts_with("job_search_results_"));
    assert!(filename.ends_with(".json"));

    let full_path = std::path::Path::new(&output_path).join(&filename);
    let saved: serde_json::Value =
        serde_json::from_slice(&std::fs::read(full_path).unwrap()).unwrap();

    assert_eq!(saved["meta"]["keywords"], "speech language pathologist");
    assert_eq!(saved["meta"]["location"], "Fresno, CA");
    assert_eq!(saved["meta"]["total_jobs"], 1);
    assert_eq!(saved["jobs"][0]["job_title"], "Speech Language Pathologist");
    assert_eq!(saved["jobs"][0]["company_name"], "Acme Therapy");
    assert_eq!(saved["meta"]["sources"][0]["name"], "TestBoard");
    assert_eq!(saved["meta"]["sources"][0]["status"], "ok");
    assert_eq!(saved["meta"]["sources"][0]["jobs"], 1);
    assert!(saved.get("connections").is_none());
}
