use crate::core::worker::quote_plus;
use crate::domain::model::{ContactPerson, JobRecord};
use crate::domain::ports::{ContactExtractor, PageFetcher};
use std::sync::Arc;
use std::time::Duration;

const ROLE_KEYWORDS: &[&str] = &["engineer", "developer", "manager", "director", "lead", "senior"];
const MAX_CONTACTS: usize = 20;
/// 每個職缺最多查兩組關鍵字，避免被 LinkedIn 限流
const MAX_SEARCH_TERMS: usize = 2;

/// Looks up professional contacts for one selected job through the same
/// fetcher/extractor seams as the job search. Failures degrade to an empty
/// list; contact finding never fails a search.
pub struct ContactFinder<F, E> {
    fetcher: Arc<F>,
    extractor: Arc<E>,
    timeout: Duration,
}

impl<F: PageFetcher, E: ContactExtractor> ContactFinder<F, E> {
    pub fn new(fetcher: Arc<F>, extractor: Arc<E>, timeout: Duration) -> Self {
        Self {
            fetcher,
            extractor,
            timeout,
        }
    }

    pub async fn find(&self, job: &JobRecord) -> Vec<ContactPerson> {
        tracing::info!(
            "🤝 Finding contacts for {} at {}",
            job.title,
            job.company
        );

        let terms = [
            format!("{} {}", job.company, job.title),
            format!("{} manager", job.company),
        ];

        let mut contacts: Vec<ContactPerson> = Vec::new();

        for term in terms.iter().take(MAX_SEARCH_TERMS) {
            let url = people_search_url(term);

            let page = match tokio::time::timeout(self.timeout, self.fetcher.fetch(&url)).await {
                Err(_) => {
                    tracing::warn!("⏱️ Contact search timed out for '{}'", term);
                    continue;
                }
                Ok(Err(e)) => {
                    tracing::warn!("❌ Contact search fetch failed for '{}': {}", term, e);
                    continue;
                }
                Ok(Ok(page)) => page,
            };

            // 抽取跟 fetch 一樣要有 deadline，LLM 端點卡住不能拖垮整個查詢
            match tokio::time::timeout(
                self.timeout,
                self.extractor.extract_contacts(&page, &job.company, &job.title),
            )
            .await
            {
                Err(_) => {
                    tracing::warn!("⏱️ Contact extraction timed out for '{}'", term);
                }
                Ok(Err(e)) => {
                    tracing::warn!("❌ Contact extraction failed for '{}': {}", term, e);
                }
                Ok(Ok(found)) => {
                    // 沒有名字的人無法聯絡，直接略過
                    contacts.extend(found.into_iter().filter(|c| !c.name.trim().is_empty()));
                }
            }
        }

        score_contacts(&mut contacts, job);
        contacts.sort_by(|a, b| {
            b.relevance_score
                .unwrap_or(0.0)
                .partial_cmp(&a.relevance_score.unwrap_or(0.0))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        contacts.truncate(MAX_CONTACTS);

        tracing::info!("👥 Found {} contacts", contacts.len());
        contacts
    }
}

fn people_search_url(term: &str) -> String {
    format!(
        "https://www.linkedin.com/search/results/people/?keywords={}",
        quote_plus(term)
    )
}

/// Relevance scoring: +0.5 for title containment, +0.2 per shared role
/// keyword, +0.3 for a company match, clamped to 1.0.
pub fn score_contacts(contacts: &mut [ContactPerson], job: &JobRecord) {
    let job_title = job.title.to_lowercase();
    let job_company = job.company.to_lowercase();

    for contact in contacts.iter_mut() {
        let mut score: f64 = 0.0;

        if let Some(title) = &contact.title {
            let title = title.to_lowercase();
            if !job_title.is_empty() && title.contains(&job_title) {
                score += 0.5;
            }
            for keyword in ROLE_KEYWORDS {
                if title.contains(keyword) && job_title.contains(keyword) {
                    score += 0.2;
                }
            }
        }

        if let Some(company) = &contact.company {
            if !job_company.is_empty() && company.to_lowercase().contains(&job_company) {
                score += 0.3;
            }
        }

        contact.relevance_score = Some(score.min(1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::FetchedPage;
    use crate::utils::error::{JobScoutError, Result};
    use async_trait::async_trait;

    fn job(title: &str, company: &str) -> JobRecord {
        JobRecord {
            title: title.to_string(),
            company: company.to_string(),
            location: None,
            description: String::new(),
            skills: vec![],
            salary_range: None,
            job_type: None,
            experience_level: None,
            remote_option: None,
            benefits: vec![],
            application_url: None,
            posted_date: None,
            source_site: "Indeed".to_string(),
            source_url: String::new(),
        }
    }

    fn contact(name: &str, title: Option<&str>, company: Option<&str>) -> ContactPerson {
        ContactPerson {
            name: name.to_string(),
            title: title.map(str::to_string),
            company: company.map(str::to_string),
            linkedin_url: None,
            github_url: None,
            twitter_url: None,
            email: None,
            connection_path: None,
            relevance_score: None,
            relevance_reason: None,
            mutual_connections: None,
        }
    }

    #[test]
    fn test_company_match_alone_scores_point_three() {
        let mut contacts = vec![contact("Sam", None, Some("Acme Health"))];
        score_contacts(&mut contacts, &job("Software Engineer", "Acme"));
        assert_eq!(contacts[0].relevance_score, Some(0.3));
    }

    #[test]
    fn test_exact_title_and_company_match_is_clamped() {
        let mut contacts = vec![contact(
            "Sam",
            Some("Senior Software Engineer"),
            Some("Acme"),
        )];
        score_contacts(&mut contacts, &job("Senior Software Engineer", "Acme"));
        // 0.5 + 0.2*2 (engineer, senior) + 0.3 會超過上限
        assert_eq!(contacts[0].relevance_score, Some(1.0));
    }

    #[test]
    fn test_unrelated_contact_scores_zero() {
        let mut contacts = vec![contact("Sam", Some("Barista"), Some("Coffee Co"))];
        score_contacts(&mut contacts, &job("Software Engineer", "Acme"));
        assert_eq!(contacts[0].relevance_score, Some(0.0));
    }

    struct FailingFetcher;

    #[async_trait]
    impl PageFetcher for FailingFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            Err(JobScoutError::FetchError {
                site: url.to_string(),
                message: "blocked".to_string(),
            })
        }
    }

    struct NoopExtractor;

    #[async_trait]
    impl ContactExtractor for NoopExtractor {
        async fn extract_contacts(
            &self,
            _page: &FetchedPage,
            _company: &str,
            _job_title: &str,
        ) -> Result<Vec<ContactPerson>> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_fetch_failures_degrade_to_empty_list() {
        let finder = ContactFinder::new(
            Arc::new(FailingFetcher),
            Arc::new(NoopExtractor),
            Duration::from_secs(1),
        );
        let contacts = finder.find(&job("Software Engineer", "Acme")).await;
        assert!(contacts.is_empty());
    }

    struct HangingExtractor;

    #[async_trait]
    impl ContactExtractor for HangingExtractor {
        async fn extract_contacts(
            &self,
            _page: &FetchedPage,
            _company: &str,
            _job_title: &str,
        ) -> Result<Vec<ContactPerson>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!("extraction should have been cancelled by the deadline")
        }
    }

    #[tokio::test]
    async fn test_hanging_extraction_is_cut_off_by_the_timeout() {
        let finder = ContactFinder::new(
            Arc::new(OkFetcher),
            Arc::new(HangingExtractor),
            Duration::from_millis(50),
        );

        let started = std::time::Instant::now();
        let contacts = finder.find(&job("Software Engineer", "Acme")).await;

        assert!(contacts.is_empty());
        // 兩個搜尋詞各 50ms 的上限，遠低於掛住的 extractor
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    struct CannedExtractor {
        contacts: Vec<ContactPerson>,
    }

    #[async_trait]
    impl ContactExtractor for CannedExtractor {
        async fn extract_contacts(
            &self,
            _page: &FetchedPage,
            _company: &str,
            _job_title: &str,
        ) -> Result<Vec<ContactPerson>> {
            Ok(self.contacts.clone())
        }
    }

    struct OkFetcher;

    #[async_trait]
    impl PageFetcher for OkFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedPage> {
            Ok(FetchedPage {
                url: url.to_string(),
                content: "people".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_results_ranked_by_score_and_nameless_dropped() {
        let extractor = CannedExtractor {
            contacts: vec![
                contact("Low", Some("Barista"), None),
                contact("", Some("Ghost"), Some("Acme")),
                contact("High", Some("Engineer"), Some("Acme")),
            ],
        };

        let finder = ContactFinder::new(
            Arc::new(OkFetcher),
            Arc::new(extractor),
            Duration::from_secs(1),
        );
        let contacts = finder.find(&job("Software Engineer", "Acme")).await;

        // 每個搜尋詞都回傳同一批，去掉無名者後共 4 筆
        assert!(contacts.iter().all(|c| !c.name.is_empty()));
        assert_eq!(contacts[0].name, "High");
        assert!(contacts[0].relevance_score.unwrap() > contacts.last().unwrap().relevance_score.unwrap());
    }
}
