use crate::domain::ports::{FetchedPage, PageFetcher};
use crate::utils::error::{JobScoutError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// 看板會擋掉明顯的機器人 UA，偽裝成一般桌面瀏覽器
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// reqwest-backed PageFetcher. Failures always surface as typed errors;
/// an empty body is a fetch error, never silent empty content.
pub struct HttpPageFetcher {
    client: reqwest::Client,
}

impl HttpPageFetcher {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        tracing::debug!("📡 GET {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobScoutError::FetchError {
                site: url.to_string(),
                message: format!("HTTP status {}", status),
            });
        }

        let content = response.text().await?;
        if content.trim().is_empty() {
            return Err(JobScoutError::FetchError {
                site: url.to_string(),
                message: "empty response body".to_string(),
            });
        }

        tracing::debug!("📡 Fetched {} bytes from {}", content.len(), url);
        Ok(FetchedPage {
            url: url.to_string(),
            content,
        })
    }
}
