use crate::domain::model::{ContactPerson, RawJobRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A rendered page as returned by the fetcher.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub url: String,
    pub content: String,
}

/// External collaborator: fetches and renders a page. Failures must surface
/// as errors, never as empty content with no marker.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// External collaborator: turns page content into structured partial records.
#[async_trait]
pub trait RecordExtractor: Send + Sync {
    async fn extract(&self, page: &FetchedPage, site_name: &str) -> Result<Vec<RawJobRecord>>;
}

/// External collaborator: extracts people profiles for contact finding.
#[async_trait]
pub trait ContactExtractor: Send + Sync {
    async fn extract_contacts(
        &self,
        page: &FetchedPage,
        company: &str,
        job_title: &str,
    ) -> Result<Vec<ContactPerson>>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}
