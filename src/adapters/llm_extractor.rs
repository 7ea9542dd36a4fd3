use crate::domain::model::{ContactPerson, RawJobRecord};
use crate::domain::ports::{ContactExtractor, FetchedPage, RecordExtractor};
use crate::utils::error::{JobScoutError, Result};
use async_trait::async_trait;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
/// 低溫度讓抽取結果穩定
const TEMPERATURE: f64 = 0.1;
/// 頁面內容截斷上限，避免炸掉 context window
const MAX_CONTENT_CHARS: usize = 24_000;

/// RecordExtractor/ContactExtractor backed by an OpenAI-compatible
/// chat-completions endpoint. The base URL is configurable so tests can
/// point it at a mock server.
pub struct LlmExtractor {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmExtractor {
    pub fn new(base_url: Option<String>, api_key: String, model: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    async fn complete(&self, instruction: &str, content: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": TEMPERATURE,
            "messages": [
                { "role": "system", "content": instruction },
                { "role": "user", "content": truncate_chars(content, MAX_CONTENT_CHARS) },
            ],
        });

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(JobScoutError::ExtractionError {
                site: self.model.clone(),
                message: format!("completion endpoint returned HTTP {}", status),
            });
        }

        let payload: serde_json::Value = response.json().await?;
        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| JobScoutError::ExtractionError {
                site: self.model.clone(),
                message: "completion had no message content".to_string(),
            })
    }

    /// 模型偶爾把 JSON 包在 code fence 裡，或回單一物件而不是陣列
    fn parse_payload(&self, content: &str, site_name: &str) -> Result<Vec<serde_json::Value>> {
        let stripped = strip_code_fence(content);
        let value: serde_json::Value =
            serde_json::from_str(stripped).map_err(|e| JobScoutError::ExtractionError {
                site: site_name.to_string(),
                message: format!("completion was not valid JSON: {}", e),
            })?;

        match value {
            serde_json::Value::Array(items) => Ok(items),
            object @ serde_json::Value::Object(_) => Ok(vec![object]),
            other => Err(JobScoutError::ExtractionError {
                site: site_name.to_string(),
                message: format!("expected a JSON array or object, got {}", other),
            }),
        }
    }
}

fn truncate_chars(content: &str, max_chars: usize) -> &str {
    match content.char_indices().nth(max_chars) {
        Some((index, _)) => &content[..index],
        None => content,
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // 去掉 "```json" 這類語言標記所在的第一行
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn job_instruction(site_name: &str) -> String {
    format!(
        "Extract ALL job listings from this {site_name} page. Look for actual job postings, \
not navigation links or categories.\n\
For each real job listing return an object with these fields:\n\
- job_title: the exact job title\n\
- company_name: the company posting the job\n\
- location: city, state, or \"Remote\"\n\
- job_description: brief description of the role\n\
- required_skills: array of skills\n\
- application_url, posted_date, salary_range, job_type, experience_level, \
remote_option, benefits: include only when available\n\
IMPORTANT:\n\
- Only extract actual job postings, skip ads and navigation\n\
- If information is not available, leave the field null or omit it\n\
- Return a valid JSON array of job objects and nothing else"
    )
}

fn contact_instruction(company: &str, job_title: &str) -> String {
    format!(
        "Extract information about people who work at {company} from this people-search page. \
For each person return an object with:\n\
- name: full name\n\
- title: current job title\n\
- company: company name\n\
- linkedin_url: their profile URL\n\
- relevance_reason: why they might be relevant for a {job_title} position\n\
Focus on people who work at {company} and could help with a job application. \
Return a valid JSON array of person objects and nothing else"
    )
}

#[async_trait]
impl RecordExtractor for LlmExtractor {
    async fn extract(&self, page: &FetchedPage, site_name: &str) -> Result<Vec<RawJobRecord>> {
        let reply = self.complete(&job_instruction(site_name), &page.content).await?;
        let items = self.parse_payload(&reply, site_name)?;

        // 個別壞掉的元素丟警告後跳過，不拖垮整批
        let records = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<RawJobRecord>(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping malformed record from {}: {}", site_name, e);
                    None
                }
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl ContactExtractor for LlmExtractor {
    async fn extract_contacts(
        &self,
        page: &FetchedPage,
        company: &str,
        job_title: &str,
    ) -> Result<Vec<ContactPerson>> {
        let reply = self
            .complete(&contact_instruction(company, job_title), &page.content)
            .await?;
        let items = self.parse_payload(&reply, company)?;

        let contacts = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<ContactPerson>(item) {
                Ok(contact) => Some(contact),
                Err(e) => {
                    tracing::warn!("⚠️ Skipping malformed contact: {}", e);
                    None
                }
            })
            .collect();

        Ok(contacts)
    }
}
