use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{WebSearch, WebSearchResults};
use crate::error::ServiceError;

const TAVILY_SEARCH_URL: &str = "https://api.tavily.com/search";

/// Prefix that steers the search engine toward abstracts.
pub const ABSTRACT_QUERY_PREFIX: &str = "Find abstract or summary for research paper: ";

/// Web search through the Tavily API, one result with a generated answer.
#[derive(Clone)]
pub struct TavilyClient {
    client: Client,
    api_key: String,
}

impl TavilyClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl WebSearch for TavilyClient {
    async fn search(&self, query: &str) -> Result<WebSearchResults, ServiceError> {
        let payload = json!({
            "query": format!("{}{}", ABSTRACT_QUERY_PREFIX, query),
            "max_results": 1,
            "search_depth": "basic",
            "include_answer": true,
            "include_raw_content": false
        });
        debug!(query, "Searching the web for citation summary");

        let response = self
            .client
            .post(TAVILY_SEARCH_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status {
                service: "Tavily",
                status: response.status().as_u16(),
            });
        }

        let results: WebSearchResults = response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("Tavily response: {}", e)))?;
        Ok(results)
    }
}
