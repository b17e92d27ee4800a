//! External collaborators of the analysis pipeline.
//!
//! Each collaborator is a fixed capability trait so the pipeline can be wired
//! to production clients at startup and to scripted mocks in tests.

pub mod arxiv;
pub mod llm;
pub mod pdf;
pub mod tavily;
pub mod winston;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ServiceError;
use crate::models::AiDetection;

pub use arxiv::ArxivClient;
pub use llm::OpenRouterModel;
pub use pdf::MupdfTextExtractor;
pub use tavily::TavilyClient;
pub use winston::WinstonClient;

/// Produces the full text of a document on disk.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(&self, path: &Path) -> Result<String, ServiceError>;
}

/// Free-form completion against a language model.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError>;
}

/// Identifier-based paper lookup returning a formatted record.
#[async_trait]
pub trait PaperLookup: Send + Sync {
    async fn lookup(&self, identifier: &str) -> Result<String, ServiceError>;
}

/// Free-text web search.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<WebSearchResults, ServiceError>;
}

/// Scores how likely a text is to be machine generated.
#[async_trait]
pub trait AiContentDetector: Send + Sync {
    async fn detect(&self, text: &str) -> Result<AiDetection, ServiceError>;
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSearchResults {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub results: Vec<WebSearchHit>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WebSearchHit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// The collaborators a verification run talks to, with the per-call timeout
/// applied to every request made through them.
#[derive(Clone)]
pub struct Collaborators {
    pub text_extractor: Arc<dyn TextExtractor>,
    pub llm: Arc<dyn LanguageModel>,
    pub paper_lookup: Arc<dyn PaperLookup>,
    pub web_search: Option<Arc<dyn WebSearch>>,
    pub call_timeout: Duration,
}

impl Collaborators {
    pub async fn extract_text(&self, path: &Path) -> Result<String, ServiceError> {
        with_timeout(
            "text extraction",
            self.call_timeout,
            self.text_extractor.extract_text(path),
        )
        .await
    }

    pub async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        with_timeout("language model", self.call_timeout, self.llm.complete(prompt)).await
    }

    pub async fn lookup(&self, identifier: &str) -> Result<String, ServiceError> {
        with_timeout(
            "paper lookup",
            self.call_timeout,
            self.paper_lookup.lookup(identifier),
        )
        .await
    }

    pub async fn search(&self, query: &str) -> Result<WebSearchResults, ServiceError> {
        let search = self
            .web_search
            .as_ref()
            .ok_or_else(|| ServiceError::Config("web search is not configured".to_string()))?;
        with_timeout("web search", self.call_timeout, search.search(query)).await
    }
}

/// Runs `call`, turning an elapsed deadline into [`ServiceError::Timeout`].
pub async fn with_timeout<T, F>(
    service: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, ServiceError>
where
    F: Future<Output = Result<T, ServiceError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(ServiceError::Timeout {
            service,
            seconds: limit.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn elapsed_call_becomes_timeout() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, ServiceError>("late")
        };
        let result = with_timeout("language model", Duration::from_secs(5), slow).await;
        assert!(matches!(
            result,
            Err(ServiceError::Timeout {
                service: "language model",
                seconds: 5
            })
        ));
    }

    #[tokio::test]
    async fn fast_call_passes_through() {
        let fast = async { Ok::<_, ServiceError>(7) };
        let result = with_timeout("paper lookup", Duration::from_secs(5), fast).await;
        assert_eq!(result.unwrap(), 7);
    }

    #[test]
    fn search_results_tolerate_missing_fields() {
        let parsed: WebSearchResults =
            serde_json::from_str(r#"{"results":[{"content":"An abstract"}]}"#).unwrap();
        assert!(parsed.answer.is_none());
        assert_eq!(parsed.results[0].content.as_deref(), Some("An abstract"));
    }
}
