#![allow(dead_code)]

use async_trait::async_trait;
use paper_analysis_service::ServiceError;
use paper_analysis_service::clients::{
    Collaborators, LanguageModel, PaperLookup, TextExtractor, WebSearch, WebSearchResults,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ABSTRACT: &str = "We study automatic verification of citations in research papers.";

/// Returns a fixed document, or fails like an unreadable file.
pub struct FixedText(pub Option<String>);

#[async_trait]
impl TextExtractor for FixedText {
    async fn extract_text(&self, path: &Path) -> Result<String, ServiceError> {
        self.0
            .clone()
            .ok_or_else(|| ServiceError::Pdf(format!("PDF file not found: {}", path.display())))
    }
}

/// Deterministic language model for the whole pipeline.
///
/// Judge prompts are answered after a per-title delay so completion order can
/// differ from input order.
#[derive(Clone)]
pub struct PipelineModel {
    pub references_section: Option<String>,
    pub parsed_references: String,
    pub judge_delays: HashMap<String, u64>,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl PipelineModel {
    pub fn new(references_section: Option<&str>, parsed_references: &str) -> Self {
        Self {
            references_section: references_section.map(str::to_string),
            parsed_references: parsed_references.to_string(),
            judge_delays: HashMap::new(),
            prompts: Arc::default(),
        }
    }

    pub fn with_delay(mut self, title: &str, millis: u64) -> Self {
        self.judge_delays.insert(title.to_string(), millis);
        self
    }

    pub fn judge_calls(&self) -> usize {
        self.prompts
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.contains("CITED PAPER TITLE"))
            .count()
    }
}

#[async_trait]
impl LanguageModel for PipelineModel {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if prompt.contains("Extracted Abstract") {
            return Ok(ABSTRACT.to_string());
        }
        if prompt.contains("Extracted References Section") {
            return Ok(self
                .references_section
                .clone()
                .unwrap_or_else(|| "REFERENCES_NOT_FOUND".to_string()));
        }
        if prompt.contains("Raw References Text") {
            return Ok(self.parsed_references.clone());
        }
        if let Some(line) = prompt.lines().find(|l| l.starts_with("CITED PAPER TITLE: ")) {
            let title = line.trim_start_matches("CITED PAPER TITLE: ").trim();
            if let Some(&millis) = self.judge_delays.get(title) {
                tokio::time::sleep(Duration::from_millis(millis)).await;
            }
            return Ok(format!(
                r#"{{"evaluation": "good", "confidence": 0.9, "reasoning": "Judged {}", "relevance_score": 0.8, "relationship_type": "supportive"}}"#,
                title
            ));
        }
        Err(ServiceError::Llm("unexpected prompt".to_string()))
    }
}

/// Identifier lookup backed by a fixed table of records.
#[derive(Default)]
pub struct TableLookup(pub HashMap<String, String>);

#[async_trait]
impl PaperLookup for TableLookup {
    async fn lookup(&self, identifier: &str) -> Result<String, ServiceError> {
        self.0.get(identifier).cloned().ok_or(ServiceError::Status {
            service: "arXiv",
            status: 404,
        })
    }
}

/// Web search that never finds anything.
pub struct EmptySearch;

#[async_trait]
impl WebSearch for EmptySearch {
    async fn search(&self, _query: &str) -> Result<WebSearchResults, ServiceError> {
        Ok(WebSearchResults::default())
    }
}

pub fn collaborators(
    text: Option<&str>,
    model: PipelineModel,
    lookup: TableLookup,
    web_search: bool,
) -> Collaborators {
    Collaborators {
        text_extractor: Arc::new(FixedText(text.map(str::to_string))),
        llm: Arc::new(model),
        paper_lookup: Arc::new(lookup),
        web_search: web_search.then(|| Arc::new(EmptySearch) as Arc<dyn WebSearch>),
        call_timeout: Duration::from_secs(5),
    }
}

pub fn record(summary: &str) -> String {
    format!("Published: 2023-01-01\nTitle: Cited\nAuthors: Someone\nSummary: {}", summary)
}
