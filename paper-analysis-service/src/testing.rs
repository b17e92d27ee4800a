//! Scripted collaborators for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::clients::{
    Collaborators, LanguageModel, PaperLookup, TextExtractor, WebSearch, WebSearchResults,
};
use crate::error::ServiceError;

/// Language model answering by the first rule whose needle occurs in the prompt.
#[derive(Clone, Default)]
pub struct ScriptedModel {
    rules: Arc<Vec<(String, Result<String, String>)>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needle: &str, reply: Result<String, String>) -> Self {
        Arc::make_mut(&mut self.rules).push((needle.to_string(), reply));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, prompt: &str) -> Result<String, ServiceError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone().map_err(ServiceError::Llm))
            .unwrap_or_else(|| Err(ServiceError::Llm("unscripted prompt".to_string())))
    }
}

pub struct StaticText(pub Result<String, String>);

#[async_trait]
impl TextExtractor for StaticText {
    async fn extract_text(&self, _path: &Path) -> Result<String, ServiceError> {
        self.0.clone().map_err(ServiceError::Pdf)
    }
}

/// Lookup keyed by identifier; unknown ids fail.
#[derive(Clone, Default)]
pub struct StubLookup {
    records: Arc<HashMap<String, Result<String, String>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl StubLookup {
    pub fn with(mut self, identifier: &str, record: Result<String, String>) -> Self {
        Arc::make_mut(&mut self.records).insert(identifier.to_string(), record);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaperLookup for StubLookup {
    async fn lookup(&self, identifier: &str) -> Result<String, ServiceError> {
        self.calls.lock().unwrap().push(identifier.to_string());
        match self.records.get(identifier) {
            Some(Ok(record)) => Ok(record.clone()),
            Some(Err(message)) => Err(ServiceError::InvalidResponse(message.clone())),
            None => Err(ServiceError::Status {
                service: "arXiv",
                status: 404,
            }),
        }
    }
}

/// Web search returning the same canned results for every query.
#[derive(Clone)]
pub struct StubSearch {
    reply: Result<WebSearchResults, String>,
    queries: Arc<Mutex<Vec<String>>>,
}

impl StubSearch {
    pub fn new(reply: Result<WebSearchResults, String>) -> Self {
        Self {
            reply,
            queries: Arc::default(),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSearch for StubSearch {
    async fn search(&self, query: &str) -> Result<WebSearchResults, ServiceError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.reply.clone().map_err(ServiceError::InvalidResponse)
    }
}

pub fn collaborators_with(model: ScriptedModel) -> Collaborators {
    Collaborators {
        text_extractor: Arc::new(StaticText(Ok("document text".to_string()))),
        llm: Arc::new(model),
        paper_lookup: Arc::new(StubLookup::default()),
        web_search: None,
        call_timeout: Duration::from_secs(5),
    }
}
