//! Locating the abstract and the references section in raw document text.
//!
//! Both extractions are single language-model calls over a bounded window of
//! the document. References get one retry over the full text when the
//! trailing window comes back empty-handed.

use tracing::{info, warn};

use super::utils::{leading_chars, trailing_chars};
use crate::clients::Collaborators;

/// Characters from the start of the document searched for the abstract.
pub const ABSTRACT_WINDOW_CHARS: usize = 6000;
/// Characters from the end of the document searched first for references.
pub const REFERENCES_WINDOW_CHARS: usize = 8000;
/// Shortest extraction accepted as a plausible references section.
pub const MIN_REFERENCES_CHARS: usize = 50;

pub const ABSTRACT_NOT_FOUND: &str = "Abstract not found.";
pub const REFERENCES_NOT_FOUND: &str = "REFERENCES_NOT_FOUND";

/// Result of a section extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionOutcome {
    Found(String),
    NotFound,
    /// The extraction call itself failed; carries the `ERROR:` tagged message.
    Failed(String),
}

impl SectionOutcome {
    pub fn found(&self) -> Option<&str> {
        match self {
            SectionOutcome::Found(text) => Some(text),
            _ => None,
        }
    }
}

fn abstract_prompt(snippet: &str) -> String {
    format!(
        r#"You are extracting the abstract from a research paper.
Read the following text, taken from the beginning of the paper, and locate the abstract.
Return ONLY the complete text of the abstract, with no commentary or formatting.
If there is no clear abstract, respond with exactly: "{ABSTRACT_NOT_FOUND}"

Document Text Snippet:
---
{snippet}
---

Extracted Abstract:"#
    )
}

/// Where the references prompt is looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReferencesWindow {
    Suffix,
    FullText,
}

impl ReferencesWindow {
    fn slice(self, text: &str) -> &str {
        match self {
            ReferencesWindow::Suffix => trailing_chars(text, REFERENCES_WINDOW_CHARS),
            ReferencesWindow::FullText => text,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            ReferencesWindow::Suffix => "text from the end of a paper",
            ReferencesWindow::FullText => "full text of a paper",
        }
    }
}

fn references_prompt(window: ReferencesWindow, text: &str) -> String {
    let scope = window.describe();
    format!(
        r#"You are extracting the References or Bibliography section from a research paper.
Read the following {scope} and locate the complete references section.
It usually starts with a heading such as:
- References
- Bibliography
- Works Cited
- Citations
Return ONLY the text of the references section, with no commentary or formatting.
If there is no clear references section, respond with exactly: "{REFERENCES_NOT_FOUND}"

Document Text ({scope}):
---
{text}
---

Extracted References Section:"#
    )
}

/// Extract the abstract from the first [`ABSTRACT_WINDOW_CHARS`] characters.
pub async fn extract_abstract(collaborators: &Collaborators, text: &str) -> SectionOutcome {
    if text.trim().is_empty() {
        return SectionOutcome::NotFound;
    }

    let snippet = leading_chars(text, ABSTRACT_WINDOW_CHARS);
    match collaborators.complete(&abstract_prompt(snippet)).await {
        Ok(response) => {
            let extracted = response.trim();
            if extracted.is_empty() || extracted.trim_matches('"') == ABSTRACT_NOT_FOUND {
                warn!("Abstract not found in document prefix");
                SectionOutcome::NotFound
            } else {
                info!(chars = extracted.len(), "Abstract extracted");
                SectionOutcome::Found(extracted.to_string())
            }
        }
        Err(e) => {
            warn!(error = %e, "Abstract extraction failed");
            SectionOutcome::Failed(format!(
                "ERROR: An error occurred during LLM abstract extraction: {}",
                e
            ))
        }
    }
}

/// How one references attempt turned out.
enum ReferencesReply {
    Accepted(String),
    Missing,
    TooShort(String),
}

fn classify_references_reply(response: &str) -> ReferencesReply {
    let extracted = response.trim();
    if extracted.trim_matches('"') == REFERENCES_NOT_FOUND || extracted.is_empty() {
        ReferencesReply::Missing
    } else if extracted.chars().count() < MIN_REFERENCES_CHARS {
        ReferencesReply::TooShort(extracted.to_string())
    } else {
        ReferencesReply::Accepted(extracted.to_string())
    }
}

/// Extract the references section.
///
/// Attempt the trailing [`REFERENCES_WINDOW_CHARS`] characters first. A
/// missing or implausibly short answer triggers exactly one retry over the
/// whole document; whatever that retry returns is final.
pub async fn extract_references(collaborators: &Collaborators, text: &str) -> SectionOutcome {
    if text.trim().is_empty() {
        return SectionOutcome::NotFound;
    }

    let mut window = ReferencesWindow::Suffix;
    loop {
        let prompt = references_prompt(window, window.slice(text));
        let reply = match collaborators.complete(&prompt).await {
            Ok(response) => classify_references_reply(&response),
            Err(e) => {
                warn!(error = %e, ?window, "References extraction failed");
                return SectionOutcome::Failed(format!(
                    "ERROR: An error occurred during LLM references section extraction: {}",
                    e
                ));
            }
        };

        match (window, reply) {
            (_, ReferencesReply::Accepted(section)) => {
                info!(?window, chars = section.len(), "References section extracted");
                return SectionOutcome::Found(section);
            }
            (ReferencesWindow::Suffix, ReferencesReply::Missing | ReferencesReply::TooShort(_)) => {
                info!("References not found near the end, retrying with the full text");
                window = ReferencesWindow::FullText;
            }
            (ReferencesWindow::FullText, ReferencesReply::TooShort(section)) => {
                return SectionOutcome::Found(section);
            }
            (ReferencesWindow::FullText, ReferencesReply::Missing) => {
                warn!("No references section found in the document");
                return SectionOutcome::NotFound;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedModel, collaborators_with};

    fn references_text() -> String {
        "[1] A. Author. A very long and relevant paper title. In Proceedings, 2020.\n\
         [2] B. Author. Another paper. arXiv:2301.07041, 2023."
            .to_string()
    }

    #[tokio::test]
    async fn abstract_uses_document_prefix_only() {
        let model = ScriptedModel::new().on("Extracted Abstract", Ok("We study X.".into()));
        let collaborators = collaborators_with(model.clone());
        let document = format!("Abstract: We study X.{}TAIL-MARKER", " filler".repeat(2000));

        let outcome = extract_abstract(&collaborators, &document).await;

        assert_eq!(outcome, SectionOutcome::Found("We study X.".to_string()));
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(!prompts[0].contains("TAIL-MARKER"));
    }

    #[tokio::test]
    async fn abstract_sentinel_means_not_found() {
        let model = ScriptedModel::new().on("Extracted Abstract", Ok("Abstract not found.".into()));
        let collaborators = collaborators_with(model);

        let outcome = extract_abstract(&collaborators, "Some text").await;
        assert_eq!(outcome, SectionOutcome::NotFound);
    }

    #[tokio::test]
    async fn abstract_call_failure_is_tagged() {
        let model = ScriptedModel::new().on("Extracted Abstract", Err("rate limited".into()));
        let collaborators = collaborators_with(model);

        match extract_abstract(&collaborators, "Some text").await {
            SectionOutcome::Failed(message) => {
                assert!(message.starts_with("ERROR:"));
                assert!(message.contains("rate limited"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn references_found_in_suffix_skip_retry() {
        let model = ScriptedModel::new().on("end of a paper", Ok(references_text()));
        let collaborators = collaborators_with(model.clone());

        let outcome = extract_references(&collaborators, "body text").await;

        assert_eq!(outcome, SectionOutcome::Found(references_text()));
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn short_suffix_answer_retries_with_full_text() {
        let model = ScriptedModel::new()
            .on("end of a paper", Ok("[1] Too short.".into()))
            .on("full text of a paper", Ok(references_text()));
        let collaborators = collaborators_with(model.clone());
        let document = format!("HEAD-MARKER{}", " body".repeat(3000));

        let outcome = extract_references(&collaborators, &document).await;

        assert_eq!(outcome, SectionOutcome::Found(references_text()));
        let prompts = model.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(!prompts[0].contains("HEAD-MARKER"));
        assert!(prompts[1].contains("HEAD-MARKER"));
    }

    #[tokio::test]
    async fn sentinel_twice_is_not_found() {
        let model = ScriptedModel::new().on("Extracted References", Ok("REFERENCES_NOT_FOUND".into()));
        let collaborators = collaborators_with(model.clone());

        let outcome = extract_references(&collaborators, "no bibliography here").await;

        assert_eq!(outcome, SectionOutcome::NotFound);
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test]
    async fn references_call_failure_is_tagged() {
        let model = ScriptedModel::new().on("Extracted References", Err("connection reset".into()));
        let collaborators = collaborators_with(model.clone());

        let outcome = extract_references(&collaborators, "text").await;

        assert!(matches!(outcome, SectionOutcome::Failed(ref m) if m.starts_with("ERROR:")));
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn empty_document_makes_no_calls() {
        let model = ScriptedModel::new();
        let collaborators = collaborators_with(model.clone());

        assert_eq!(extract_abstract(&collaborators, "  ").await, SectionOutcome::NotFound);
        assert_eq!(extract_references(&collaborators, "").await, SectionOutcome::NotFound);
        assert!(model.prompts().is_empty());
    }
}
