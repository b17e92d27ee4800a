//! Finding an external summary for a parsed citation.
//!
//! Path A asks the identifier lookup service when the citation carries an
//! arXiv id. Path B, a web search built from title and authors, runs only
//! when path A is unavailable or yields nothing usable.

use tracing::{debug, info, warn};

use super::identifiers::normalize_identifier;
use super::utils::collapse_whitespace;
use crate::clients::{Collaborators, WebSearchResults};
use crate::models::{Citation, ResolvedSummary, SummarySource};

const SUMMARY_LABELS: [&str; 2] = ["Summary:", "Abstract:"];
const SUMMARY_TERMINATORS: [&str; 4] = ["\n\n", "\nPublished:", "\nAuthors:", "\nTitle:"];
const HEADER_LABELS: [&str; 5] = ["Title:", "Authors:", "Published:", "Entry ID:", "Links:"];
const MIN_CONTENT_LINE_CHARS: usize = 20;
const MAX_CONTENT_LINES: usize = 15;

pub const NO_WEB_SUMMARY: &str = "ERROR: No usable summary found from web search.";

/// Resolve a citation to an external summary. Never fails; an unresolved
/// citation carries an empty summary and the last error string.
pub async fn resolve(collaborators: &Collaborators, citation: &Citation) -> ResolvedSummary {
    let mut last_error = None;

    if let Some(identifier) = citation.identifier.as_deref().and_then(normalize_identifier) {
        match lookup_summary(collaborators, &identifier).await {
            Ok(summary) if !summary.is_empty() => {
                info!(%identifier, "Citation resolved by identifier lookup");
                return ResolvedSummary::resolved(summary, SummarySource::IdentifierLookup);
            }
            Ok(_) => debug!(%identifier, "Identifier lookup returned no summary text"),
            Err(error) => {
                warn!(%identifier, %error, "Identifier lookup failed");
                last_error = Some(error);
            }
        }
    }

    if collaborators.web_search.is_none() {
        return ResolvedSummary::unresolved(last_error);
    }

    let query = build_search_query(citation);
    if query.is_empty() {
        return ResolvedSummary::unresolved(last_error);
    }

    match collaborators.search(&query).await {
        Ok(results) => match summary_from_search(&results) {
            Some(summary) => {
                info!(%query, "Citation resolved by web search");
                ResolvedSummary::resolved(summary, SummarySource::WebSearch)
            }
            None => {
                warn!(%query, "Web search returned no usable summary");
                ResolvedSummary::unresolved(Some(NO_WEB_SUMMARY.to_string()))
            }
        },
        Err(e) => {
            warn!(%query, error = %e, "Web search failed");
            ResolvedSummary::unresolved(Some(format!("ERROR: Web search failed: {}", e)))
        }
    }
}

async fn lookup_summary(collaborators: &Collaborators, identifier: &str) -> Result<String, String> {
    collaborators
        .lookup(identifier)
        .await
        .map(|record| extract_summary(&record))
        .map_err(|e| {
            format!(
                "ERROR: Could not retrieve arXiv summary for {}: {}",
                identifier, e
            )
        })
}

/// Pull the summary out of a formatted lookup record.
///
/// Prefers a labelled `Summary:` or `Abstract:` field, cut at the first
/// terminator. Without a label, falls back to the record's longer non-header
/// lines. The result is collapsed onto a single line.
pub fn extract_summary(record: &str) -> String {
    let body = SUMMARY_LABELS
        .iter()
        .find_map(|label| labeled_field(record, label))
        .map(str::to_string)
        .unwrap_or_else(|| content_lines(record));
    collapse_whitespace(&body)
}

fn labeled_field<'a>(record: &'a str, label: &str) -> Option<&'a str> {
    let start = record.find(label)? + label.len();
    let rest = &record[start..];
    let end = SUMMARY_TERMINATORS
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn content_lines(record: &str) -> String {
    record
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > MIN_CONTENT_LINE_CHARS)
        .filter(|line| !HEADER_LABELS.iter().any(|header| line.contains(header)))
        .take(MAX_CONTENT_LINES)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Free-text query for the web search: labelled, quoted title and authors
/// when known, otherwise the raw citation.
pub fn build_search_query(citation: &Citation) -> String {
    let mut parts = Vec::new();
    if !citation.title.trim().is_empty() {
        parts.push(format!("title: \"{}\"", citation.title.trim()));
    }
    if !citation.authors.trim().is_empty() {
        parts.push(format!("authors: \"{}\"", citation.authors.trim()));
    }
    if parts.is_empty() {
        citation.raw_text.trim().to_string()
    } else {
        parts.join(" ")
    }
}

/// The generated answer if present, else the first result's content.
pub fn summary_from_search(results: &WebSearchResults) -> Option<String> {
    let non_empty = |text: &Option<String>| {
        text.as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    };
    non_empty(&results.answer).or_else(|| {
        results
            .results
            .first()
            .and_then(|hit| non_empty(&hit.content))
    })
}
