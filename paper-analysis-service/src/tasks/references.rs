use serde_json::{Map, Value};
use tracing::{info, warn};

use super::identifiers::normalize_identifier;
use super::utils::strip_code_fence;
use crate::clients::Collaborators;
use crate::models::Citation;

fn parse_prompt(references_text: &str) -> String {
    format!(
        r#"You are parsing the list of references of an academic paper.
The text below is the raw References or Bibliography section. Identify every distinct cited entry and extract:
1. The title of the cited paper (often quoted or italicised)
2. The arXiv ID, if present. It may look like "arXiv:2301.07041", "arxiv.org/abs/2301.07041" or just "2301.07041"
3. The authors (usually at the beginning of the entry)
4. The entire text of the entry exactly as it appears

Respond with a JSON array of objects using exactly these keys:
- "title": string
- "arxiv_id": string or null
- "authors": string
- "entire_citation": string

Respond with ONLY the JSON array: no markdown, no ```json fences, no extra text.
If the entries cannot be identified with confidence, respond with an empty array [].

Raw References Text:
---
{references_text}
---"#
    )
}

/// Parse a raw references section into citations.
///
/// Never fails: a failed call or unusable output yields an empty list.
pub async fn parse_references(collaborators: &Collaborators, raw_text: &str) -> Vec<Citation> {
    if raw_text.trim().is_empty() {
        return Vec::new();
    }

    let response = match collaborators.complete(&parse_prompt(raw_text)).await {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "Reference parsing call failed");
            return Vec::new();
        }
    };

    let citations = parse_citation_list(&response);
    info!(count = citations.len(), "Parsed references");
    citations
}

/// Turn a model response into citations, repairing what can be repaired.
///
/// Attempts a direct parse after stripping code fences; on failure trims to
/// the outermost `[` ... `]` and tries once more.
pub fn parse_citation_list(response: &str) -> Vec<Citation> {
    let cleaned = strip_code_fence(response);
    if cleaned.is_empty() || cleaned == "[]" {
        return Vec::new();
    }

    let parsed = match serde_json::from_str::<Value>(cleaned) {
        Ok(value) => value,
        Err(first_err) => match outermost_list(cleaned)
            .and_then(|list| serde_json::from_str::<Value>(list).ok())
        {
            Some(value) => value,
            None => {
                warn!(error = %first_err, "Reference list is not valid JSON");
                return Vec::new();
            }
        },
    };

    match parsed {
        Value::Array(entries) => entries
            .iter()
            .filter_map(Value::as_object)
            .filter_map(citation_from_entry)
            .collect(),
        _ => {
            warn!("Reference list is not a JSON array");
            Vec::new()
        }
    }
}

fn outermost_list(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

fn citation_from_entry(entry: &Map<String, Value>) -> Option<Citation> {
    let title = field_text(entry.get("title"));
    let authors = field_text(entry.get("authors"));
    let identifier = entry
        .get("arxiv_id")
        .or_else(|| entry.get("identifier"))
        .map(|value| field_text(Some(value)))
        .and_then(|raw| normalize_identifier(&raw));

    let mut raw_text = field_text(entry.get("entire_citation"));
    if raw_text.is_empty() {
        raw_text = [authors.as_str(), title.as_str()]
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(". ");
    }
    if raw_text.is_empty() {
        return None;
    }

    Some(Citation {
        title,
        authors,
        identifier,
        raw_text,
    })
}

/// Coerce any JSON value into trimmed text.
fn field_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| field_text(Some(item)))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}
