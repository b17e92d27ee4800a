use serde_json::{Map, Value};
use tracing::{info, warn};

use super::utils::strip_code_fence;
use crate::clients::Collaborators;
use crate::models::{Evaluation, EvaluationCategory, RelationshipType, clamp_unit};

const DEFAULT_SCORE: f64 = 0.5;
const PARSE_FAILURE_CONFIDENCE: f64 = 0.3;
const MISSING_REASONING: &str = "Reasoning not fully provided by LLM.";

fn judge_prompt(main_abstract: &str, citation_title: &str, citation_summary: &str) -> String {
    format!(
        r#"You are an expert academic reviewer. Judge how relevant a CITED PAPER is to a MAIN PAPER, based on their abstracts.

MAIN PAPER ABSTRACT:
---
{main_abstract}
---

CITED PAPER TITLE: {citation_title}
CITED PAPER SUMMARY/ABSTRACT:
---
{citation_summary}
---

Respond with a JSON object ONLY, containing exactly these keys:
- "evaluation": (string) one of "good", "bad", "marginal".
- "confidence": (float) confidence in the evaluation, from 0.0 to 1.0.
- "reasoning": (string) a brief justification, at most 2-3 sentences.
- "relevance_score": (float) from 0.0 (irrelevant) to 1.0 (highly relevant).
- "relationship_type": (string) one of "foundational", "methodological", "comparative", "supportive", "tangential", "unrelated".

Criteria:
- "good": highly relevant; directly supports or relates to the main paper's core research.
- "bad": irrelevant or only very loosely related; no clear contribution.
- "marginal": some relation, perhaps background or a minor aspect, but not core.

Consider topical overlap, methodological connections, and whether the cited work strengthens the main paper.
Respond with ONLY the JSON object."#
    )
}

/// Judge how relevant a cited paper is to the main paper.
///
/// Missing inputs short-circuit to `unable_to_evaluate` without calling the
/// model. Whatever the model returns is repaired into a valid [`Evaluation`].
pub async fn evaluate(
    collaborators: &Collaborators,
    main_abstract: &str,
    citation_title: &str,
    citation_summary: &str,
) -> Evaluation {
    let missing_abstract = main_abstract.trim().is_empty();
    let missing_summary = citation_summary.trim().is_empty();
    match (missing_abstract, missing_summary) {
        (true, true) => return Evaluation::unable("Missing main abstract and citation summary."),
        (true, false) => return Evaluation::unable("Missing main abstract for evaluation."),
        (false, true) => return Evaluation::unable("Missing citation summary for evaluation."),
        (false, false) => {}
    }

    let prompt = judge_prompt(main_abstract, citation_title, citation_summary);
    match collaborators.complete(&prompt).await {
        Ok(response) => {
            let evaluation = evaluation_from_response(&response);
            info!(
                title = citation_title,
                evaluation = %evaluation.evaluation(),
                relevance = evaluation.relevance_score(),
                "Citation evaluated"
            );
            evaluation
        }
        Err(e) => {
            warn!(title = citation_title, error = %e, "Evaluation call failed");
            Evaluation::unable(format!("Error during evaluation LLM call: {}", e))
        }
    }
}

/// Repair a judge response into an [`Evaluation`].
///
/// Missing fields get defaults, scores are clamped, and an unknown verdict
/// becomes `marginal`. A response that is not a JSON object at all yields a
/// low-confidence `marginal`.
pub fn evaluation_from_response(response: &str) -> Evaluation {
    let cleaned = strip_code_fence(response);
    let fields = match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(fields)) => fields,
        _ => {
            warn!("Could not parse evaluation response");
            return Evaluation::new(
                EvaluationCategory::Marginal,
                PARSE_FAILURE_CONFIDENCE,
                "Failed to parse evaluation response.",
                0.0,
                RelationshipType::Unrelated,
            );
        }
    };

    let evaluation = fields
        .get("evaluation")
        .and_then(Value::as_str)
        .and_then(EvaluationCategory::from_judgement)
        .unwrap_or(EvaluationCategory::Marginal);
    let relationship_type = fields
        .get("relationship_type")
        .and_then(Value::as_str)
        .and_then(RelationshipType::parse)
        .unwrap_or(RelationshipType::Tangential);
    let reasoning = match fields.get("reasoning") {
        Some(Value::String(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Some(Value::Null) | None => MISSING_REASONING.to_string(),
        Some(Value::String(_)) => MISSING_REASONING.to_string(),
        Some(other) => other.to_string(),
    };

    Evaluation::new(
        evaluation,
        score_field(&fields, "confidence"),
        reasoning,
        score_field(&fields, "relevance_score"),
        relationship_type,
    )
}

/// Numeric field as a unit score, accepting numbers and numeric strings.
fn score_field(fields: &Map<String, Value>, key: &str) -> f64 {
    let value = match fields.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value
        .filter(|v| !v.is_nan())
        .map(clamp_unit)
        .unwrap_or(DEFAULT_SCORE)
}
