use tracing::{info, warn};

use super::utils::leading_chars;
use crate::clients::Collaborators;

/// Characters of the paper handed to the summary and novelty prompts.
pub const SUMMARY_WINDOW_CHARS: usize = 48_000;

fn summary_prompt(paper: &str) -> String {
    format!(
        r#"You are an expert in understanding and analysing research papers.
Give a detailed and accurate overview of the following paper in bullet points.
Base every statement strictly on the paper's content; do not add outside knowledge.

Input paper:
{paper}

Instructions:
- Only include information found in the text.
- Do not use phrases like "Alternatively" or "Based on the second part".
- Use clear, concise language.
- Cover: objective / problem addressed; methods / approach; datasets / experiments (if any);
  results / findings; conclusions / implications; noted limitations or future work."#
    )
}

fn novelty_prompt(paper: &str) -> String {
    format!(
        r#"You are an expert in analysing research papers.
Identify and clearly explain the novelty of the following paper: what makes this work new,
original or unique compared to prior work in the field.

Input paper:
{paper}

Instructions:
- State the main novelty clearly.
- Briefly mention the previous work the paper discusses, if any.
- Highlight how this paper differs from or improves upon existing methods.
- Use concise bullet points or a short paragraph.
- Rely only on the paper's content."#
    )
}

/// Bullet-point overview of the paper.
pub async fn summarize(collaborators: &Collaborators, text: &str) -> String {
    let paper = leading_chars(text, SUMMARY_WINDOW_CHARS);
    match collaborators.complete(&summary_prompt(paper)).await {
        Ok(summary) => {
            info!(chars = summary.len(), "Paper summary generated");
            summary.trim().to_string()
        }
        Err(e) => {
            warn!(error = %e, "Summary generation failed");
            format!("ERROR: Summary generation failed: {}", e)
        }
    }
}

/// What the paper claims is new relative to prior work.
pub async fn assess_novelty(collaborators: &Collaborators, text: &str) -> String {
    let paper = leading_chars(text, SUMMARY_WINDOW_CHARS);
    match collaborators.complete(&novelty_prompt(paper)).await {
        Ok(novelty) => {
            info!(chars = novelty.len(), "Novelty assessment generated");
            novelty.trim().to_string()
        }
        Err(e) => {
            warn!(error = %e, "Novelty assessment failed");
            format!("ERROR: Novelty assessment failed: {}", e)
        }
    }
}
