use serde::Serialize;
use std::fmt::Write;

use crate::models::{CitationReport, EvaluationCategory, VerifiedCitation};

const RAW_TITLE_CHARS: usize = 100;

/// One row of the citation table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayRow {
    pub title: String,
    pub evaluation: EvaluationCategory,
    pub reasoning: String,
    pub relevance_score: String,
    pub relationship_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: EvaluationCategory,
    pub count: usize,
    /// Share of all references, rounded to one decimal.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySummary {
    pub total: usize,
    pub categories: Vec<CategoryCount>,
}

impl QualitySummary {
    pub fn count(&self, category: EvaluationCategory) -> usize {
        self.categories
            .iter()
            .find(|c| c.category == category)
            .map_or(0, |c| c.count)
    }
}

impl CitationReport {
    pub fn display_rows(&self) -> Vec<DisplayRow> {
        self.references.iter().map(display_row).collect()
    }

    pub fn quality_summary(&self) -> QualitySummary {
        let total = self.references.len();
        let categories = EvaluationCategory::ALL
            .iter()
            .map(|&category| {
                let count = self
                    .references
                    .iter()
                    .filter(|r| r.evaluation.evaluation() == category)
                    .count();
                let percentage = if total == 0 {
                    0.0
                } else {
                    (count as f64 * 1000.0 / total as f64).round() / 10.0
                };
                CategoryCount {
                    category,
                    count,
                    percentage,
                }
            })
            .collect();
        QualitySummary { total, categories }
    }
}

fn display_row(entry: &VerifiedCitation) -> DisplayRow {
    DisplayRow {
        title: display_title(entry),
        evaluation: entry.evaluation.evaluation(),
        reasoning: entry.evaluation.reasoning().to_string(),
        relevance_score: format!("{:.2}", entry.evaluation.relevance_score()),
        relationship_type: entry.evaluation.relationship_type().to_string(),
    }
}

fn display_title(entry: &VerifiedCitation) -> String {
    let title = entry.citation.title.trim();
    if !title.is_empty() {
        return title.to_string();
    }
    let raw = entry.citation.raw_text.trim();
    if raw.is_empty() {
        "N/A".to_string()
    } else {
        format!("{}...", raw.chars().take(RAW_TITLE_CHARS).collect::<String>())
    }
}

/// Plain-text rendering for terminal output.
pub fn render_text(report: &CitationReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Main Paper Abstract");
    let _ = writeln!(out, "> {}", report.main_abstract);
    let _ = writeln!(out);

    if report.references.is_empty() {
        let _ = writeln!(out, "No references were verified.");
        return out;
    }

    let _ = writeln!(out, "References Evaluation");
    for (index, row) in report.display_rows().iter().enumerate() {
        let _ = writeln!(out, "[{}] {}", index + 1, row.title);
        let _ = writeln!(
            out,
            "    evaluation: {}  relevance: {}  relationship: {}",
            row.evaluation, row.relevance_score, row.relationship_type
        );
        let _ = writeln!(out, "    reasoning: {}", row.reasoning);
    }

    let summary = report.quality_summary();
    let _ = writeln!(out);
    let _ = writeln!(out, "Citation Quality Summary");
    let _ = writeln!(out, "Total references processed: {}", summary.total);
    for category in &summary.categories {
        let _ = writeln!(
            out,
            "  {}: {} ({:.1}%)",
            category.category, category.count, category.percentage
        );
    }
    out
}
