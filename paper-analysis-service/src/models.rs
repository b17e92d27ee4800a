use serde::{Deserialize, Serialize};
use std::fmt;

/// One entry parsed out of a paper's references section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub authors: String,
    /// Normalized arXiv identifier, absent when none could be found.
    pub identifier: Option<String>,
    /// Verbatim citation text. Never empty.
    pub raw_text: String,
}

/// Which resolution path produced a citation summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummarySource {
    IdentifierLookup,
    WebSearch,
    None,
}

/// External summary attached to a citation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedSummary {
    /// Summary text; empty when the citation could not be resolved.
    pub summary: String,
    pub source: SummarySource,
    /// Last error string reported by a resolution path, if any.
    pub error: Option<String>,
}

impl ResolvedSummary {
    pub fn resolved(summary: impl Into<String>, source: SummarySource) -> Self {
        Self {
            summary: summary.into(),
            source,
            error: None,
        }
    }

    pub fn unresolved(error: Option<String>) -> Self {
        Self {
            summary: String::new(),
            source: SummarySource::None,
            error,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !self.summary.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationCategory {
    Good,
    Bad,
    Marginal,
    UnableToEvaluate,
}

impl EvaluationCategory {
    pub const ALL: [EvaluationCategory; 4] = [
        EvaluationCategory::Good,
        EvaluationCategory::Bad,
        EvaluationCategory::Marginal,
        EvaluationCategory::UnableToEvaluate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationCategory::Good => "good",
            EvaluationCategory::Bad => "bad",
            EvaluationCategory::Marginal => "marginal",
            EvaluationCategory::UnableToEvaluate => "unable_to_evaluate",
        }
    }

    /// Parses a verdict produced by the relevance judge. Only the three
    /// judgement values are accepted; `unable_to_evaluate` is reserved for
    /// locally synthesized evaluations.
    pub fn from_judgement(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "good" => Some(EvaluationCategory::Good),
            "bad" => Some(EvaluationCategory::Bad),
            "marginal" => Some(EvaluationCategory::Marginal),
            _ => None,
        }
    }
}

impl fmt::Display for EvaluationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipType {
    Foundational,
    Methodological,
    Comparative,
    Supportive,
    Tangential,
    Unrelated,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipType::Foundational => "foundational",
            RelationshipType::Methodological => "methodological",
            RelationshipType::Comparative => "comparative",
            RelationshipType::Supportive => "supportive",
            RelationshipType::Tangential => "tangential",
            RelationshipType::Unrelated => "unrelated",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "foundational" => Some(RelationshipType::Foundational),
            "methodological" => Some(RelationshipType::Methodological),
            "comparative" => Some(RelationshipType::Comparative),
            "supportive" => Some(RelationshipType::Supportive),
            "tangential" => Some(RelationshipType::Tangential),
            "unrelated" => Some(RelationshipType::Unrelated),
            _ => None,
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relevance verdict for a citation.
///
/// Fields are read-only; construction always clamps `confidence` and
/// `relevance_score` into `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Evaluation {
    evaluation: EvaluationCategory,
    confidence: f64,
    reasoning: String,
    relevance_score: f64,
    relationship_type: RelationshipType,
}

impl Evaluation {
    pub fn new(
        evaluation: EvaluationCategory,
        confidence: f64,
        reasoning: impl Into<String>,
        relevance_score: f64,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            evaluation,
            confidence: clamp_unit(confidence),
            reasoning: reasoning.into(),
            relevance_score: clamp_unit(relevance_score),
            relationship_type,
        }
    }

    /// Evaluation synthesized without consulting the judge.
    pub fn unable(reasoning: impl Into<String>) -> Self {
        Self::new(
            EvaluationCategory::UnableToEvaluate,
            0.0,
            reasoning,
            0.0,
            RelationshipType::Unrelated,
        )
    }

    pub fn evaluation(&self) -> EvaluationCategory {
        self.evaluation
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    pub fn relevance_score(&self) -> f64 {
        self.relevance_score
    }

    pub fn relationship_type(&self) -> RelationshipType {
        self.relationship_type
    }
}

/// Clamp into `[0, 1]`; NaN counts as 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// A citation together with what the pipeline learned about it.
#[derive(Debug, Clone, Serialize)]
pub struct VerifiedCitation {
    pub citation: Citation,
    pub summary: ResolvedSummary,
    pub evaluation: Evaluation,
}

/// Result of one citation verification run.
#[derive(Debug, Clone, Serialize)]
pub struct CitationReport {
    pub main_abstract: String,
    /// In the order the citations were parsed.
    pub references: Vec<VerifiedCitation>,
}

impl CitationReport {
    pub fn empty(main_abstract: impl Into<String>) -> Self {
        Self {
            main_abstract: main_abstract.into(),
            references: Vec::new(),
        }
    }
}

/// Output of AI-generated content detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiDetection {
    /// Human-likeness score in `[0, 100]`; lower means more likely generated.
    pub score: f64,
    pub raw: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiVerdict {
    AiGenerated,
    LikelyAi,
    Uncertain,
    MostlyHuman,
    HumanWritten,
}

impl AiVerdict {
    pub fn from_score(score: f64) -> Self {
        if score <= 20.0 {
            AiVerdict::AiGenerated
        } else if score <= 40.0 {
            AiVerdict::LikelyAi
        } else if score <= 60.0 {
            AiVerdict::Uncertain
        } else if score <= 80.0 {
            AiVerdict::MostlyHuman
        } else {
            AiVerdict::HumanWritten
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AiVerdict::AiGenerated => "AI Generated",
            AiVerdict::LikelyAi => "Likely AI",
            AiVerdict::Uncertain => "Uncertain",
            AiVerdict::MostlyHuman => "Mostly Human",
            AiVerdict::HumanWritten => "Human Written",
        }
    }
}

/// Everything produced for one uploaded paper.
#[derive(Debug, Clone, Serialize)]
pub struct PaperAnalysis {
    pub pdf_path: String,
    pub summary: String,
    pub novelty: String,
    pub citations: CitationReport,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzePaperRequest {
    pub pdf_path: String,
}
