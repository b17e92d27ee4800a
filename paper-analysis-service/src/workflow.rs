use futures_util::{StreamExt, stream};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, error, info, info_span, warn};

use crate::clients::{
    AiContentDetector, ArxivClient, Collaborators, MupdfTextExtractor, OpenRouterModel,
    TavilyClient, WebSearch, WinstonClient, with_timeout,
};
use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::models::{AiDetection, Citation, CitationReport, PaperAnalysis, VerifiedCitation};
use crate::tasks::{
    SectionOutcome, assess_novelty, evaluate, extract_abstract, extract_references,
    parse_references, resolve, summarize,
};

/// Reported in place of the abstract when it could not be extracted.
pub const ABSTRACT_PLACEHOLDER: &str = "Abstract could not be extracted or was not found.";

/// Runs the citation verification pipeline over one document.
#[derive(Clone)]
pub struct CitationVerifier {
    collaborators: Collaborators,
    concurrency: usize,
}

impl CitationVerifier {
    pub fn new(collaborators: Collaborators, concurrency: usize) -> Self {
        Self {
            collaborators,
            concurrency: concurrency.max(1),
        }
    }

    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Verify every citation of the PDF at `path`.
    ///
    /// Only a failure to extract the document text is an error; every later
    /// failure degrades into the report.
    pub async fn verify(&self, path: &Path) -> Result<CitationReport, AnalysisError> {
        let text = self.load_text(path).await?;
        Ok(self.verify_text(&text).await)
    }

    pub(crate) async fn load_text(&self, path: &Path) -> Result<String, AnalysisError> {
        self.collaborators.extract_text(path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to load PDF");
            AnalysisError::TextExtraction(e.to_string())
        })
    }

    /// Verification steps after text extraction: abstract, references
    /// section, parsing, then resolve-and-evaluate per citation.
    pub async fn verify_text(&self, text: &str) -> CitationReport {
        let started = Instant::now();

        let (main_abstract, judged_abstract) =
            match extract_abstract(&self.collaborators, text).await {
                SectionOutcome::Found(found) => (found.clone(), found),
                outcome => {
                    warn!(?outcome, "Using abstract placeholder");
                    (ABSTRACT_PLACEHOLDER.to_string(), String::new())
                }
            };

        let references_text = match extract_references(&self.collaborators, text).await {
            SectionOutcome::Found(section) => section,
            outcome => {
                info!(?outcome, "No references section, returning empty report");
                return CitationReport::empty(main_abstract);
            }
        };

        let citations = parse_references(&self.collaborators, &references_text).await;
        if citations.is_empty() {
            info!("No citations parsed, returning empty report");
            return CitationReport::empty(main_abstract);
        }

        let total = citations.len();
        info!(total, concurrency = self.concurrency, "Verifying citations");

        // `buffered` keeps results in input order regardless of completion order.
        let references: Vec<VerifiedCitation> = stream::iter(citations.into_iter().enumerate())
            .map(|(index, citation)| self.verify_citation(index, total, &judged_abstract, citation))
            .buffered(self.concurrency)
            .collect()
            .await;

        info!(
            total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Citation verification finished"
        );
        CitationReport {
            main_abstract,
            references,
        }
    }

    async fn verify_citation(
        &self,
        index: usize,
        total: usize,
        main_abstract: &str,
        citation: Citation,
    ) -> VerifiedCitation {
        let span = info_span!("citation", citation_index = index + 1, total);
        async move {
            let summary = resolve(&self.collaborators, &citation).await;
            let evaluation = evaluate(
                &self.collaborators,
                main_abstract,
                &citation.title,
                &summary.summary,
            )
            .await;
            info!(
                source = ?summary.source,
                evaluation = %evaluation.evaluation(),
                "Citation processed"
            );
            VerifiedCitation {
                citation,
                summary,
                evaluation,
            }
        }
        .instrument(span)
        .await
    }
}

/// Full analysis of an uploaded paper: summary, novelty and citation report,
/// plus on-demand AI content detection.
#[derive(Clone)]
pub struct PaperAnalyzer {
    verifier: CitationVerifier,
    detector: Option<Arc<dyn AiContentDetector>>,
}

impl PaperAnalyzer {
    pub fn new(verifier: CitationVerifier, detector: Option<Arc<dyn AiContentDetector>>) -> Self {
        Self { verifier, detector }
    }

    /// Wire the production clients described by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self, AnalysisError> {
        let http = Client::builder()
            .timeout(config.call_timeout)
            .build()
            .map_err(|e| AnalysisError::Config(e.to_string()))?;

        let web_search = config.tavily_api_key.as_ref().map(|key| {
            Arc::new(TavilyClient::new(http.clone(), key.clone())) as Arc<dyn WebSearch>
        });
        if web_search.is_none() {
            warn!("TAVILY_API_KEY not set, web search fallback disabled");
        }

        let detector = config.winston_api_key.as_ref().map(|key| {
            Arc::new(WinstonClient::new(http.clone(), key.clone())) as Arc<dyn AiContentDetector>
        });

        let collaborators = Collaborators {
            text_extractor: Arc::new(MupdfTextExtractor),
            llm: Arc::new(OpenRouterModel::new(
                &config.openrouter_api_key,
                &config.llm_model,
            )),
            paper_lookup: Arc::new(ArxivClient::new(http, config.arxiv_api_url.clone())),
            web_search,
            call_timeout: config.call_timeout,
        };

        Ok(Self::new(
            CitationVerifier::new(collaborators, config.citation_concurrency),
            detector,
        ))
    }

    pub fn verifier(&self) -> &CitationVerifier {
        &self.verifier
    }

    pub fn detection_enabled(&self) -> bool {
        self.detector.is_some()
    }

    /// Extract the text once, then produce summary, novelty and citation
    /// report from it.
    pub async fn analyze(&self, path: &Path) -> Result<PaperAnalysis, AnalysisError> {
        info!(path = %path.display(), "Starting paper analysis");
        let text = self.verifier.load_text(path).await?;

        let collaborators = self.verifier.collaborators();
        let (summary, novelty, citations) = tokio::join!(
            summarize(collaborators, &text),
            assess_novelty(collaborators, &text),
            self.verifier.verify_text(&text),
        );

        Ok(PaperAnalysis {
            pdf_path: path.display().to_string(),
            summary,
            novelty,
            citations,
        })
    }

    /// Score the document for machine-generated content.
    pub async fn detect_ai_content(&self, path: &Path) -> Result<AiDetection, AnalysisError> {
        let detector = self.detector.as_ref().ok_or_else(|| {
            AnalysisError::Config("WINSTON_API_KEY not set, AI detection disabled".to_string())
        })?;
        let text = self.verifier.load_text(path).await?;
        let limit = self.verifier.collaborators().call_timeout;

        with_timeout("AI detection", limit, detector.detect(&text))
            .await
            .map_err(|e| {
                error!(error = %e, "AI content detection failed");
                AnalysisError::Detection(e.to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EvaluationCategory;
    use crate::testing::{ScriptedModel, StaticText, StubLookup, collaborators_with};

    const REFERENCES: &str = "[1] Ada Lovelace. Verifying Citations at Scale. arXiv:2301.07041, 2023.";
    const PARSED: &str = r#"[{"title": "Verifying Citations at Scale", "arxiv_id": "arXiv:2301.07041",
        "authors": "Ada Lovelace", "entire_citation": "Ada Lovelace. Verifying Citations at Scale. arXiv:2301.07041, 2023."}]"#;
    const JUDGED: &str = r#"{"evaluation": "good", "confidence": 0.9, "reasoning": "Same topic.",
        "relevance_score": 0.8, "relationship_type": "foundational"}"#;

    fn pipeline_model() -> ScriptedModel {
        ScriptedModel::new()
            .on("Extracted Abstract", Ok("We verify citations.".into()))
            .on("Extracted References Section", Ok(REFERENCES.into()))
            .on("Raw References Text", Ok(PARSED.into()))
            .on("CITED PAPER TITLE", Ok(JUDGED.into()))
    }

    #[tokio::test]
    async fn text_extraction_failure_aborts() {
        let mut collaborators = collaborators_with(pipeline_model());
        collaborators.text_extractor = Arc::new(StaticText(Err("PDF file not found".into())));
        let verifier = CitationVerifier::new(collaborators, 2);

        let err = verifier.verify(Path::new("missing.pdf")).await.unwrap_err();
        assert!(matches!(err, AnalysisError::TextExtraction(ref m) if m.contains("not found")));
    }

    #[tokio::test]
    async fn missing_abstract_uses_placeholder_and_skips_judge() {
        let model = ScriptedModel::new()
            .on("Extracted Abstract", Ok("Abstract not found.".into()))
            .on("Extracted References Section", Ok(REFERENCES.into()))
            .on("Raw References Text", Ok(PARSED.into()))
            .on("CITED PAPER TITLE", Ok(JUDGED.into()));
        let mut collaborators = collaborators_with(model.clone());
        collaborators.paper_lookup = Arc::new(
            StubLookup::default().with("2301.07041", Ok("Summary: Citation checking.".into())),
        );
        let verifier = CitationVerifier::new(collaborators, 1);

        let report = verifier.verify_text("paper text").await;

        assert_eq!(report.main_abstract, ABSTRACT_PLACEHOLDER);
        assert_eq!(report.references.len(), 1);
        let evaluation = &report.references[0].evaluation;
        assert_eq!(evaluation.evaluation(), EvaluationCategory::UnableToEvaluate);
        assert!(evaluation.reasoning().contains("abstract"));
        assert!(!model.prompts().iter().any(|p| p.contains("CITED PAPER TITLE")));
    }

    #[tokio::test]
    async fn unparseable_references_give_empty_report() {
        let model = ScriptedModel::new()
            .on("Extracted Abstract", Ok("We verify citations.".into()))
            .on("Extracted References Section", Ok(REFERENCES.into()))
            .on("Raw References Text", Ok("Sorry, I cannot parse these.".into()));
        let verifier = CitationVerifier::new(collaborators_with(model), 2);

        let report = verifier.verify_text("paper text").await;

        assert_eq!(report.main_abstract, "We verify citations.");
        assert!(report.references.is_empty());
    }

    #[tokio::test]
    async fn unresolved_citation_is_unable_to_evaluate() {
        let verifier = CitationVerifier::new(collaborators_with(pipeline_model()), 2);

        let report = verifier.verify_text("paper text").await;

        assert_eq!(report.references.len(), 1);
        let entry = &report.references[0];
        assert!(!entry.summary.is_resolved());
        assert_eq!(
            entry.evaluation.evaluation(),
            EvaluationCategory::UnableToEvaluate
        );
        assert!(entry.evaluation.reasoning().contains("citation summary"));
    }

    #[tokio::test]
    async fn analyze_produces_all_sections() {
        let model = pipeline_model()
            .on("overview of the following paper", Ok("- Objective".into()))
            .on("novelty of the following paper", Ok("Novel".into()));
        let mut collaborators = collaborators_with(model);
        collaborators.paper_lookup = Arc::new(
            StubLookup::default().with("2301.07041", Ok("Summary: Citation checking.".into())),
        );
        let analyzer = PaperAnalyzer::new(CitationVerifier::new(collaborators, 2), None);

        let analysis = analyzer.analyze(Path::new("paper.pdf")).await.unwrap();

        assert_eq!(analysis.summary, "- Objective");
        assert_eq!(analysis.novelty, "Novel");
        assert_eq!(analysis.citations.references.len(), 1);
        assert_eq!(
            analysis.citations.references[0].evaluation.evaluation(),
            EvaluationCategory::Good
        );
    }

    /// Delegates to a scripted model but never answers judge prompts for one title.
    struct HungJudge {
        inner: ScriptedModel,
        hung_title: &'static str,
    }

    #[async_trait::async_trait]
    impl crate::clients::LanguageModel for HungJudge {
        async fn complete(&self, prompt: &str) -> Result<String, crate::error::ServiceError> {
            if prompt.contains(&format!("CITED PAPER TITLE: {}", self.hung_title)) {
                tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
            }
            crate::clients::LanguageModel::complete(&self.inner, prompt).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_judge_call_times_out_without_affecting_siblings() {
        let parsed = r#"[
            {"title": "Slow Paper", "arxiv_id": "2301.00001", "authors": "A", "entire_citation": "A. Slow Paper. 2023."},
            {"title": "Fast Paper", "arxiv_id": "2301.00002", "authors": "B", "entire_citation": "B. Fast Paper. 2023."}
        ]"#;
        let model = ScriptedModel::new()
            .on("Extracted Abstract", Ok("We verify citations.".into()))
            .on("Extracted References Section", Ok(REFERENCES.into()))
            .on("Raw References Text", Ok(parsed.into()))
            .on("CITED PAPER TITLE", Ok(JUDGED.into()));
        let mut collaborators = collaborators_with(model.clone());
        collaborators.llm = Arc::new(HungJudge {
            inner: model,
            hung_title: "Slow Paper",
        });
        collaborators.paper_lookup = Arc::new(
            StubLookup::default()
                .with("2301.00001", Ok("Summary: Slow summary.".into()))
                .with("2301.00002", Ok("Summary: Fast summary.".into())),
        );
        let verifier = CitationVerifier::new(collaborators, 2);

        let report = verifier.verify_text("paper text").await;

        assert_eq!(report.references.len(), 2);
        let slow = &report.references[0].evaluation;
        assert_eq!(slow.evaluation(), EvaluationCategory::UnableToEvaluate);
        assert!(slow.reasoning().contains("timed out"));
        let fast = &report.references[1].evaluation;
        assert_eq!(report.references[1].citation.title, "Fast Paper");
        assert_eq!(fast.evaluation(), EvaluationCategory::Good);
    }

    #[tokio::test]
    async fn detection_requires_configuration() {
        let analyzer = PaperAnalyzer::new(
            CitationVerifier::new(collaborators_with(ScriptedModel::new()), 1),
            None,
        );
        assert!(!analyzer.detection_enabled());
        let err = analyzer
            .detect_ai_content(Path::new("paper.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }
}
