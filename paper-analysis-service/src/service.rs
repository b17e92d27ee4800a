use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    middleware::from_fn,
    response::Json,
    routing::{get, post},
};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Value, json};
use std::path::PathBuf;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AnalysisError;
use crate::models::{AiDetection, AiVerdict, AnalyzePaperRequest, PaperAnalysis};
use crate::telemetry::correlation_id_middleware;
use crate::workflow::PaperAnalyzer;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "analysis_id": id
        })),
    )
}

fn analysis_error(message: &str, err: &AnalysisError) -> ApiError {
    let status = match err {
        AnalysisError::TextExtraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AnalysisError::Detection(_) | AnalysisError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({
            "error": message,
            "details": err.to_string()
        })),
    )
}

/// AI-content detection result as stored and returned.
#[derive(Debug, Clone, Serialize)]
pub struct AiDetectionResult {
    pub score: f64,
    pub verdict: AiVerdict,
    pub label: &'static str,
    /// Detector response as received.
    pub raw: Value,
}

impl From<AiDetection> for AiDetectionResult {
    fn from(detection: AiDetection) -> Self {
        let verdict = AiVerdict::from_score(detection.score);
        Self {
            score: detection.score,
            verdict,
            label: verdict.label(),
            raw: detection.raw,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoredAnalysis {
    pub analysis: PaperAnalysis,
    pub ai_detection: Option<AiDetectionResult>,
}

#[derive(Clone)]
pub struct AppState {
    pub analyzer: PaperAnalyzer,
    pub analyses: Arc<DashMap<String, StoredAnalysis>>,
}

impl AppState {
    pub fn new(analyzer: PaperAnalyzer) -> Self {
        Self {
            analyzer,
            analyses: Arc::new(DashMap::new()),
        }
    }
}

pub fn create_app(config: &AppConfig) -> Result<Router, AnalysisError> {
    let analyzer = PaperAnalyzer::from_config(config)?;
    Ok(build_router(AppState::new(analyzer)))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/papers/analyze", post(analyze_paper))
        .route(
            "/papers/{analysis_id}",
            get(get_analysis).delete(delete_analysis),
        )
        .route("/papers/{analysis_id}/ai-detection", post(detect_ai_content))
        .route("/citations/verify", post(verify_citations))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(correlation_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Paper Analysis Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Research paper summary, novelty assessment and citation relevance verification",
        "endpoints": {
            "POST /papers/analyze": "Analyze a PDF: summary, novelty and citation report",
            "GET /papers/{analysis_id}": "Get a stored analysis",
            "DELETE /papers/{analysis_id}": "Discard a stored analysis",
            "POST /papers/{analysis_id}/ai-detection": "Score the analyzed PDF for AI-generated content",
            "POST /citations/verify": "Run citation verification only",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

fn validate_pdf_path(pdf_path: &str) -> Result<PathBuf, ApiError> {
    let trimmed = pdf_path.trim();
    if trimmed.is_empty() {
        return Err(bad_request_error("PDF path is required"));
    }
    Ok(PathBuf::from(trimmed))
}

fn analysis_body(analysis_id: &str, stored: &StoredAnalysis) -> Value {
    let citations = &stored.analysis.citations;
    json!({
        "analysis_id": analysis_id,
        "pdf_path": stored.analysis.pdf_path,
        "summary": stored.analysis.summary,
        "novelty": stored.analysis.novelty,
        "citations": citations,
        "rows": citations.display_rows(),
        "quality_summary": citations.quality_summary(),
        "ai_detection": stored.ai_detection,
    })
}

async fn analyze_paper(
    State(state): State<AppState>,
    Json(request): Json<AnalyzePaperRequest>,
) -> ApiResult<Value> {
    let path = validate_pdf_path(&request.pdf_path)?;
    info!(pdf_path = %path.display(), "Starting paper analysis");

    let analysis = state.analyzer.analyze(&path).await.map_err(|e| {
        error!(error = %e, "Paper analysis failed");
        analysis_error("Failed to analyze paper", &e)
    })?;

    let analysis_id = Uuid::new_v4().to_string();
    let body = json!({
        "analysis_id": analysis_id,
        "summary": analysis.summary,
        "novelty": analysis.novelty,
        "citations": analysis.citations,
    });
    state.analyses.insert(
        analysis_id.clone(),
        StoredAnalysis {
            analysis,
            ai_detection: None,
        },
    );
    info!(%analysis_id, "Analysis stored");
    Ok(Json(body))
}

async fn get_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Value> {
    match state.analyses.get(&analysis_id) {
        Some(stored) => Ok(Json(analysis_body(&analysis_id, &stored))),
        None => Err(not_found_error("Analysis not found", &analysis_id)),
    }
}

async fn delete_analysis(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<Value> {
    match state.analyses.remove(&analysis_id) {
        Some(_) => {
            info!(%analysis_id, "Analysis deleted");
            Ok(Json(json!({ "analysis_id": analysis_id, "deleted": true })))
        }
        None => Err(not_found_error("Analysis not found", &analysis_id)),
    }
}

async fn detect_ai_content(
    State(state): State<AppState>,
    Path(analysis_id): Path<String>,
) -> ApiResult<AiDetectionResult> {
    // Clone the path out so no map guard is held across the detection call.
    let pdf_path = state
        .analyses
        .get(&analysis_id)
        .map(|stored| PathBuf::from(&stored.analysis.pdf_path))
        .ok_or_else(|| not_found_error("Analysis not found", &analysis_id))?;

    let detection = state
        .analyzer
        .detect_ai_content(&pdf_path)
        .await
        .map_err(|e| analysis_error("Failed to detect AI content", &e))?;
    let result = AiDetectionResult::from(detection);
    info!(%analysis_id, score = result.score, verdict = result.label, "AI detection finished");

    if let Some(mut stored) = state.analyses.get_mut(&analysis_id) {
        stored.ai_detection = Some(result.clone());
    }
    Ok(Json(result))
}

async fn verify_citations(
    State(state): State<AppState>,
    Json(request): Json<AnalyzePaperRequest>,
) -> ApiResult<Value> {
    let path = validate_pdf_path(&request.pdf_path)?;
    info!(pdf_path = %path.display(), "Starting citation verification");

    let report = state.analyzer.verifier().verify(&path).await.map_err(|e| {
        error!(error = %e, "Citation verification failed");
        analysis_error("Failed to verify citations", &e)
    })?;

    Ok(Json(json!({
        "main_abstract": report.main_abstract,
        "references": report.references,
        "quality_summary": report.quality_summary(),
    })))
}
