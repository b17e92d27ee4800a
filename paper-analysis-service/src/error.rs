use thiserror::Error;

/// Failure of a single call to an external collaborator.
///
/// The citation pipeline never lets these escape: each stage folds them into
/// its sentinel or default value. Only text extraction is allowed to abort a run,
/// and it does so through [`AnalysisError`].
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("{service} returned HTTP {status}")]
    Status { service: &'static str, status: u16 },
    #[error("LLM call failed: {0}")]
    Llm(String),
    #[error("{service} call timed out after {seconds}s")]
    Timeout { service: &'static str, seconds: u64 },
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("PDF error: {0}")]
    Pdf(String),
    #[error("configuration error: {0}")]
    Config(String),
}

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("failed to load PDF: {0}")]
    TextExtraction(String),
    #[error("AI content detection failed: {0}")]
    Detection(String),
    #[error("configuration error: {0}")]
    Config(String),
}
