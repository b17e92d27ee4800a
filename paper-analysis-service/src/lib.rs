pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod service;
pub mod tasks;
pub mod telemetry;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::AppConfig;
pub use error::{AnalysisError, ServiceError};
pub use models::*;
pub use service::{AppState, build_router, create_app};
pub use workflow::{CitationVerifier, PaperAnalyzer};
