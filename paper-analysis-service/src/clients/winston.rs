use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use super::AiContentDetector;
use crate::error::ServiceError;
use crate::models::AiDetection;

const WINSTON_DETECTION_URL: &str = "https://api.gowinston.ai/v2/ai-content-detection";

/// AI-generated content detection through the Winston AI API.
#[derive(Clone)]
pub struct WinstonClient {
    client: Client,
    api_key: String,
}

impl WinstonClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl AiContentDetector for WinstonClient {
    async fn detect(&self, text: &str) -> Result<AiDetection, ServiceError> {
        let response = self
            .client
            .post(WINSTON_DETECTION_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({ "text": text }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Status {
                service: "Winston AI",
                status: response.status().as_u16(),
            });
        }

        let raw: Value = response.json().await?;
        detection_from_response(raw)
    }
}

fn detection_from_response(raw: Value) -> Result<AiDetection, ServiceError> {
    let score = raw["score"]
        .as_f64()
        .ok_or_else(|| ServiceError::InvalidResponse("missing score in detection".to_string()))?;
    Ok(AiDetection {
        score: score.clamp(0.0, 100.0),
        raw,
    })
}
