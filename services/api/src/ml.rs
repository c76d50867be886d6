//! HTTP client for the external ML service
//!
//! Handlers talk to the ML service only through [`MlClient`], so transport
//! failures arrive as [`UpstreamError`] values and tests can substitute the
//! service entirely.

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Bytes;
use common::error::UpstreamError;
use reqwest::{Client, RequestBuilder, header::CONTENT_TYPE};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

use crate::models::{
    employee::Employee,
    ml::{BulkPrediction, FeedbackHistory, Prediction, SentimentQuery, SentimentReport},
};

/// Name reported in upstream errors
pub const SERVICE_NAME: &str = "ml-service";

/// ML service configuration
#[derive(Debug, Clone)]
pub struct MlServiceConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl MlServiceConfig {
    /// Create a new MlServiceConfig from environment variables
    ///
    /// # Environment Variables
    /// - `ML_SERVICE_URL`: Base URL of the ML service (default: http://localhost:5001)
    /// - `ML_SERVICE_TIMEOUT_SECONDS`: Request timeout (default: 30)
    pub fn from_env() -> Self {
        let base_url = std::env::var("ML_SERVICE_URL")
            .unwrap_or_else(|_| "http://localhost:5001".to_string());

        let timeout_seconds = std::env::var("ML_SERVICE_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        MlServiceConfig {
            base_url,
            timeout_seconds,
        }
    }
}

/// Typed operations offered by the ML service
#[async_trait]
pub trait MlClient: Send + Sync {
    /// Score one employee
    async fn predict(&self, employee: &Employee) -> Result<Prediction, UpstreamError>;

    /// Score a batch of employees
    async fn predict_bulk(&self, employees: &[Employee]) -> Result<BulkPrediction, UpstreamError>;

    /// Aggregated sentiment report
    async fn sentiment(&self, query: &SentimentQuery) -> Result<SentimentReport, UpstreamError>;

    /// Feedback recorded for one employee
    async fn feedback(&self, employee_id: i64) -> Result<FeedbackHistory, UpstreamError>;

    /// Forward an uploaded feedback file untouched
    async fn upload_feedback(
        &self,
        content_type: Option<String>,
        body: Bytes,
    ) -> Result<Value, UpstreamError>;
}

/// `MlClient` speaking JSON over HTTP
#[derive(Clone)]
pub struct HttpMlClient {
    base_url: String,
    http: Client,
}

impl HttpMlClient {
    pub fn new(config: &MlServiceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, UpstreamError> {
        let response = request.send().await.map_err(|e| {
            warn!("ML service request failed: {}", e);
            UpstreamError::Unreachable {
                service: SERVICE_NAME.to_string(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unreachable {
                service: SERVICE_NAME.to_string(),
                message: e.to_string(),
            })?;

        if !status.is_success() {
            let message = error_message(&body);
            warn!("ML service responded with {}: {}", status, message);
            return Err(UpstreamError::Status {
                service: SERVICE_NAME.to_string(),
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            debug!("Undecodable ML service body: {}", String::from_utf8_lossy(&body));
            UpstreamError::InvalidResponse {
                service: SERVICE_NAME.to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// Best-effort message from an error body
fn error_message(body: &[u8]) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        error: Option<String>,
    }

    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_else(|| String::from_utf8_lossy(body).chars().take(200).collect())
}

#[async_trait]
impl MlClient for HttpMlClient {
    async fn predict(&self, employee: &Employee) -> Result<Prediction, UpstreamError> {
        self.send(self.http.post(self.url("/predict")).json(employee))
            .await
    }

    async fn predict_bulk(&self, employees: &[Employee]) -> Result<BulkPrediction, UpstreamError> {
        self.send(
            self.http
                .post(self.url("/predict/bulk"))
                .json(&json!({ "employees": employees })),
        )
        .await
    }

    async fn sentiment(&self, query: &SentimentQuery) -> Result<SentimentReport, UpstreamError> {
        self.send(self.http.get(self.url("/sentiment")).query(query))
            .await
    }

    async fn feedback(&self, employee_id: i64) -> Result<FeedbackHistory, UpstreamError> {
        let url = self.url(&format!("/feedback/{}", employee_id));
        self.send(self.http.get(url)).await
    }

    async fn upload_feedback(
        &self,
        content_type: Option<String>,
        body: Bytes,
    ) -> Result<Value, UpstreamError> {
        let mut request = self.http.post(self.url("/upload-feedback")).body(body);
        if let Some(content_type) = content_type {
            request = request.header(CONTENT_TYPE, content_type);
        }
        self.send(request).await
    }
}
