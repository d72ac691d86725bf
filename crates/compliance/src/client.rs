//! HTTP implementation of the compliance and optimization seams.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use creative_core::config::ServiceConfig;
use creative_core::{AnalysisResult, Creative, CreativeError, CreativeResult, ImagePayload};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::service::{ComplianceService, ImageOptimizer};
use crate::wire::{OptimizeOptions, OptimizeRequest, OptimizeResponse, Remediation};

const HEALTH_PATH: &str = "/";
const ANALYZE_PATH: &str = "/analyze";
const FIX_PATH: &str = "/fix";
const OPTIMIZE_PATH: &str = "/optimize";

/// JSON-over-HTTP client for the analysis service.
#[derive(Debug, Clone)]
pub struct HttpComplianceClient {
    base_url: String,
    client: Client,
}

impl HttpComplianceClient {
    pub fn new(config: &ServiceConfig) -> CreativeResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| CreativeError::Config(format!("failed to build HTTP client: {e}")))?;

        info!(
            base_url = %config.base_url,
            timeout_ms = config.timeout_ms,
            "compliance client initialized"
        );

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET /`, returning the service banner message.
    pub async fn health(&self) -> CreativeResult<String> {
        let request = self.client.get(self.url(HEALTH_PATH));
        let body = self.send_object(HEALTH_PATH, request).await?;
        Ok(body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("ok")
            .to_string())
    }

    /// POST a JSON body and return the decoded response object.
    async fn post_object<B: Serialize + ?Sized>(
        &self,
        path: &'static str,
        body: &B,
    ) -> CreativeResult<Map<String, Value>> {
        let request = self.client.post(self.url(path)).json(body);
        self.send_object(path, request).await
    }

    /// Send a request and decode its object body. Every endpoint goes
    /// through here so requests and failures are counted the same way.
    async fn send_object(
        &self,
        endpoint: &'static str,
        request: RequestBuilder,
    ) -> CreativeResult<Map<String, Value>> {
        let start = Instant::now();
        metrics::counter!("compliance.requests", "endpoint" => endpoint).increment(1);

        let result = match request.send().await {
            Ok(response) => read_object(response).await,
            Err(e) => Err(transport_error(e)),
        };

        let latency_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(endpoint, latency_ms, "compliance request complete"),
            Err(e) => {
                metrics::counter!("compliance.errors", "endpoint" => endpoint, "kind" => e.kind())
                    .increment(1);
                warn!(endpoint, latency_ms, error = %e, "compliance request failed");
            }
        }
        result
    }
}

fn transport_error(err: reqwest::Error) -> CreativeError {
    if err.is_timeout() {
        CreativeError::Transport(format!("request timed out: {err}"))
    } else {
        CreativeError::Transport(err.to_string())
    }
}

/// Status check, then JSON decode, then object check, in that order.
async fn read_object(response: reqwest::Response) -> CreativeResult<Map<String, Value>> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CreativeError::Service {
            status_code: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await.map_err(transport_error)?;
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
        CreativeError::Decode(format!(
            "{e}; body: {}",
            String::from_utf8_lossy(&bytes[..bytes.len().min(200)])
        ))
    })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(CreativeError::Shape(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn from_object<T: DeserializeOwned>(map: Map<String, Value>) -> CreativeResult<T> {
    serde_json::from_value(Value::Object(map)).map_err(|e| CreativeError::Shape(e.to_string()))
}

#[async_trait]
impl ComplianceService for HttpComplianceClient {
    async fn analyze(&self, creative: &Creative) -> CreativeResult<AnalysisResult> {
        let body = self.post_object(ANALYZE_PATH, creative).await?;
        let result: AnalysisResult = from_object(body)?;
        info!(
            status = %result.status,
            score = ?result.score,
            issues = result.issues.len(),
            "analysis received"
        );
        Ok(result)
    }

    async fn remediate(&self, creative: &Creative) -> CreativeResult<Remediation> {
        let body = self.post_object(FIX_PATH, creative).await?;
        let remediation: Remediation = from_object(body)?;
        info!(
            fixes = remediation.applied_fixes.len(),
            has_fixed_creative = remediation.fixed_creative.is_some(),
            has_analysis_after = remediation.analysis_after.is_some(),
            "remediation received"
        );
        Ok(remediation)
    }
}

#[async_trait]
impl ImageOptimizer for HttpComplianceClient {
    async fn optimize(
        &self,
        image: &ImagePayload,
        options: &OptimizeOptions,
    ) -> CreativeResult<ImagePayload> {
        let request = OptimizeRequest::new(image, options);
        let body = self.post_object(OPTIMIZE_PATH, &request).await?;
        let response: OptimizeResponse = from_object(body)?;

        let Some(data_url) = response.data_url else {
            return Err(CreativeError::Shape(format!(
                "optimize response has no data_url{}",
                response
                    .error
                    .map(|e| format!(" ({e})"))
                    .unwrap_or_default()
            )));
        };

        let optimized = ImagePayload::from_data_url(&data_url)?;
        debug!(
            input_bytes = image.len(),
            output_bytes = optimized.len(),
            reported_bytes = ?response.size_bytes,
            quality = ?response.quality,
            "image optimized"
        );
        Ok(optimized)
    }
}
