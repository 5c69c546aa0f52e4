// src/summarize/client.rs
//! Inference collaborator: provider abstraction + concrete clients.
//!
//! The gateway only sees [`InferenceClient`]; a failed or malformed reply is
//! `None` and the caller decides about retry/fallback. Clients never panic
//! and never surface transport errors.

use super::{InferenceReply, SummarizeRequest};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;

pub const ENV_INFERENCE_URL: &str = "TRIAGE_INFERENCE_URL";
pub const ENV_INFERENCE_TOKEN: &str = "TRIAGE_INFERENCE_TOKEN";
pub const ENV_TEST_MODE: &str = "TRIAGE_TEST_MODE";

#[async_trait::async_trait]
pub trait InferenceClient: Send + Sync {
    /// One summarization attempt. `None` on transport error, non-2xx,
    /// or undecodable body.
    async fn summarize(&self, request: &SummarizeRequest) -> Option<InferenceReply>;

    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynInferenceClient = Arc<dyn InferenceClient>;

/// Factory: build a client from the environment.
///
/// * `TRIAGE_TEST_MODE=mock` → deterministic mock client.
/// * `TRIAGE_INFERENCE_URL` set → HTTP client against that endpoint.
/// * otherwise → disabled client (rule fallback handles everything).
pub fn build_client_from_env() -> DynInferenceClient {
    if std::env::var(ENV_TEST_MODE).map(|v| v == "mock").unwrap_or(false) {
        return Arc::new(MockInferenceClient::default());
    }
    match std::env::var(ENV_INFERENCE_URL) {
        Ok(url) if !url.trim().is_empty() => Arc::new(HttpInferenceClient::new(url)),
        _ => Arc::new(DisabledClient),
    }
}

/// HTTP client for the remote summarization endpoint. Sends the canonical
/// JSON payload with a bearer token (when configured) and a SHA-256
/// integrity hash of the body in `X-Verify`.
pub struct HttpInferenceClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpInferenceClient {
    pub fn new(endpoint: String) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("notification-digest/0.1 (+github.com/usagijin/notification-digest)")
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        let token = std::env::var(ENV_INFERENCE_TOKEN).ok().filter(|t| !t.is_empty());
        Self {
            http,
            endpoint,
            token,
        }
    }

    fn verify_hash(payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(payload.as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(64);
        for b in digest {
            use std::fmt::Write as _;
            let _ = write!(&mut out, "{b:02x}");
        }
        out
    }
}

#[async_trait::async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn summarize(&self, request: &SummarizeRequest) -> Option<InferenceReply> {
        let payload = serde_json::to_string(request).ok()?;
        let verify = Self::verify_hash(&payload);

        let mut req = self
            .http
            .post(&self.endpoint)
            .header("X-Verify", verify)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload);
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        let resp = match req.send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(error = %e, "inference request failed");
                return None;
            }
        };
        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "inference endpoint returned error");
            return None;
        }
        match resp.json::<InferenceReply>().await {
            Ok(reply) => Some(reply),
            Err(e) => {
                tracing::warn!(error = %e, "inference reply not decodable");
                None
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        "http"
    }
}

/// Returns `None` always; used when no endpoint is configured.
pub struct DisabledClient;

#[async_trait::async_trait]
impl InferenceClient for DisabledClient {
    async fn summarize(&self, _request: &SummarizeRequest) -> Option<InferenceReply> {
        None
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic client for tests/local runs: echoes a fixed reply.
#[derive(Clone)]
pub struct MockInferenceClient {
    pub reply: InferenceReply,
}

impl Default for MockInferenceClient {
    fn default() -> Self {
        Self {
            reply: InferenceReply {
                title: "通知摘要".to_string(),
                body: "你收到了一批新通知".to_string(),
                importance: 3,
            },
        }
    }
}

#[async_trait::async_trait]
impl InferenceClient for MockInferenceClient {
    async fn summarize(&self, _request: &SummarizeRequest) -> Option<InferenceReply> {
        Some(self.reply.clone())
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}
