//! Support-ticket forwarding client

use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::SupportSettings;

const USER_AGENT: &str = concat!("mentiscope-api/", env!("CARGO_PKG_VERSION"));
const FORWARD_TIMEOUT: Duration = Duration::from_secs(15);

/// Support forwarding errors
#[derive(Debug, Error)]
pub enum SupportError {
    #[error("Support endpoint not configured")]
    NotConfigured,

    #[error("Support endpoint rate limited the submission")]
    RateLimited,

    #[error("Support endpoint rejected the submission ({0}): {1}")]
    Rejected(u16, String),

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Forwards tickets to the configured intake endpoint with the form secret
#[derive(Clone)]
pub struct SupportClient {
    http_client: reqwest::Client,
    url: Option<String>,
    form_secret: String,
}

impl SupportClient {
    pub fn new(settings: &SupportSettings) -> Result<Self, SupportError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(FORWARD_TIMEOUT)
            .build()
            .map_err(|e| SupportError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            url: settings.url.clone(),
            form_secret: settings.form_secret.clone(),
        })
    }

    /// POST the ticket and return the endpoint's JSON reply
    ///
    /// A success reply that is not JSON is reported as `{"status": "success"}`.
    pub async fn forward(&self, ticket: &Value) -> Result<Value, SupportError> {
        let url = self.url.as_deref().ok_or(SupportError::NotConfigured)?;

        let response = self
            .http_client
            .post(url)
            .header("x-form-secret", &self.form_secret)
            .json(ticket)
            .send()
            .await
            .map_err(|e| SupportError::NetworkError(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(SupportError::RateLimited);
        }

        let body = response
            .text()
            .await
            .map_err(|e| SupportError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(SupportError::Rejected(status.as_u16(), body));
        }

        Ok(serde_json::from_str(&body).unwrap_or_else(|_| json!({"status": "success"})))
    }
}
