use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{json, Value};

use crate::domain::PayoutDestination;
use crate::error::{AppError, AppResult};

/// A transfer instruction sent to the external payout rail.
#[derive(Debug, Clone, Serialize)]
pub struct TransferRequest {
    pub amount: f64,
    pub currency: String,
    /// Deterministic per booking; the provider dedupes on it, so a retried
    /// release converges to one real transfer.
    pub reference: String,
    pub destination: PayoutDestination,
    pub metadata: Value,
}

#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub reference: Option<String>,
    pub status: String,
}

/// Outbound seam to the payout provider. Transient failures surface as
/// `AppError::PayoutProvider` and are retried by the watcher.
#[async_trait]
pub trait PayoutProvider: Send + Sync {
    async fn transfer(&self, request: &TransferRequest) -> AppResult<TransferReceipt>;
}

/// HTTP client for the provider's transfer API. The shared `reqwest` client
/// carries the bounded request timeout; a timeout is treated like any other
/// provider failure.
pub struct HttpPayoutProvider {
    http_client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpPayoutProvider {
    pub fn new(http_client: Client, base_url: String, api_key: Option<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl PayoutProvider for HttpPayoutProvider {
    async fn transfer(&self, request: &TransferRequest) -> AppResult<TransferReceipt> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                AppError::Dependency("PAYOUT_PROVIDER_API_KEY not configured".to_string())
            })?;

        let response = self
            .http_client
            .post(format!("{}/v1/transfers", self.base_url))
            .bearer_auth(api_key)
            .json(&json!({
                "amount": request.amount,
                "currency": request.currency,
                "reference": request.reference,
                "destination": request.destination,
                "metadata": request.metadata,
            }))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, reference = %request.reference, "Payout provider request failed");
                AppError::PayoutProvider("Payout provider request failed.".to_string())
            })?;

        let status = response.status();
        let resp_body: Value = response
            .json()
            .await
            .unwrap_or(json!({"error": "failed to parse response"}));

        if status.is_success() {
            Ok(TransferReceipt {
                reference: resp_body
                    .get("reference")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .map(ToOwned::to_owned),
                status: resp_body
                    .get("status")
                    .and_then(Value::as_str)
                    .unwrap_or("accepted")
                    .to_string(),
            })
        } else {
            let error_msg = resp_body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown payout provider error");
            Err(AppError::PayoutProvider(format!(
                "Payout provider error ({status}): {error_msg}"
            )))
        }
    }
}
