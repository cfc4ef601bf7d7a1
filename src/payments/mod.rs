//! Payment provider integration: charge creation and webhook signatures.

pub mod signature;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::PaymentsConfig;
use crate::errors::{Error, Result};

/// Charge creation payload sent to the provider.
#[derive(Debug, Serialize)]
pub struct ChargeRequest {
    pub name: String,
    pub description: String,
    pub pricing_type: String,
    pub local_price: LocalPrice,
    pub metadata: ChargeMetadata,
    pub redirect_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Serialize)]
pub struct LocalPrice {
    pub amount: String,
    pub currency: String,
}

/// Metadata round-tripped through the provider. The webhook reads these
/// fields back out of the confirmed charge, so the credit amount is fixed
/// server-side at charge creation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ChargeMetadata {
    pub user_id: String,
    pub credits: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
}

/// Thin client over the provider's charge API.
#[derive(Clone)]
pub struct PaymentClient {
    http: reqwest::Client,
    api_url: Url,
    api_key: String,
}

impl PaymentClient {
    /// Build a client from config. Fails when no provider API key is set.
    pub fn from_config(http: reqwest::Client, config: &PaymentsConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| Error::Internal {
            operation: "create payment client: payments.api_key is not configured".to_string(),
        })?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key,
        })
    }

    /// Create a fixed-price charge and return the provider's charge object
    pub async fn create_charge(&self, request: &ChargeRequest) -> Result<serde_json::Value> {
        let url = self.api_url.join("/charges").context("build charge URL")?;

        let response = self
            .http
            .post(url)
            .header("X-CC-Api-Key", &self.api_key)
            .header("X-CC-Version", "2018-03-22")
            .json(request)
            .send()
            .await
            .context("send charge request to payment provider")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), body, "Payment provider rejected charge creation");
            return Err(Error::Upstream {
                service: "payment provider".to_string(),
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await.context("decode charge response")?;

        // The provider wraps the charge in a `data` envelope
        Ok(body.get("data").cloned().unwrap_or(body))
    }
}
