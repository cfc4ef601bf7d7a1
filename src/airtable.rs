//! Read-only Airtable client backing the content proxy.

use anyhow::Context;
use url::Url;

use crate::config::ContentConfig;
use crate::errors::{Error, Result};

#[derive(Clone)]
pub struct AirtableClient {
    http: reqwest::Client,
    api_url: Url,
    token: String,
    base_id: String,
}

impl AirtableClient {
    /// Build a client from config. Fails when no Airtable token is set.
    pub fn from_config(http: reqwest::Client, config: &ContentConfig) -> Result<Self> {
        let token = config.token.clone().ok_or_else(|| Error::Internal {
            operation: "create Airtable client: content.token is not configured".to_string(),
        })?;

        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            token,
            base_id: config.base_id.clone(),
        })
    }

    /// List records from a table, optionally filtered by a formula expression
    pub async fn list_records(&self, table: &str, filter_formula: Option<&str>) -> Result<serde_json::Value> {
        let url = self
            .api_url
            .join(&format!("/v0/{}/{}", self.base_id, table))
            .context("build Airtable URL")?;

        let mut request = self.http.get(url).bearer_auth(&self.token);
        if let Some(formula) = filter_formula {
            request = request.query(&[("filterByFormula", formula)]);
        }

        let response = request.send().await.context("send Airtable request")?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), table, "Airtable request failed");
            return Err(Error::Upstream {
                service: "Airtable".to_string(),
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = response.json().await.context("decode Airtable response")?;
        Ok(body)
    }
}
