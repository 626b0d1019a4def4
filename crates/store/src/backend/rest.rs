use async_trait::async_trait;
use tracing::debug;

use crate::{LeadRecord, LeadStore, StoreError};

/// Hosted Postgres reached through a PostgREST-style HTTP API
/// (`POST <url>/rest/v1/<table>`).
pub struct RestLeadStore {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestLeadStore {
    pub fn new(client: reqwest::Client, url: String, api_key: String, table: String) -> Self {
        let endpoint = format!("{}/rest/v1/{}", url.trim_end_matches('/'), table);
        Self {
            client,
            endpoint,
            api_key,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LeadStore for RestLeadStore {
    async fn insert(&self, record: &LeadRecord) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await
            .map_err(|e| StoreError::backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(lead_id = %record.id, "rest_lead_inserted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "rest"
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}
