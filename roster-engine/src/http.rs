use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared_types::{
    AggregateStats, BulkCreateRequest, BulkCreateResponse, CustomerRecord, ErrorResponse,
    ListRosterResponse,
};
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::{EngineError, Result};
use crate::filter::RosterQuery;
use crate::service::RosterService;

/// Roster service reached over its REST API.
pub struct HttpRosterService {
    client: Client,
    base_url: String,
}

impl HttpRosterService {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl RosterService for HttpRosterService {
    async fn list_roster(&self, query: &RosterQuery) -> Result<ListRosterResponse> {
        let response = self
            .client
            .get(self.url("customers"))
            .query(&query.to_query_pairs())
            .send()
            .await?;

        decode(response).await
    }

    async fn aggregate_stats(&self) -> Result<AggregateStats> {
        let response = self.client.get(self.url("customers/stats")).send().await?;

        decode(response).await
    }

    async fn bulk_create(&self, records: &[CustomerRecord]) -> Result<BulkCreateResponse> {
        let body = BulkCreateRequest {
            customers: records.to_vec(),
        };
        let response = self
            .client
            .post(self.url("customers/bulk"))
            .json(&body)
            .send()
            .await?;

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let url = response.url().clone();
    let body = response.text().await?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        return Err(EngineError::Transport(format!(
            "{} returned {}: {}",
            url, status, message
        )));
    }

    serde_json::from_str(&body)
        .map_err(|e| EngineError::Decode(format!("{} returned a malformed body: {}", url, e)))
}
