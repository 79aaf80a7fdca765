use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::source::models::{Reading, Site};
use crate::source::DataSource;

/// HTTP client for the remote table store (PostgREST-style REST interface
/// over the `sites` and `readings` tables).
pub struct TableClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl TableClient {
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http_client,
            base_url: config.source_base_url.trim_end_matches('/').to_string(),
            api_key: config.source_api_key.clone(),
        }
    }

    /// Issue a GET against a table path and decode the JSON row array.
    async fn get_rows<T: DeserializeOwned>(&self, path_and_query: &str) -> AppResult<Vec<T>> {
        let url = format!("{}/{}", self.base_url, path_and_query);

        let response = self
            .http_client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| AppError::SourceApi(format!("Request failed: {e}")))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AppError::SourceApi("Rate limited (429)".to_string()));
        }

        if !response.status().is_success() {
            return Err(AppError::SourceApi(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| AppError::SourceApi(format!("Failed to get response text: {e}")))?;

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body_preview = %text.chars().take(500).collect::<String>(),
                "Failed to parse table store response"
            );
            AppError::SourceApi(format!("Failed to parse response: {e}"))
        })
    }
}

#[async_trait]
impl DataSource for TableClient {
    async fn list_sites(&self) -> AppResult<Vec<Site>> {
        self.get_rows("sites?select=id,name&order=id.asc").await
    }

    async fn latest_reading(&self, site_id: i64) -> AppResult<Option<Reading>> {
        let rows: Vec<Reading> = self
            .get_rows(&format!(
                "readings?select=*&site_id=eq.{site_id}&order=recorded_at.desc&limit=1"
            ))
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn history(&self, site_id: i64, limit: usize) -> AppResult<Vec<Reading>> {
        self.get_rows(&format!(
            "readings?select=*&site_id=eq.{site_id}&order=recorded_at.asc&limit={limit}"
        ))
        .await
    }
}
