//! Search-box autocomplete
//!
//! Unlike the stats pipeline this degrades instead of failing: any
//! problem talking to the suggestion endpoint yields an empty list.

use crate::config::SuggestConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

#[async_trait]
pub trait Suggester: Send + Sync {
    /// Completions for `prefix`; never fails
    async fn suggest(&self, prefix: &str) -> Vec<String>;
}

pub struct SuggestClient {
    client: Client,
    url: Url,
    client_name: String,
    dataset: String,
}

impl SuggestClient {
    pub fn new(config: &SuggestConfig) -> Result<Self> {
        let url = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("Invalid suggest URL: {}", e)))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            url,
            client_name: config.client.clone(),
            dataset: config.dataset.clone(),
        })
    }

    async fn fetch(&self, prefix: &str) -> Result<Vec<String>> {
        let response = self
            .client
            .get(self.url.clone())
            .query(&[
                ("client", self.client_name.as_str()),
                ("ds", self.dataset.as_str()),
                ("q", prefix),
            ])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = response.json().await?;
        Ok(parse_suggestions(&body))
    }
}

/// Pull the suggestion strings out of `[query, [s1, s2, ...], ...]`
fn parse_suggestions(body: &Value) -> Vec<String> {
    body.get(1)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Suggester for SuggestClient {
    async fn suggest(&self, prefix: &str) -> Vec<String> {
        if prefix.trim().is_empty() {
            return Vec::new();
        }

        match self.fetch(prefix).await {
            Ok(suggestions) => {
                debug!("{} suggestions for '{}'", suggestions.len(), prefix);
                suggestions
            }
            Err(e) => {
                warn!("Suggestion lookup failed: {}", e);
                Vec::new()
            }
        }
    }
}
