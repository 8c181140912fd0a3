//! Upstream collaborators
//!
//! The pipeline only talks to these traits, so tests can swap in
//! in-memory fakes. Each call returns raw JSON records; turning them into
//! typed rows is the normalizer's job.

mod youtube;

pub use youtube::*;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// Parameters of one search call
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub topic: String,
    pub published_after: DateTime<Utc>,
    pub max_results: u32,
    pub order: String,
}

impl SearchQuery {
    pub fn new(topic: impl Into<String>, published_after: DateTime<Utc>, max_results: u32) -> Self {
        Self {
            topic: topic.into(),
            published_after,
            max_results,
            order: "date".to_string(),
        }
    }

    /// `publishedAfter` as the API expects it, e.g. `2024-06-01T12:00:00Z`
    pub fn published_after_param(&self) -> String {
        self.published_after.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// Topic search
#[async_trait]
pub trait VideoSearch: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Value>>;
}

/// Per-video statistics lookup; callers pass at most 50 ids
#[async_trait]
pub trait VideoStatsSource: Send + Sync {
    async fn fetch_video_stats(&self, ids: &[String]) -> Result<Vec<Value>>;
}

/// Per-channel statistics lookup; callers pass at most 50 ids
#[async_trait]
pub trait ChannelStatsSource: Send + Sync {
    async fn fetch_channel_stats(&self, ids: &[String]) -> Result<Vec<Value>>;
}
