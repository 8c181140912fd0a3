//! Typed rows produced by normalization and consumed by the join.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Country placeholder for channels that do not report one
pub const UNKNOWN_COUNTRY: &str = "unknown";

/// One search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
}

/// Per-video counters from the videos endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    pub video_id: String,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    /// ISO-8601 duration exactly as sent upstream
    pub duration_raw: String,
    pub is_live: bool,
}

impl VideoStats {
    /// Row used when upstream returned nothing for a video
    pub fn missing(video_id: &str) -> Self {
        Self {
            video_id: video_id.to_string(),
            views: 0,
            likes: 0,
            comments: 0,
            duration_raw: String::new(),
            is_live: false,
        }
    }
}

/// Per-channel figures from the channels endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub channel_id: String,
    pub subscriber_count: u64,
    pub country: String,
    pub monetization_enabled: bool,
}

impl ChannelStats {
    pub fn missing(channel_id: &str) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            subscriber_count: 0,
            country: UNKNOWN_COUNTRY.to_string(),
            monetization_enabled: false,
        }
    }
}

/// A search hit joined with its stats and channel, plus derived metrics.
///
/// `elapsed_hours` and `rate_per_hour` stay at zero until the metric
/// deriver has run over the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedVideo {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: DateTime<Utc>,
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub duration_raw: String,
    pub is_live: bool,
    pub subscriber_count: u64,
    pub country: String,
    pub monetization_enabled: bool,
    pub elapsed_hours: f64,
    pub rate_per_hour: f64,
    /// Set when the publish instant was not before the analysis instant
    pub clock_skew: bool,
}

impl EnrichedVideo {
    pub fn new(video: &VideoSummary, stats: &VideoStats, channel: &ChannelStats) -> Self {
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            channel_id: video.channel_id.clone(),
            channel_title: video.channel_title.clone(),
            published_at: video.published_at,
            views: stats.views,
            likes: stats.likes,
            comments: stats.comments,
            duration_raw: stats.duration_raw.clone(),
            is_live: stats.is_live,
            subscriber_count: channel.subscriber_count,
            country: channel.country.clone(),
            monetization_enabled: channel.monetization_enabled,
            elapsed_hours: 0.0,
            rate_per_hour: 0.0,
            clock_skew: false,
        }
    }
}
