//! Raw API records to typed rows
//!
//! All default substitution happens here, so the join and the metric
//! deriver only ever see total records:
//! - counts missing or unparseable upstream become 0
//! - a missing country becomes [`UNKNOWN_COUNTRY`]
//! - the live flag is the presence of `liveStreamingDetails`
//!
//! Records that lack an id or a publish time are skipped with a warning.

mod schema;

pub use schema::*;

use crate::error::Result;
use crate::models::{ChannelStats, VideoStats, VideoSummary, UNKNOWN_COUNTRY};
use serde_json::Value;
use tracing::warn;

pub fn video_summary_schema() -> Schema {
    Schema::new(
        "video",
        vec![
            FieldSpec::key("id", &["id.videoId", "id"]),
            FieldSpec::text("title", &["snippet.title"]),
            FieldSpec::text("channelId", &["snippet.channelId"]),
            FieldSpec::text("channelTitle", &["snippet.channelTitle"]),
            FieldSpec::timestamp("publishedAt", &["snippet.publishedAt"]),
        ],
    )
}

pub fn video_stats_schema() -> Schema {
    Schema::new(
        "video stats",
        vec![
            FieldSpec::key("videoId", &["id"]),
            FieldSpec::count("views", &["statistics.viewCount"]),
            FieldSpec::count("likes", &["statistics.likeCount"]),
            FieldSpec::count("comments", &["statistics.commentCount"]),
            FieldSpec::text("durationRaw", &["contentDetails.duration"]),
            FieldSpec::presence("isLive", &["liveStreamingDetails"]),
        ],
    )
}

pub fn channel_stats_schema() -> Schema {
    Schema::new(
        "channel",
        vec![
            FieldSpec::key("channelId", &["id"]),
            FieldSpec::count("subscriberCount", &["statistics.subscriberCount"]),
            FieldSpec::text("country", &["snippet.country"])
                .or(FieldValue::Text(UNKNOWN_COUNTRY.to_string())),
            FieldSpec::flag("monetizationEnabled", &["monetizationDetails.access.allowed"]),
        ],
    )
}

pub fn normalize_video(raw: &Value) -> Result<VideoSummary> {
    let record = video_summary_schema().normalize(raw)?;
    Ok(VideoSummary {
        id: record.text("id")?,
        title: record.text("title")?,
        channel_id: record.text("channelId")?,
        channel_title: record.text("channelTitle")?,
        published_at: record.timestamp("publishedAt")?,
    })
}

pub fn normalize_video_stat(raw: &Value) -> Result<VideoStats> {
    let record = video_stats_schema().normalize(raw)?;
    Ok(VideoStats {
        video_id: record.text("videoId")?,
        views: record.count("views")?,
        likes: record.count("likes")?,
        comments: record.count("comments")?,
        duration_raw: record.text("durationRaw")?,
        is_live: record.boolean("isLive")?,
    })
}

pub fn normalize_channel(raw: &Value) -> Result<ChannelStats> {
    let record = channel_stats_schema().normalize(raw)?;
    Ok(ChannelStats {
        channel_id: record.text("channelId")?,
        subscriber_count: record.count("subscriberCount")?,
        country: record.text("country")?,
        monetization_enabled: record.boolean("monetizationEnabled")?,
    })
}

fn normalize_all<T>(raws: &[Value], normalize: fn(&Value) -> Result<T>) -> Vec<T> {
    raws.iter()
        .enumerate()
        .filter_map(|(index, raw)| match normalize(raw) {
            Ok(row) => Some(row),
            Err(e) => {
                warn!("Skipping record {}: {}", index, e);
                None
            }
        })
        .collect()
}

/// Normalize search hits, skipping malformed ones
pub fn normalize_videos(raws: &[Value]) -> Vec<VideoSummary> {
    normalize_all(raws, normalize_video)
}

/// Normalize video stats records, skipping malformed ones
pub fn normalize_video_stats(raws: &[Value]) -> Vec<VideoStats> {
    normalize_all(raws, normalize_video_stat)
}

/// Normalize channel records, skipping malformed ones
pub fn normalize_channels(raws: &[Value]) -> Vec<ChannelStats> {
    normalize_all(raws, normalize_channel)
}
