//! One dashboard refresh: search, batched stats, join, metrics, views
//!
//! Collaborators are passed in, nothing is cached between runs.

use crate::api::{ChannelStatsSource, SearchQuery, VideoSearch, VideoStatsSource};
use crate::batch::{fetch_in_batches_concurrent, MAX_BATCH_SIZE};
use crate::config::Config;
use crate::error::Result;
use crate::join::{join, JoinMode};
use crate::metrics::derive;
use crate::models::{EnrichedVideo, VideoSummary};
use crate::normalize::{normalize_channels, normalize_video_stats, normalize_videos};
use crate::rank::{Ranker, SortField};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Knobs for one run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub chunk_size: usize,
    pub concurrency: usize,
    pub join_mode: JoinMode,
    pub views_threshold: u64,
    pub top_n: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            chunk_size: MAX_BATCH_SIZE,
            concurrency: 1,
            join_mode: JoinMode::Outer,
            views_threshold: 1000,
            top_n: 10,
        }
    }
}

impl PipelineOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            chunk_size: config.batch.chunk_size,
            concurrency: config.batch.concurrency,
            join_mode: config.join.mode,
            views_threshold: config.rank.views_threshold,
            top_n: config.rank.top_n,
        }
    }
}

/// Everything one run produces
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub topic: String,
    pub published_after: DateTime<Utc>,
    pub generated_at: DateTime<Utc>,
    pub views_threshold: u64,
    /// All rows in search order
    pub rows: Vec<EnrichedVideo>,
    /// Rows that reached the threshold, youngest first
    pub fastest_to_threshold: Vec<EnrichedVideo>,
    pub top_by_views: Vec<EnrichedVideo>,
    pub top_by_rate: Vec<EnrichedVideo>,
    /// Search hits dropped as malformed
    pub skipped_records: usize,
    /// Videos the stats endpoint returned nothing for
    pub missing_stats: usize,
    /// Rows whose elapsed time was clamped
    pub clock_skewed: usize,
}

impl Report {
    fn empty(query: &SearchQuery, now: DateTime<Utc>, views_threshold: u64) -> Self {
        Self {
            topic: query.topic.clone(),
            published_after: query.published_after,
            generated_at: now,
            views_threshold,
            rows: Vec::new(),
            fastest_to_threshold: Vec::new(),
            top_by_views: Vec::new(),
            top_by_rate: Vec::new(),
            skipped_records: 0,
            missing_stats: 0,
            clock_skewed: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Enriched rows plus join diagnostics
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub rows: Vec<EnrichedVideo>,
    pub missing_stats: usize,
    pub clock_skewed: usize,
}

/// The metric aggregation pipeline
pub struct Pipeline<'a> {
    search: &'a dyn VideoSearch,
    video_stats: &'a dyn VideoStatsSource,
    channel_stats: &'a dyn ChannelStatsSource,
    options: PipelineOptions,
    ranker: Ranker,
}

/// Non-blank ids in first-seen order without repeats
fn unique_ids<'v>(ids: impl Iterator<Item = &'v str>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.filter(|id| !id.trim().is_empty())
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

impl<'a> Pipeline<'a> {
    pub fn new(
        search: &'a dyn VideoSearch,
        video_stats: &'a dyn VideoStatsSource,
        channel_stats: &'a dyn ChannelStatsSource,
        options: PipelineOptions,
    ) -> Self {
        Self {
            search,
            video_stats,
            channel_stats,
            options,
            ranker: Ranker::new(),
        }
    }

    /// Run search and everything after it
    pub async fn run(&self, query: &SearchQuery, now: DateTime<Utc>) -> Result<Report> {
        info!(
            "Searching '{}' published after {}",
            query.topic,
            query.published_after_param()
        );

        let raw = self.search.search(query).await?;
        let videos = normalize_videos(&raw);
        let skipped = raw.len() - videos.len();
        if skipped > 0 {
            warn!("Skipped {} malformed search results", skipped);
        }

        if videos.is_empty() {
            info!("No videos found for '{}'", query.topic);
            let mut report = Report::empty(query, now, self.options.views_threshold);
            report.skipped_records = skipped;
            return Ok(report);
        }

        let enrichment = self.enrich(&videos, now).await?;
        let mut report = self.build_report(query, now, enrichment);
        report.skipped_records = skipped;
        Ok(report)
    }

    /// Fetch stats for already-normalized videos, join and derive metrics
    pub async fn enrich(&self, videos: &[VideoSummary], now: DateTime<Utc>) -> Result<Enrichment> {
        if videos.is_empty() {
            return Ok(Enrichment::default());
        }

        let video_ids = unique_ids(videos.iter().map(|v| v.id.as_str()));
        let channel_ids = unique_ids(videos.iter().map(|v| v.channel_id.as_str()));
        debug!(
            "Fetching stats for {} videos and {} channels",
            video_ids.len(),
            channel_ids.len()
        );

        let video_source = self.video_stats;
        let raw_stats = fetch_in_batches_concurrent(
            &video_ids,
            self.options.chunk_size,
            self.options.concurrency,
            |chunk| async move { video_source.fetch_video_stats(&chunk).await },
        )
        .await?;

        let channel_source = self.channel_stats;
        let raw_channels = fetch_in_batches_concurrent(
            &channel_ids,
            self.options.chunk_size,
            self.options.concurrency,
            |chunk| async move { channel_source.fetch_channel_stats(&chunk).await },
        )
        .await?;

        let stats = normalize_video_stats(&raw_stats);
        let channels = normalize_channels(&raw_channels);

        let joined = join(videos, &stats, &channels, self.options.join_mode);
        if !joined.missing_stats.is_empty() {
            match self.options.join_mode {
                JoinMode::Outer => warn!(
                    "No stats for {} videos; counters set to 0",
                    joined.missing_stats.len()
                ),
                JoinMode::Inner => warn!(
                    "No stats for {} videos; dropped from analysis",
                    joined.missing_stats.len()
                ),
            }
        }
        if !joined.missing_channels.is_empty() {
            debug!("No channel stats for {:?}", joined.missing_channels);
        }

        let rows = derive(joined.rows, now);
        let clock_skewed = rows.iter().filter(|r| r.clock_skew).count();
        if clock_skewed > 0 {
            warn!(
                "{} videos published at or after the analysis time; elapsed time clamped",
                clock_skewed
            );
        }

        info!("Enriched {} videos", rows.len());
        Ok(Enrichment {
            rows,
            missing_stats: joined.missing_stats.len(),
            clock_skewed,
        })
    }

    fn build_report(&self, query: &SearchQuery, now: DateTime<Utc>, enrichment: Enrichment) -> Report {
        let rows = enrichment.rows;
        let top_n = self.options.top_n;

        let fastest_to_threshold = self
            .ranker
            .fastest_to_threshold(rows.clone(), self.options.views_threshold);
        let top_by_views = self.ranker.top_n(rows.clone(), SortField::Views, top_n, true);
        let top_by_rate = self
            .ranker
            .top_n(rows.clone(), SortField::RatePerHour, top_n, true);

        Report {
            rows,
            fastest_to_threshold,
            top_by_views,
            top_by_rate,
            missing_stats: enrichment.missing_stats,
            clock_skewed: enrichment.clock_skewed,
            ..Report::empty(query, now, self.options.views_threshold)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone};
    use serde_json::{json, Value};
    use std::sync::Mutex;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn query() -> SearchQuery {
        SearchQuery::new("meditation", now() - Duration::hours(24), 50)
    }

    fn search_item(id: &str, channel: &str, hours_ago: i64) -> Value {
        let published = (now() - Duration::hours(hours_ago)).to_rfc3339();
        json!({
            "id": {"videoId": id},
            "snippet": {
                "title": format!("video {}", id),
                "channelId": channel,
                "channelTitle": format!("channel {}", channel),
                "publishedAt": published
            }
        })
    }

    fn stats_item(id: &str, views: u64) -> Value {
        json!({"id": id, "statistics": {"viewCount": views.to_string()}})
    }

    /// In-memory stand-in for all three collaborators
    #[derive(Default)]
    struct FakeApi {
        search_items: Vec<Value>,
        stats_items: Vec<Value>,
        channel_items: Vec<Value>,
        fail_stats: bool,
        stats_calls: Mutex<Vec<usize>>,
        channel_calls: Mutex<Vec<usize>>,
        channel_ids: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VideoSearch for FakeApi {
        async fn search(&self, _query: &SearchQuery) -> Result<Vec<Value>> {
            Ok(self.search_items.clone())
        }
    }

    #[async_trait]
    impl VideoStatsSource for FakeApi {
        async fn fetch_video_stats(&self, ids: &[String]) -> Result<Vec<Value>> {
            self.stats_calls.lock().unwrap().push(ids.len());
            if self.fail_stats {
                return Err(Error::upstream("videos", "quota exceeded"));
            }
            Ok(self
                .stats_items
                .iter()
                .filter(|item| ids.iter().any(|id| item["id"] == id.as_str()))
                .cloned()
                .collect())
        }
    }

    #[async_trait]
    impl ChannelStatsSource for FakeApi {
        async fn fetch_channel_stats(&self, ids: &[String]) -> Result<Vec<Value>> {
            self.channel_calls.lock().unwrap().push(ids.len());
            self.channel_ids.lock().unwrap().extend(ids.iter().cloned());
            Ok(self
                .channel_items
                .iter()
                .filter(|item| ids.iter().any(|id| item["id"] == id.as_str()))
                .cloned()
                .collect())
        }
    }

    fn pipeline(api: &FakeApi) -> Pipeline<'_> {
        Pipeline::new(api, api, api, PipelineOptions::default())
    }

    #[tokio::test]
    async fn test_two_video_report() {
        let api = FakeApi {
            search_items: vec![search_item("v1", "c1", 2), search_item("v2", "c1", 1)],
            stats_items: vec![stats_item("v1", 1000), stats_item("v2", 100)],
            ..Default::default()
        };

        let report = pipeline(&api).run(&query(), now()).await.unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].rate_per_hour, 500.0);
        assert_eq!(report.rows[1].rate_per_hour, 100.0);
        assert_eq!(report.rows[0].country, "unknown");
        assert_eq!(report.rows[0].subscriber_count, 0);
        assert_eq!(report.top_by_views[0].id, "v1");
        assert_eq!(report.fastest_to_threshold.len(), 1);
        assert_eq!(report.fastest_to_threshold[0].id, "v1");
        assert_eq!(report.top_by_rate[0].id, "v1");
        assert_eq!(*api.channel_calls.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_missing_stats_keeps_row() {
        let api = FakeApi {
            search_items: vec![search_item("v1", "c1", 2), search_item("v2", "c2", 1)],
            stats_items: vec![stats_item("v1", 1000)],
            ..Default::default()
        };

        let report = pipeline(&api).run(&query(), now()).await.unwrap();
        let v2 = report.rows.iter().find(|r| r.id == "v2").unwrap();
        assert_eq!((v2.views, v2.likes, v2.comments), (0, 0, 0));
        assert_eq!(report.missing_stats, 1);
    }

    #[tokio::test]
    async fn test_inner_join_mode_drops_row() {
        let api = FakeApi {
            search_items: vec![search_item("v1", "c1", 2), search_item("v2", "c2", 1)],
            stats_items: vec![stats_item("v1", 1000)],
            ..Default::default()
        };
        let options = PipelineOptions {
            join_mode: JoinMode::Inner,
            ..Default::default()
        };

        let report = Pipeline::new(&api, &api, &api, options)
            .run(&query(), now())
            .await
            .unwrap();
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.missing_stats, 1);
    }

    #[tokio::test]
    async fn test_empty_search_skips_fetchers() {
        let api = FakeApi::default();
        let report = pipeline(&api).run(&query(), now()).await.unwrap();

        assert!(report.is_empty());
        assert!(report.top_by_views.is_empty());
        assert!(api.stats_calls.lock().unwrap().is_empty());
        assert!(api.channel_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_only_malformed_results_counts_as_empty() {
        let api = FakeApi {
            search_items: vec![json!({"id": {"videoId": "v1"}, "snippet": {}})],
            ..Default::default()
        };
        let report = pipeline(&api).run(&query(), now()).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.skipped_records, 1);
        assert!(api.stats_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_failure_propagates() {
        let api = FakeApi {
            search_items: vec![search_item("v1", "c1", 2)],
            fail_stats: true,
            ..Default::default()
        };

        let result = pipeline(&api).run(&query(), now()).await;
        assert!(matches!(result, Err(Error::Upstream { .. })));
        assert!(api.channel_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_large_result_set_is_batched_and_deduplicated() {
        let mut search_items: Vec<Value> = (0..120)
            .map(|i| search_item(&format!("v{}", i), &format!("c{}", i % 7), 3))
            .collect();
        // the same video twice must not be fetched twice
        search_items.push(search_item("v0", "c0", 3));

        let stats_items = (0..120).map(|i| stats_item(&format!("v{}", i), i)).collect();
        let api = FakeApi {
            search_items,
            stats_items,
            ..Default::default()
        };

        let options = PipelineOptions {
            concurrency: 3,
            ..Default::default()
        };
        let report = Pipeline::new(&api, &api, &api, options)
            .run(&query(), now())
            .await
            .unwrap();

        assert_eq!(report.rows.len(), 121);
        // chunks run concurrently, so only the multiset of sizes is fixed
        let mut stats_calls = api.stats_calls.lock().unwrap().clone();
        stats_calls.sort_unstable();
        assert_eq!(stats_calls, vec![20, 50, 50]);
        assert_eq!(*api.channel_calls.lock().unwrap(), vec![7]);
        assert_eq!(report.top_by_views[0].id, "v119");
        assert_eq!(report.missing_stats, 0);
    }

    #[tokio::test]
    async fn test_enrich_empty() {
        let api = FakeApi::default();
        let out = pipeline(&api).enrich(&[], now()).await.unwrap();
        assert!(out.rows.is_empty());
        assert!(api.stats_calls.lock().unwrap().is_empty());
    }

    fn search_item_without_channel(id: &str, hours_ago: i64) -> Value {
        let mut item = search_item(id, "unused", hours_ago);
        if let Some(snippet) = item["snippet"].as_object_mut() {
            snippet.remove("channelId");
        }
        item
    }

    #[tokio::test]
    async fn test_blank_channel_ids_are_not_fetched() {
        let api = FakeApi {
            search_items: vec![
                search_item_without_channel("v1", 2),
                search_item("v2", "c1", 1),
            ],
            stats_items: vec![stats_item("v1", 10), stats_item("v2", 20)],
            ..Default::default()
        };

        let report = pipeline(&api).run(&query(), now()).await.unwrap();

        assert_eq!(report.rows.len(), 2);
        assert_eq!(*api.channel_ids.lock().unwrap(), vec!["c1"]);
        let v1 = report.rows.iter().find(|r| r.id == "v1").unwrap();
        assert_eq!(v1.channel_id, "");
        assert_eq!(v1.country, "unknown");
        assert_eq!(v1.views, 10);
    }

    #[tokio::test]
    async fn test_no_channel_ids_skips_channel_fetch() {
        let api = FakeApi {
            search_items: vec![search_item_without_channel("v1", 2)],
            stats_items: vec![stats_item("v1", 10)],
            ..Default::default()
        };

        let report = pipeline(&api).run(&query(), now()).await.unwrap();

        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].subscriber_count, 0);
        assert!(api.channel_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_unique_ids_keeps_first_seen_order() {
        let ids = unique_ids(["b", "a", "b", "c", "a"].into_iter());
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_unique_ids_drops_blank() {
        let ids = unique_ids(["", "a", " ", "a", "b"].into_iter());
        assert_eq!(ids, vec!["a", "b"]);
    }
}
