//! Left join of search hits with video stats and channel stats

use crate::models::{ChannelStats, EnrichedVideo, VideoStats, VideoSummary};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// What to do with a video that has no stats row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    /// Keep it with zeroed counters
    #[default]
    Outer,
    /// Drop it
    Inner,
}

impl fmt::Display for JoinMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinMode::Outer => write!(f, "outer"),
            JoinMode::Inner => write!(f, "inner"),
        }
    }
}

impl FromStr for JoinMode {
    type Err = crate::error::Error;

    fn from_str(value: &str) -> crate::error::Result<Self> {
        match value.to_lowercase().as_str() {
            "outer" | "left" => Ok(Self::Outer),
            "inner" => Ok(Self::Inner),
            _ => Err(crate::error::Error::Config(format!(
                "Unknown join mode '{}'; expected 'outer' or 'inner'",
                value
            ))),
        }
    }
}

/// Output of [`join`]
#[derive(Debug, Clone, Default)]
pub struct JoinOutcome {
    pub rows: Vec<EnrichedVideo>,
    /// Ids of videos that had no stats row
    pub missing_stats: Vec<String>,
    /// Ids of channels referenced by a video but absent from `channels`
    pub missing_channels: Vec<String>,
}

/// Join `videos` with `stats` on video id, then with `channels` on channel id.
///
/// Keys compare by exact string equality. When a key repeats on the right
/// side, the first row wins. With [`JoinMode::Outer`] every video produces
/// exactly one row, in input order.
pub fn join(
    videos: &[VideoSummary],
    stats: &[VideoStats],
    channels: &[ChannelStats],
    mode: JoinMode,
) -> JoinOutcome {
    let mut stats_by_id: HashMap<&str, &VideoStats> = HashMap::with_capacity(stats.len());
    for s in stats {
        stats_by_id.entry(s.video_id.as_str()).or_insert(s);
    }

    let mut channels_by_id: HashMap<&str, &ChannelStats> = HashMap::with_capacity(channels.len());
    for c in channels {
        channels_by_id.entry(c.channel_id.as_str()).or_insert(c);
    }

    let mut outcome = JoinOutcome {
        rows: Vec::with_capacity(videos.len()),
        ..Default::default()
    };

    for video in videos {
        let missing_stats;
        let stats = match stats_by_id.get(video.id.as_str()) {
            Some(s) => *s,
            None => {
                outcome.missing_stats.push(video.id.clone());
                if mode == JoinMode::Inner {
                    continue;
                }
                missing_stats = VideoStats::missing(&video.id);
                &missing_stats
            }
        };

        let missing_channel;
        let channel = match channels_by_id.get(video.channel_id.as_str()) {
            Some(c) => *c,
            None => {
                if !outcome.missing_channels.contains(&video.channel_id) {
                    outcome.missing_channels.push(video.channel_id.clone());
                }
                missing_channel = ChannelStats::missing(&video.channel_id);
                &missing_channel
            }
        };

        outcome.rows.push(EnrichedVideo::new(video, stats, channel));
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UNKNOWN_COUNTRY;
    use chrono::{TimeZone, Utc};

    fn video(id: &str, channel: &str) -> VideoSummary {
        VideoSummary {
            id: id.to_string(),
            title: format!("title {}", id),
            channel_id: channel.to_string(),
            channel_title: format!("channel {}", channel),
            published_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn stats(id: &str, views: u64) -> VideoStats {
        VideoStats {
            views,
            likes: 1,
            comments: 2,
            ..VideoStats::missing(id)
        }
    }

    fn channel(id: &str, subs: u64) -> ChannelStats {
        ChannelStats {
            subscriber_count: subs,
            country: "SE".to_string(),
            monetization_enabled: true,
            ..ChannelStats::missing(id)
        }
    }

    #[test]
    fn test_row_count_equals_video_count() {
        let videos: Vec<_> = (0..7).map(|i| video(&format!("v{}", i), "c")).collect();
        let stat_sets = [vec![], vec![stats("v0", 5)], vec![stats("v3", 1), stats("zz", 9)]];
        let channel_sets = [vec![], vec![channel("c", 10)], vec![channel("other", 1)]];

        for s in &stat_sets {
            for c in &channel_sets {
                let out = join(&videos, s, c, JoinMode::Outer);
                assert_eq!(out.rows.len(), videos.len());
                let ids: Vec<_> = out.rows.iter().map(|r| r.id.as_str()).collect();
                assert_eq!(ids, ["v0", "v1", "v2", "v3", "v4", "v5", "v6"]);
            }
        }
    }

    #[test]
    fn test_missing_stats_are_zero_filled() {
        let videos = vec![video("v1", "c1"), video("v2", "c1")];
        let out = join(&videos, &[stats("v1", 1000)], &[], JoinMode::Outer);

        let v2 = &out.rows[1];
        assert_eq!(v2.id, "v2");
        assert_eq!((v2.views, v2.likes, v2.comments), (0, 0, 0));
        assert_eq!(out.missing_stats, vec!["v2".to_string()]);
        assert_eq!(v2.country, UNKNOWN_COUNTRY);
        assert_eq!(out.missing_channels, vec!["c1".to_string()]);
    }

    #[test]
    fn test_channel_shared_by_many_videos() {
        let videos = vec![video("v1", "c1"), video("v2", "c1"), video("v3", "c2")];
        let out = join(
            &videos,
            &[stats("v1", 1), stats("v2", 2), stats("v3", 3)],
            &[channel("c1", 500)],
            JoinMode::Outer,
        );

        assert_eq!(out.rows[0].subscriber_count, 500);
        assert_eq!(out.rows[1].subscriber_count, 500);
        assert!(out.rows[1].monetization_enabled);
        assert_eq!(out.rows[2].subscriber_count, 0);
        assert_eq!(out.missing_channels, vec!["c2".to_string()]);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let videos = vec![video("AbC", "c")];
        let out = join(&videos, &[stats("abc", 99)], &[], JoinMode::Outer);
        assert_eq!(out.rows[0].views, 0);
    }

    #[test]
    fn test_first_duplicate_wins() {
        let videos = vec![video("v1", "c")];
        let out = join(&videos, &[stats("v1", 10), stats("v1", 20)], &[], JoinMode::Outer);
        assert_eq!(out.rows[0].views, 10);
    }

    #[test]
    fn test_inner_mode_drops_videos_without_stats() {
        let videos = vec![video("v1", "c"), video("v2", "c")];
        let out = join(&videos, &[stats("v2", 3)], &[], JoinMode::Inner);
        assert_eq!(out.rows.len(), 1);
        assert_eq!(out.rows[0].id, "v2");
        assert_eq!(out.missing_stats, vec!["v1".to_string()]);
    }

    #[test]
    fn test_empty_videos() {
        let out = join(&[], &[stats("v1", 1)], &[channel("c", 1)], JoinMode::Outer);
        assert!(out.rows.is_empty());
        assert!(out.missing_stats.is_empty());
    }

    #[test]
    fn test_join_mode_parse() {
        assert_eq!("outer".parse::<JoinMode>().unwrap(), JoinMode::Outer);
        assert_eq!("INNER".parse::<JoinMode>().unwrap(), JoinMode::Inner);
        assert!("cross".parse::<JoinMode>().is_err());
    }
}
