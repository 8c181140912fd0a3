//! Filtering and ordering of enriched videos
//!
//! This module handles:
//! - Threshold filters on any numeric column
//! - Stable sorts where ties keep input order
//! - Top-N views for the report

use crate::error::{Error, Result};
use crate::models::EnrichedVideo;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Numeric column a view can filter or sort on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Views,
    Likes,
    Comments,
    SubscriberCount,
    ElapsedHours,
    RatePerHour,
}

impl SortField {
    /// Column value; NaN stays NaN and is handled by the comparator
    pub fn value(&self, row: &EnrichedVideo) -> f64 {
        match self {
            SortField::Views => row.views as f64,
            SortField::Likes => row.likes as f64,
            SortField::Comments => row.comments as f64,
            SortField::SubscriberCount => row.subscriber_count as f64,
            SortField::ElapsedHours => row.elapsed_hours,
            SortField::RatePerHour => row.rate_per_hour,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Views => "views",
            SortField::Likes => "likes",
            SortField::Comments => "comments",
            SortField::SubscriberCount => "subscriberCount",
            SortField::ElapsedHours => "elapsedHours",
            SortField::RatePerHour => "ratePerHour",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().replace(['_', '-'], "").as_str() {
            "views" => Ok(Self::Views),
            "likes" => Ok(Self::Likes),
            "comments" => Ok(Self::Comments),
            "subscribercount" | "subscribers" => Ok(Self::SubscriberCount),
            "elapsedhours" => Ok(Self::ElapsedHours),
            "rateperhour" | "rate" => Ok(Self::RatePerHour),
            _ => Err(Error::Config(format!("Unknown sort field '{}'", value))),
        }
    }
}

/// Ascending order with NaN below every number
fn compare_values(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.total_cmp(&b),
    }
}

/// Composable filter and sort operations over enriched rows
#[derive(Debug, Clone, Copy, Default)]
pub struct Ranker;

impl Ranker {
    pub fn new() -> Self {
        Self
    }

    /// Keep rows whose `field` is at least `threshold`
    pub fn filter_at_least(
        &self,
        rows: Vec<EnrichedVideo>,
        field: SortField,
        threshold: f64,
    ) -> Vec<EnrichedVideo> {
        rows.into_iter()
            .filter(|r| field.value(r) >= threshold)
            .collect()
    }

    /// Stable sort by `field`. NaN counts as the lowest value.
    pub fn sort_by(
        &self,
        mut rows: Vec<EnrichedVideo>,
        field: SortField,
        descending: bool,
    ) -> Vec<EnrichedVideo> {
        rows.sort_by(|a, b| {
            let ord = compare_values(field.value(a), field.value(b));
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
        rows
    }

    /// Stable sort by `field`, then keep the first `n`
    pub fn top_n(
        &self,
        rows: Vec<EnrichedVideo>,
        field: SortField,
        n: usize,
        descending: bool,
    ) -> Vec<EnrichedVideo> {
        let mut sorted = self.sort_by(rows, field, descending);
        sorted.truncate(n);
        sorted
    }

    /// Rows with at least `threshold` views, youngest first
    pub fn fastest_to_threshold(&self, rows: Vec<EnrichedVideo>, threshold: u64) -> Vec<EnrichedVideo> {
        let reached = self.filter_at_least(rows, SortField::Views, threshold as f64);
        self.sort_by(reached, SortField::ElapsedHours, false)
    }
}
