//! The `report` command: one refresh of the dashboard data

use crate::api::{SearchQuery, YouTubeClient};
use crate::config::{Config, MAX_LOOKBACK_HOURS};
use crate::error::{Error, Result};
use crate::export::export_csv;
use crate::join::JoinMode;
use crate::models::EnrichedVideo;
use crate::pipeline::{Pipeline, PipelineOptions, Report};
use crate::progress::add_spinner;
use chrono::{DateTime, Duration, Utc};
use std::path::PathBuf;

/// Per-invocation overrides; `None` falls back to the config file
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub topic: Option<String>,
    pub hours: Option<u32>,
    pub max_results: Option<u32>,
    pub threshold: Option<u64>,
    pub top: Option<usize>,
    pub csv: Option<PathBuf>,
    pub inner_join: bool,
}

impl ReportOptions {
    fn query(&self, config: &Config, now: DateTime<Utc>) -> Result<SearchQuery> {
        let hours = self.hours.unwrap_or(config.search.lookback_hours);
        if hours == 0 {
            return Err(Error::Config("--hours must be positive".to_string()));
        }

        let published_after = Duration::try_hours(i64::from(hours))
            .filter(|_| hours <= MAX_LOOKBACK_HOURS)
            .and_then(|window| now.checked_sub_signed(window))
            .ok_or_else(|| {
                Error::Config(format!(
                    "--hours is too large (at most {})",
                    MAX_LOOKBACK_HOURS
                ))
            })?;

        let max_results = self.max_results.unwrap_or(config.search.max_results);
        if max_results == 0 || max_results > 50 {
            return Err(Error::Config(
                "--max-results must be between 1 and 50".to_string(),
            ));
        }

        let topic = self
            .topic
            .clone()
            .unwrap_or_else(|| config.search.topic.clone());
        if topic.trim().is_empty() {
            return Err(Error::Config("topic must not be empty".to_string()));
        }

        let mut query = SearchQuery::new(topic, published_after, max_results);
        query.order = config.search.order.clone();
        Ok(query)
    }

    fn pipeline_options(&self, config: &Config) -> PipelineOptions {
        let mut options = PipelineOptions::from_config(config);
        if let Some(threshold) = self.threshold {
            options.views_threshold = threshold;
        }
        if let Some(top) = self.top {
            options.top_n = top;
        }
        if self.inner_join {
            options.join_mode = JoinMode::Inner;
        }
        options
    }
}

/// Search, enrich and rank videos for the configured topic
pub async fn cmd_report(config: &Config, options: ReportOptions) -> Result<Report> {
    let client = YouTubeClient::new(config, config.api_key()?)?;
    report_with(config, &options, &client, Utc::now()).await
}

async fn report_with(
    config: &Config,
    options: &ReportOptions,
    client: &YouTubeClient,
    now: DateTime<Utc>,
) -> Result<Report> {
    let query = options.query(config, now)?;
    let pipeline = Pipeline::new(client, client, client, options.pipeline_options(config));

    let spinner = add_spinner(format!("Fetching videos for '{}'", query.topic));
    let result = pipeline.run(&query, now).await;
    spinner.finish_and_clear();
    let report = result?;

    if let Some(path) = &options.csv {
        export_csv(path, &report.rows)?;
    }

    Ok(report)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn print_table(title: &str, rows: &[EnrichedVideo]) {
    println!("\n{}\n", title);
    if rows.is_empty() {
        println!("  (none)");
        return;
    }

    println!(
        "  {:<3} {:<48} {:<24} {:>10} {:>8} {:>10}",
        "#", "Title", "Channel", "Views", "Hours", "Views/h"
    );
    for (i, row) in rows.iter().enumerate() {
        let skew = if row.clock_skew { "*" } else { "" };
        println!(
            "  {:<3} {:<48} {:<24} {:>10} {:>8.1} {:>10.1}{}",
            i + 1,
            truncate(&row.title, 48),
            truncate(&row.channel_title, 24),
            row.views,
            row.elapsed_hours,
            row.rate_per_hour,
            skew
        );
    }
}

/// Print the three report views to console
pub fn print_report(report: &Report) {
    println!(
        "\n📈 '{}' since {} ({} videos)",
        report.topic,
        report.published_after.format("%Y-%m-%d %H:%M UTC"),
        report.rows.len()
    );

    if report.is_empty() {
        println!("\nNo videos found. Try a longer --hours window or another topic.");
        return;
    }

    print_table(
        &format!("Fastest to {} views", report.views_threshold),
        &report.fastest_to_threshold,
    );
    print_table("Top by views", &report.top_by_views);
    print_table("Top by views per hour", &report.top_by_rate);

    if report.missing_stats > 0 || report.skipped_records > 0 || report.clock_skewed > 0 {
        println!();
    }
    if report.missing_stats > 0 {
        println!("⚠ {} videos had no statistics (shown as 0)", report.missing_stats);
    }
    if report.skipped_records > 0 {
        println!("⚠ {} malformed search results skipped", report.skipped_records);
    }
    if report.clock_skewed > 0 {
        println!(
            "* {} videos published at or after the analysis time",
            report.clock_skewed
        );
    }
}
