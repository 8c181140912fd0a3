//! CSV export of enriched rows

use crate::error::Result;
use crate::models::EnrichedVideo;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Header row, in output order
pub const CSV_COLUMNS: [&str; 12] = [
    "id",
    "title",
    "channelTitle",
    "views",
    "likes",
    "comments",
    "elapsedHours",
    "ratePerHour",
    "isLive",
    "subscriberCount",
    "country",
    "monetizationEnabled",
];

fn record(row: &EnrichedVideo) -> [String; 12] {
    [
        row.id.clone(),
        row.title.clone(),
        row.channel_title.clone(),
        row.views.to_string(),
        row.likes.to_string(),
        row.comments.to_string(),
        row.elapsed_hours.to_string(),
        row.rate_per_hour.to_string(),
        row.is_live.to_string(),
        row.subscriber_count.to_string(),
        row.country.clone(),
        row.monetization_enabled.to_string(),
    ]
}

/// Write a header and one line per row
pub fn write_csv<W: Write>(writer: W, rows: &[EnrichedVideo]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_COLUMNS)?;
    for row in rows {
        csv_writer.write_record(record(row))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write rows to a file, replacing it
pub fn export_csv(path: &Path, rows: &[EnrichedVideo]) -> Result<()> {
    let file = File::create(path)?;
    write_csv(file, rows)?;
    info!("Exported {} rows to {}", rows.len(), path.display());
    Ok(())
}
