//! Chunked multi-id fetches
//!
//! The stats endpoints accept at most [`MAX_BATCH_SIZE`] ids per call, so
//! every multi-id lookup goes through here.

use crate::error::{Error, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use tracing::debug;

/// Per-call id cap of the upstream API
pub const MAX_BATCH_SIZE: usize = 50;

fn check_chunk_size(chunk_size: usize) -> Result<()> {
    if chunk_size == 0 || chunk_size > MAX_BATCH_SIZE {
        return Err(Error::Config(format!(
            "batch chunk size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, chunk_size
        )));
    }
    Ok(())
}

/// Fetch records for `ids` one chunk at a time.
///
/// Results are concatenated in chunk order. An empty `ids` never calls
/// `fetch`. The first failing chunk aborts the whole fetch and earlier
/// results are dropped.
pub async fn fetch_in_batches<T, F, Fut>(
    ids: &[String],
    chunk_size: usize,
    mut fetch: F,
) -> Result<Vec<T>>
where
    F: FnMut(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    check_chunk_size(chunk_size)?;

    let mut all = Vec::with_capacity(ids.len());
    for (index, chunk) in ids.chunks(chunk_size).enumerate() {
        debug!("Fetching chunk {} ({} ids)", index, chunk.len());
        let records = fetch(chunk.to_vec()).await?;
        all.extend(records);
    }

    Ok(all)
}

/// Like [`fetch_in_batches`] but with up to `concurrency` chunks in flight.
///
/// Output order is the chunk order, not completion order, so downstream
/// joins see the same sequence as the sequential version.
pub async fn fetch_in_batches_concurrent<T, F, Fut>(
    ids: &[String],
    chunk_size: usize,
    concurrency: usize,
    fetch: F,
) -> Result<Vec<T>>
where
    F: Fn(Vec<String>) -> Fut,
    Fut: Future<Output = Result<Vec<T>>>,
{
    check_chunk_size(chunk_size)?;
    if concurrency <= 1 {
        return fetch_in_batches(ids, chunk_size, fetch).await;
    }

    let chunks: Vec<Vec<String>> = ids.chunks(chunk_size).map(|c| c.to_vec()).collect();
    debug!(
        "Fetching {} chunks with concurrency {}",
        chunks.len(),
        concurrency
    );

    let per_chunk: Vec<Vec<T>> = stream::iter(chunks.into_iter().map(&fetch))
        .buffered(concurrency)
        .try_collect()
        .await?;

    Ok(per_chunk.into_iter().flatten().collect())
}
