//! Default values for configuration

use crate::join::JoinMode;

/// Default YouTube Data API base URL
pub fn default_api_base_url() -> String {
    std::env::var("VIDPULSE_API_BASE_URL")
        .unwrap_or_else(|_| "https://www.googleapis.com/youtube/v3".to_string())
}

/// Default environment variable name for the API key
pub fn default_api_key_env() -> String {
    "YOUTUBE_API_KEY".to_string()
}

/// Default search topic
pub fn default_search_topic() -> String {
    "meditation".to_string()
}

/// Default look-back window in hours
pub fn default_search_lookback_hours() -> u32 {
    24
}

/// Default number of search results (API maximum)
pub fn default_search_max_results() -> u32 {
    50
}

/// Default search ordering
pub fn default_search_order() -> String {
    "date".to_string()
}

/// Default ids per stats call
pub fn default_batch_chunk_size() -> usize {
    crate::batch::MAX_BATCH_SIZE
}

/// Default number of chunks in flight
pub fn default_batch_concurrency() -> usize {
    1
}

/// Default view count for the "fastest to threshold" view
pub fn default_rank_views_threshold() -> u64 {
    1000
}

/// Default size of the top-N views
pub fn default_rank_top_n() -> usize {
    10
}

/// Default join mode
pub fn default_join_mode() -> JoinMode {
    JoinMode::Outer
}

/// Default request timeout in seconds
pub fn default_http_timeout() -> u64 {
    30
}

/// Default user agent
pub fn default_http_user_agent() -> String {
    format!("vidpulse/{}", env!("CARGO_PKG_VERSION"))
}

/// Default suggestion endpoint
pub fn default_suggest_url() -> String {
    "http://suggestqueries.google.com/complete/search".to_string()
}

/// Default suggestion client (returns JSON)
pub fn default_suggest_client() -> String {
    "firefox".to_string()
}

/// Default suggestion dataset (YouTube)
pub fn default_suggest_dataset() -> String {
    "yt".to_string()
}

/// Default suggestion timeout in seconds
pub fn default_suggest_timeout() -> u64 {
    5
}
