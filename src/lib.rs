//! vidpulse: rank fast-growing videos for a topic
//!
//! A run searches the YouTube Data API for recent uploads, fetches video
//! and channel statistics in batches, joins them, derives views per hour
//! and builds the ranked views the dashboard shows.

pub mod api;
pub mod batch;
pub mod commands;
pub mod config;
pub mod error;
pub mod export;
pub mod join;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod rank;
pub mod suggest;
