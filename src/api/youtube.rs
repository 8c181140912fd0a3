use super::{ChannelStatsSource, SearchQuery, VideoSearch, VideoStatsSource};
use crate::batch::MAX_BATCH_SIZE;
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

const VIDEO_PARTS: &str = "snippet,statistics,contentDetails,liveStreamingDetails";
const CHANNEL_PARTS: &str = "snippet,statistics,monetizationDetails";

#[derive(Debug, Deserialize)]
struct ListResponse {
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<u16>,
    message: String,
}

/// YouTube Data API v3 client for search, videos and channels
pub struct YouTubeClient {
    client: Client,
    base_url: Url,
    api_key: SecretString,
}

impl YouTubeClient {
    pub fn new(config: &Config, api_key: SecretString) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(Duration::from_secs(config.http.timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(client, &config.api_base_url, api_key)
    }

    pub fn with_client(client: Client, base_url: &str, api_key: SecretString) -> Result<Self> {
        // Url::join drops the last path segment unless the base ends in '/'
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self, resource: &str) -> Result<Url> {
        self.base_url
            .join(resource)
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))
    }

    async fn list(
        &self,
        stage: &'static str,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<Value>> {
        let url = self.endpoint(resource)?;
        debug!("GET {} ({})", url, stage);

        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("key", self.api_key.expose_secret())])
            .send()
            .await
            .map_err(|e| Error::upstream(stage, e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::upstream(stage, e.without_url().to_string()))?;

        if !status.is_success() {
            let detail = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(parsed) => match parsed.error.code {
                    Some(code) => format!("{} ({})", parsed.error.message, code),
                    None => parsed.error.message,
                },
                Err(_) => format!("HTTP {}", status),
            };
            return Err(Error::upstream(stage, detail));
        }

        let parsed: ListResponse = serde_json::from_str(&body)
            .map_err(|e| Error::upstream(stage, format!("Malformed response: {}", e)))?;
        debug!("{} returned {} items", stage, parsed.items.len());
        Ok(parsed.items)
    }

    fn check_ids(stage: &'static str, ids: &[String]) -> Result<()> {
        if ids.len() > MAX_BATCH_SIZE {
            return Err(Error::upstream(
                stage,
                format!("{} ids exceeds the per-call cap of {}", ids.len(), MAX_BATCH_SIZE),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl VideoSearch for YouTubeClient {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Value>> {
        let params = [
            ("part", "snippet".to_string()),
            ("type", "video".to_string()),
            ("q", query.topic.clone()),
            ("publishedAfter", query.published_after_param()),
            ("maxResults", query.max_results.to_string()),
            ("order", query.order.clone()),
        ];
        self.list("search", "search", &params).await
    }
}

#[async_trait]
impl VideoStatsSource for YouTubeClient {
    async fn fetch_video_stats(&self, ids: &[String]) -> Result<Vec<Value>> {
        Self::check_ids("videos", ids)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = [("part", VIDEO_PARTS.to_string()), ("id", ids.join(","))];
        self.list("videos", "videos", &params).await
    }
}

#[async_trait]
impl ChannelStatsSource for YouTubeClient {
    async fn fetch_channel_stats(&self, ids: &[String]) -> Result<Vec<Value>> {
        Self::check_ids("channels", ids)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let params = [("part", CHANNEL_PARTS.to_string()), ("id", ids.join(","))];
        self.list("channels", "channels", &params).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> YouTubeClient {
        YouTubeClient::with_client(
            Client::new(),
            &server.uri(),
            SecretString::from("test-key".to_string()),
        )
        .expect("client should build")
    }

    #[tokio::test]
    async fn test_search_sends_expected_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "meditation"))
            .and(query_param("type", "video"))
            .and(query_param("publishedAfter", "2024-06-01T12:00:00Z"))
            .and(query_param("maxResults", "50"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "items": [{"id": {"videoId": "v1"}, "snippet": {"title": "t"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let query = SearchQuery::new(
            "meditation",
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
            50,
        );
        let items = client_for(&server).search(&query).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["id"]["videoId"], "v1");
    }

    #[tokio::test]
    async fn test_video_stats_joins_ids() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .and(query_param("id", "a,b,c"))
            .and(query_param("part", VIDEO_PARTS))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(1)
            .mount(&server)
            .await;

        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let items = client_for(&server).fetch_video_stats(&ids).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_too_many_ids_is_rejected_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
            .expect(0)
            .mount(&server)
            .await;

        let ids: Vec<String> = (0..51).map(|i| i.to_string()).collect();
        let result = client_for(&server).fetch_channel_stats(&ids).await;
        assert!(matches!(result, Err(Error::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_api_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": {"code": 403, "message": "The request cannot be completed because you have exceeded your quota."}
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_channel_stats(&["c1".to_string()])
            .await
            .unwrap_err();
        match err {
            Error::Upstream { stage, message } => {
                assert_eq!(stage, "channels");
                assert!(message.contains("exceeded your quota"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/videos"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let result = client_for(&server).fetch_video_stats(&["v1".to_string()]).await;
        assert!(matches!(result, Err(Error::Upstream { .. })));
    }

    #[tokio::test]
    async fn test_empty_ids_skip_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let items = client_for(&server).fetch_video_stats(&[]).await.unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_base_url_keeps_path() {
        let client = YouTubeClient::with_client(
            Client::new(),
            "https://www.googleapis.com/youtube/v3",
            SecretString::from("k".to_string()),
        )
        .unwrap();
        assert_eq!(
            client.endpoint("videos").unwrap().as_str(),
            "https://www.googleapis.com/youtube/v3/videos"
        );
    }
}
