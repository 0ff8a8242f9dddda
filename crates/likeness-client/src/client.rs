//! Similarity matcher HTTP client.

use std::io::Cursor;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::RgbImage;
use likeness_core::RankedMatches;
use likeness_hw::Frame;
use reqwest::Client;
use tracing::{debug, error, info};

use crate::error::MatchError;
use crate::types::{MatchOutcome, MatchRequest, MatchResponse};

/// Marker the matcher puts in a 404 body when the uploaded frame holds
/// no detectable face.
const NO_FACE_MARKER: &str = "No face detected";

/// Configuration for the matcher client.
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Base URL of the matcher service.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl MatcherConfig {
    /// Create config from `LIKENESS_MATCHER_*` environment variables.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("LIKENESS_MATCHER_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            timeout: Duration::from_secs(
                std::env::var("LIKENESS_MATCHER_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }
}

/// Client for the similarity matcher service.
pub struct MatcherClient {
    http: Client,
    config: MatcherConfig,
}

impl MatcherClient {
    pub fn new(config: MatcherConfig) -> Result<Self, MatchError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(MatchError::Network)?;

        Ok(Self { http, config })
    }

    pub fn from_env() -> Result<Self, MatchError> {
        Self::new(MatcherConfig::from_env())
    }

    /// Submit a stabilized frame for similarity matching.
    ///
    /// One synchronous call, no automatic retry: a failed request is
    /// reported to the caller, and the next new-face event is the retry.
    pub async fn submit(&self, frame: &Frame, num_vids: u32) -> Result<MatchOutcome, MatchError> {
        if frame.is_empty() {
            error!("submit: empty frame rejected");
            return Err(MatchError::EmptyFrame);
        }

        let request = MatchRequest {
            image: frame_to_data_url(frame)?,
            num_vids,
        };

        let url = format!("{}/get-matches", self.config.base_url);
        debug!(url = %url, num_vids, "sending similarity request");

        let response = self.http.post(&url).json(&request).send().await?;
        let status = response.status();

        if status.is_success() {
            let body: MatchResponse = response.json().await?;
            let (Some(most_similar), Some(least_similar)) = (body.most_similar, body.least_similar)
            else {
                error!("matcher response is missing a ranked list");
                return Err(MatchError::InvalidResponse(
                    "missing mostSimilar or leastSimilar".to_string(),
                ));
            };
            info!(
                most = most_similar.len(),
                least = least_similar.len(),
                "received ranked matches"
            );
            return Ok(MatchOutcome::Matches(RankedMatches {
                most_similar,
                least_similar,
            }));
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::NOT_FOUND && body.contains(NO_FACE_MARKER) {
            info!("matcher found no face in the uploaded frame");
            return Ok(MatchOutcome::NoFace);
        }

        error!(status = status.as_u16(), body = %body, "similarity request failed");
        Err(MatchError::RequestFailed {
            status: status.as_u16(),
            body,
        })
    }
}

/// Encode a BGR frame as a JPEG data URL.
fn frame_to_data_url(frame: &Frame) -> Result<String, MatchError> {
    let rgb = RgbImage::from_raw(frame.width, frame.height, frame.to_rgb()).ok_or_else(|| {
        MatchError::InvalidFrame("buffer does not match frame dimensions".to_string())
    })?;

    let mut jpeg = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)?;

    Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(&jpeg)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_frame() -> Frame {
        Frame {
            data: vec![64u8; 8 * 8 * 3],
            width: 8,
            height: 8,
            timestamp: std::time::Instant::now(),
            sequence: 1,
        }
    }

    fn empty_frame() -> Frame {
        Frame {
            data: Vec::new(),
            width: 0,
            height: 0,
            timestamp: std::time::Instant::now(),
            sequence: 0,
        }
    }

    async fn client_for(server: &MockServer) -> MatcherClient {
        MatcherClient::new(MatcherConfig {
            base_url: server.uri(),
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_returns_ranked_lists() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-matches"))
            .and(body_partial_json(serde_json::json!({ "numVids": 231 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "mostSimilar": [
                    { "path": "/srv/matches/a.png", "numImages": 3 },
                    { "path": "/srv/matches/b.png", "numImages": 1 }
                ],
                "leastSimilar": [
                    { "path": "/srv/matches/z.png", "numImages": 2 }
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = client.submit(&test_frame(), 231).await.unwrap();

        let MatchOutcome::Matches(ranked) = outcome else {
            panic!("expected matches");
        };
        assert_eq!(ranked.most_similar.len(), 2);
        assert_eq!(ranked.most_similar[0].path, "/srv/matches/a.png");
        assert_eq!(ranked.most_similar[0].num_images, 3);
        assert_eq!(ranked.least_similar.len(), 1);
        assert_eq!(ranked.least_similar[0].path, "/srv/matches/z.png");
    }

    #[tokio::test]
    async fn test_submit_sends_jpeg_data_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-matches"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "mostSimilar": [],
                "leastSimilar": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        client.submit(&test_frame(), 10).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let image = body["image"].as_str().unwrap();
        assert!(image.starts_with("data:image/jpeg;base64,"));
        assert_eq!(body["numVids"], 10);
    }

    #[tokio::test]
    async fn test_no_face_is_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-matches"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string("No face detected in provided image"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let outcome = client.submit(&test_frame(), 231).await.unwrap();
        assert!(matches!(outcome, MatchOutcome::NoFace));
    }

    #[tokio::test]
    async fn test_plain_404_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-matches"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.submit(&test_frame(), 231).await.unwrap_err();
        assert!(matches!(err, MatchError::RequestFailed { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_server_error_carries_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-matches"))
            .respond_with(ResponseTemplate::new(500).set_body_string("matcher exploded"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.submit(&test_frame(), 231).await.unwrap_err();
        match err {
            MatchError::RequestFailed { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "matcher exploded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_null_list_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/get-matches"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "mostSimilar": [{ "path": "a", "numImages": 1 }],
                "leastSimilar": null
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.submit(&test_frame(), 231).await.unwrap_err();
        assert!(matches!(err, MatchError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_frame_rejected_without_request() {
        let server = MockServer::start().await;
        // No mock mounted: any request would 404 and fail differently.
        let client = client_for(&server).await;
        let err = client.submit(&empty_frame(), 231).await.unwrap_err();
        assert!(matches!(err, MatchError::EmptyFrame));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn test_config_defaults() {
        let config = MatcherConfig::default();
        assert_eq!(config.base_url, "http://localhost:3000");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_frame_to_data_url_prefix() {
        let url = frame_to_data_url(&test_frame()).unwrap();
        assert!(url.starts_with("data:image/jpeg;base64,"));
        assert!(url.len() > "data:image/jpeg;base64,".len());
    }
}
