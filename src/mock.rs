//! An in-process stand-in for the discord.bots.gg API.
//!
//! [`MockTransport`] answers the three endpoints the client uses with canned
//! payloads, so code built on [`Client`](crate::Client) can be exercised
//! without network access.

use crate::error::TransportError;
use crate::http::{ApiRequest, ApiResponse, Body, Transport};
use crate::types::{StatsResponse, StatsUpdate};
use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const BOT_RESPONSE: &str = r#"{
  "userId": "botID",
  "clientId": "clientID",
  "username": "Test Bot 1",
  "discriminator": null,
  "avatarURL": null,
  "coOwners": [],
  "prefix": "testBot",
  "helpCommand": "testBot",
  "libraryName": "discordgo",
  "website": null,
  "supportInvite": null,
  "botInvite": null,
  "shortDescription": null,
  "longDescription": null,
  "openSource": null,
  "shardCount": 1,
  "guildCount": 0,
  "verified": true,
  "online": true,
  "inGuild": true,
  "deleted": false,
  "owner": {"username": "testOwner", "discriminator": null, "userId": "112358"},
  "addedDate": "2016-10-30T04:59:04.000Z",
  "status": "online"
}"#;

pub const BOTS_RESPONSE: &str = r#"{
  "count": 2,
  "limit": 50,
  "page": 0,
  "bots": [
    {
      "userId": "botID",
      "clientId": "clientID",
      "username": "Test Bot 1",
      "coOwners": [],
      "libraryName": "discordgo",
      "shardCount": 1,
      "guildCount": 0,
      "verified": true,
      "online": true,
      "inGuild": true,
      "owner": {"username": "testOwner", "discriminator": null, "userId": "112358"},
      "addedDate": "2016-10-30T04:59:04.000Z",
      "status": "online"
    },
    {
      "userId": "12345",
      "clientId": "67890",
      "username": "Test Bot 2",
      "coOwners": [],
      "libraryName": "discord.js",
      "shardCount": 1,
      "guildCount": 12,
      "verified": false,
      "online": false,
      "inGuild": true,
      "owner": {"username": "testOwner", "discriminator": null, "userId": "112358"},
      "addedDate": "2018-03-01T12:00:00.000Z",
      "status": "offline"
    }
  ]
}"#;

/// Canned-response transport.
///
/// - `GET …/bots/{id}` returns [`BOT_RESPONSE`]
/// - `GET …/bots` returns [`BOTS_RESPONSE`]
/// - `POST …/bots/{id}/stats` echoes the posted stats back
/// - anything else is `400 Bad Request` with an empty body
#[derive(Debug, Default)]
pub struct MockTransport {
    sent: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests seen so far, including ones answered with `400`.
    pub fn requests_sent(&self) -> usize {
        self.sent.load(Ordering::SeqCst)
    }

    fn respond(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let segments: Vec<&str> = request
            .url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let tail = segments
            .iter()
            .position(|seg| *seg == "bots")
            .map(|i| &segments[i..]);

        match (&request.method, tail) {
            (&Method::GET, Some([_, _id])) => Ok(json(StatusCode::OK, BOT_RESPONSE)),
            (&Method::GET, Some([_])) => Ok(json(StatusCode::OK, BOTS_RESPONSE)),
            (&Method::POST, Some([_, _id, "stats"])) => {
                let body = request.body.as_deref().unwrap_or_default();
                let update: StatsUpdate = serde_json::from_slice(body).map_err(TransportError::new)?;
                let echoed = serde_json::to_vec(&StatsResponse {
                    stats: update.stats,
                })
                .map_err(TransportError::new)?;
                Ok(json(StatusCode::OK, echoed))
            }
            _ => Ok(ApiResponse {
                status: StatusCode::BAD_REQUEST,
                headers: HeaderMap::new(),
                body: Body::empty(),
            }),
        }
    }
}

fn json(status: StatusCode, body: impl Into<Vec<u8>>) -> ApiResponse {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    ApiResponse {
        status,
        headers,
        body: Body::from_bytes(body),
    }
}

impl Transport for MockTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        let res = self.respond(&request);
        Box::pin(async move { res })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    async fn send(t: &MockTransport, req: ApiRequest) -> (StatusCode, Vec<u8>) {
        let res = t.send(req).await.unwrap();
        (res.status, res.body.collect().await.unwrap())
    }

    #[tokio::test]
    async fn routes_by_method_and_path() {
        let t = MockTransport::new();
        let base = Url::parse("http://localhost/api/v1/").unwrap();

        let (status, body) = send(&t, ApiRequest::get(base.join("bots/botID?sanitize=true").unwrap())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, BOT_RESPONSE.as_bytes());

        let (status, body) = send(&t, ApiRequest::get(base.join("bots").unwrap())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, BOTS_RESPONSE.as_bytes());

        let (status, body) = send(&t, ApiRequest::get(base.join("badEndpoint").unwrap())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());

        let (status, _) = send(&t, ApiRequest::post(base.join("badEndpoint").unwrap(), Vec::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert_eq!(t.requests_sent(), 4);
    }

    #[tokio::test]
    async fn stats_are_echoed() {
        let t = MockTransport::new();
        let url = Url::parse("http://localhost/api/v1/bots/botID/stats").unwrap();
        let body = serde_json::to_vec(&StatsUpdate::new(100, 5)).unwrap();
        let (status, body) = send(&t, ApiRequest::post(url, body)).await;
        assert_eq!(status, StatusCode::OK);
        let echoed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(echoed, serde_json::json!({"guildCount": 100, "shardCount": 5}));
    }

    #[tokio::test]
    async fn malformed_stats_fail_the_send() {
        let t = MockTransport::new();
        let url = Url::parse("http://localhost/api/v1/bots/botID/stats").unwrap();
        assert!(t.send(ApiRequest::post(url, b"nope".to_vec())).await.is_err());
    }
}
