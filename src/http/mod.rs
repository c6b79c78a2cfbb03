//! The transport seam between the [`Client`](crate::Client) and the network.

use crate::config::Config;
use crate::error::TransportError;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

/// A fully composed outbound request.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn post(url: Url, body: Vec<u8>) -> Self {
        Self {
            method: Method::POST,
            url,
            headers: HeaderMap::new(),
            body: Some(body),
        }
    }
}

/// A response whose body has not been read yet.
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Body,
}

impl fmt::Debug for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

/// Streaming response body. Whatever backs it (a pooled connection, a test
/// buffer) is released when the `Body` is dropped, whether or not it was read.
pub struct Body(BoxStream<'static, Result<Vec<u8>, TransportError>>);

impl Body {
    pub fn empty() -> Self {
        Self(stream::empty().boxed())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(stream::once(futures::future::ready(Ok(bytes.into()))).boxed())
    }

    pub fn from_stream<S>(stream: S) -> Self
    where
        S: futures::Stream<Item = Result<Vec<u8>, TransportError>> + Send + 'static,
    {
        Self(stream.boxed())
    }

    /// Reads the body to completion, consuming it.
    pub async fn collect(self) -> Result<Vec<u8>, TransportError> {
        self.0
            .try_fold(Vec::new(), |mut buf, chunk| async move {
                buf.extend_from_slice(&chunk);
                Ok(buf)
            })
            .await
    }
}

/// Sends requests on behalf of a [`Client`](crate::Client).
///
/// Implementations are shared between concurrent calls and must be safe for
/// that. `reqwest::Client` implements this directly; tests substitute
/// [`MockTransport`](crate::mock::MockTransport) or their own doubles.
pub trait Transport: Send + Sync {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>>;
}

impl Transport for Client {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<ApiResponse, TransportError>> {
        Box::pin(async move {
            let mut builder = self
                .request(request.method, request.url)
                .headers(request.headers);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
            let res = builder.send().await?;
            let status = res.status();
            let headers = res.headers().clone();
            let body = Body::from_stream(
                res.bytes_stream()
                    .map_ok(|chunk| chunk.to_vec())
                    .map_err(TransportError::from),
            );
            Ok(ApiResponse {
                status,
                headers,
                body,
            })
        })
    }
}

/// The default HTTP client: rustls, the configured User-Agent and timeout.
pub fn build_client(cfg: &Config) -> crate::Result<Client> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(USER_AGENT, HeaderValue::from_str(&cfg.user_agent)?);
    let builder = Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(cfg.timeout_secs))
        .use_rustls_tls();
    builder
        .build()
        .map_err(|e| crate::Error::Transport(TransportError::from(e)))
}
