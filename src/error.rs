use reqwest::header::InvalidHeaderValue;
use reqwest::StatusCode;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failure reported by a [`Transport`](crate::http::Transport) while sending a
/// request or streaming its response body.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TransportError(#[source] BoxError);

impl TransportError {
    pub fn new(source: impl Into<BoxError>) -> Self {
        Self(source.into())
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self(Box::new(e))
    }
}

/// Errors returned by [`Client`](crate::Client) operations.
///
/// Every variant is terminal for the call that produced it; the client never
/// retries on its own.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller cancelled while waiting for rate limit capacity.
    #[error("cancelled while waiting for rate limit capacity")]
    RateLimitCancelled,

    /// The client was closed; no further requests are admitted.
    #[error("client is closed")]
    Closed,

    /// The caller cancelled after the request had been handed to the transport.
    #[error("request cancelled in flight")]
    Cancelled,

    #[error("transport error: {0}")]
    Transport(#[source] TransportError),

    #[error("unexpected response code: {status}")]
    UnexpectedStatus { status: StatusCode },

    /// The response arrived but its body could not be read to completion.
    #[error("reading response body (status {status}) failed: {source}")]
    BodyRead {
        status: StatusCode,
        #[source]
        source: TransportError,
    },

    #[error("encoding request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("decoding response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] InvalidHeaderValue),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// The HTTP status attached to this error, if the remote answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::UnexpectedStatus { status } | Error::BodyRead { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller-side retry could reasonably succeed.
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::Transport(_) | Error::BodyRead { .. } => true,
            Error::UnexpectedStatus { status } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn status_is_exposed_for_http_failures() {
        let e = Error::UnexpectedStatus {
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        assert_eq!(e.status().map(|s| s.as_u16()), Some(500));
        assert!(Error::RateLimitCancelled.status().is_none());
    }

    #[test]
    fn retriable_matrix() {
        let too_many = Error::UnexpectedStatus {
            status: StatusCode::TOO_MANY_REQUESTS,
        };
        assert!(too_many.is_retriable());
        let upstream = Error::UnexpectedStatus {
            status: StatusCode::BAD_GATEWAY,
        };
        assert!(upstream.is_retriable());
        let not_found = Error::UnexpectedStatus {
            status: StatusCode::NOT_FOUND,
        };
        assert!(!not_found.is_retriable());
        assert!(!Error::RateLimitCancelled.is_retriable());
        assert!(Error::Transport(TransportError::new("reset")).is_retriable());
    }

    #[test]
    fn body_read_chains_the_read_failure() {
        let e = Error::BodyRead {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            source: TransportError::new("connection reset"),
        };
        assert_eq!(e.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        let source = e.source().expect("source");
        assert_eq!(source.to_string(), "connection reset");
        assert!(e.to_string().contains("500"));
    }
}
