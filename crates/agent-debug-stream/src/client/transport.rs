use std::time::Duration;

use futures::StreamExt as _;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};
use tracing::{debug, warn};

use crate::errors::StreamError;
use crate::session::ByteStream;

use super::config::ClientConfig;

/// Content types the debug endpoints are known to stream with.
const STREAM_CONTENT_TYPES: [&str; 4] = [
    "text/event-stream",
    "text/plain",
    "application/json",
    "application/octet-stream",
];

/// A fully built stream request.
#[derive(Clone, Debug)]
pub struct StreamRequest {
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    pub timeout: Option<Duration>,
}

/// An HTTP response whose status was accepted and whose body is ready to read.
pub struct OpenedStream {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl std::fmt::Debug for OpenedStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenedStream")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Opens the byte stream for a request.
///
/// Implementations report open failures (send errors, non-success status,
/// missing body) as `Err` before any byte is handed out.
#[async_trait::async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, request: StreamRequest) -> Result<OpenedStream, StreamError>;
}

/// `reqwest`-backed transport.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| StreamError::Config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wraps an existing client (shared connection pool, custom TLS, ...).
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl StreamTransport for ReqwestTransport {
    async fn open(&self, request: StreamRequest) -> Result<OpenedStream, StreamError> {
        let mut http_req = self.client.post(&request.url).headers(request.headers);
        if let Some(body) = request.body.as_ref() {
            let bytes = serde_json::to_vec(body)
                .map_err(|e| StreamError::Validation(format!("failed to encode body: {e}")))?;
            http_req = http_req.body(bytes);
        }
        if let Some(timeout) = request.timeout {
            http_req = http_req.timeout(timeout);
        }

        let response = http_req
            .send()
            .await
            .map_err(|e| StreamError::request(format!("{} failed: {e}", request.url)))?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        debug!(url = %request.url, status = status.as_u16(), content_type = ?content_type, "stream response received");

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StreamError::Status {
                status: status.as_u16(),
                body,
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Err(StreamError::NoBody);
        }
        if !is_stream_content_type(content_type.as_deref()) {
            warn!(url = %request.url, content_type = ?content_type, "unexpected content type, streaming anyway");
        }

        let body: ByteStream = Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(|e| StreamError::read(e.to_string()))),
        );
        Ok(OpenedStream {
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

pub(crate) fn is_stream_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|value| {
        let value = value.to_ascii_lowercase();
        STREAM_CONTENT_TYPES.iter().any(|known| value.contains(known))
    })
}
