use std::time::Duration;

use reqwest::header::{
    ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue,
};

use crate::errors::StreamError;

/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8090/api";
/// Header that scopes authenticated requests to a workspace.
pub const WORKSPACE_HEADER: &str = "Workspace-Id";

/// Configuration for [`crate::DebugClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API base URL that relative request paths are appended to.
    pub base_url: String,
    /// Connect timeout for the HTTP client.
    pub connect_timeout: Duration,
    /// Optional total timeout per request, body included.
    ///
    /// Unset by default: debug streams stay open as long as the run lasts.
    pub timeout: Option<Duration>,
    /// Bounded event buffer between the session task and the consumer.
    pub stream_buffer_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
            timeout: None,
            stream_buffer_capacity: 128,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builds a config from `AGENT_ADMIN_API_URL` and `AGENT_ADMIN_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, StreamError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, StreamError> {
        let mut config = Self::default();
        if let Some(url) = non_blank(lookup("AGENT_ADMIN_API_URL")) {
            config.base_url = url;
        }
        if let Some(raw) = non_blank(lookup("AGENT_ADMIN_TIMEOUT_SECS")) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                StreamError::Config(format!("AGENT_ADMIN_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.timeout = Some(Duration::from_secs(secs));
        }
        config.validate()?;
        Ok(config)
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn stream_buffer_capacity(mut self, capacity: usize) -> Self {
        self.stream_buffer_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.base_url.trim().is_empty() {
            return Err(StreamError::Config("base_url must not be empty".into()));
        }
        if self.stream_buffer_capacity == 0 {
            return Err(StreamError::Config(
                "stream_buffer_capacity must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Absolute URLs pass through; anything else is appended to `base_url`.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            return path.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        }
    }
}

/// Caller identity and workspace scope for authenticated requests.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub token: Option<String>,
    pub workspace_id: Option<String>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `AGENT_ADMIN_TOKEN` and `AGENT_ADMIN_WORKSPACE_ID`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            token: non_blank(lookup("AGENT_ADMIN_TOKEN")),
            workspace_id: non_blank(lookup("AGENT_ADMIN_WORKSPACE_ID")),
        }
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = non_blank(Some(token.into()));
        self
    }

    pub fn workspace_id(mut self, workspace_id: impl Into<String>) -> Self {
        self.workspace_id = non_blank(Some(workspace_id.into()));
        self
    }
}

/// How a request authenticates.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    /// Session token plus workspace scoping.
    Session(AuthContext),
    /// Explicit bearer credential, no workspace scoping.
    Public { api_key: String },
}

impl Credentials {
    pub fn public(api_key: impl Into<String>) -> Self {
        Self::Public {
            api_key: api_key.into(),
        }
    }
}

impl From<AuthContext> for Credentials {
    fn from(value: AuthContext) -> Self {
        Self::Session(value)
    }
}

/// Builds stream request headers: the event-stream defaults, then `extra`,
/// then credentials. Later entries replace earlier ones with the same name.
pub fn build_headers(
    credentials: &Credentials,
    extra: &[(&str, &str)],
) -> Result<HeaderMap, StreamError> {
    let mut headers = HeaderMap::new();
    let event_stream = HeaderValue::from_static("text/event-stream");
    headers.insert(CONTENT_TYPE, event_stream.clone());
    headers.insert(ACCEPT, event_stream);
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    for (name, value) in extra {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| StreamError::Validation(format!("invalid header name {name}: {e}")))?;
        headers.insert(name, header_value(value)?);
    }

    match credentials {
        Credentials::Session(auth) => {
            if let Some(token) = auth.token.as_deref() {
                headers.insert(AUTHORIZATION, header_value(&format!("Bearer {token}"))?);
            }
            if let Some(workspace_id) = auth.workspace_id.as_deref() {
                headers.insert(
                    HeaderName::from_static("workspace-id"),
                    header_value(workspace_id)?,
                );
            }
        }
        Credentials::Public { api_key } => {
            if api_key.trim().is_empty() {
                return Err(StreamError::Validation("api key must not be empty".into()));
            }
            headers.insert(AUTHORIZATION, header_value(&format!("Bearer {api_key}"))?);
        }
    }
    Ok(headers)
}

fn header_value(value: &str) -> Result<HeaderValue, StreamError> {
    HeaderValue::from_str(value)
        .map_err(|e| StreamError::Validation(format!("invalid header value: {e}")))
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
