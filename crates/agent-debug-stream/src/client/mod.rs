//! HTTP side of the debug stream: configuration, credentials, transports, and
//! the [`DebugClient`] that ties them to a [`StreamSession`].
//!
//! Both the authenticated and the public variant share the same decode core;
//! they differ only in the headers they send.
mod config;
mod request;
mod transport;

pub use config::{
    AuthContext, ClientConfig, Credentials, DEFAULT_BASE_URL, WORKSPACE_HEADER, build_headers,
};
pub use request::{AgentType, DEBUG_AGENT_PATH, DebugAgentRequest, PUBLIC_RUN_PATH, RunnableConfig};
pub use transport::{OpenedStream, ReqwestTransport, StreamRequest, StreamTransport};

use std::sync::Arc;

use tracing::debug;

use crate::errors::StreamError;
use crate::session::{SessionOutcome, StreamSession};
use crate::sink::DebugSink;
use crate::stream::DebugStream;

/// Opens debug streams against the admin API.
#[derive(Clone)]
pub struct DebugClient {
    transport: Arc<dyn StreamTransport>,
    config: ClientConfig,
}

impl DebugClient {
    /// Creates a client with the `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self, StreamError> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        Ok(Self {
            transport: Arc::new(transport),
            config,
        })
    }

    /// Creates a client from `AGENT_ADMIN_*` environment variables.
    pub fn from_env() -> Result<Self, StreamError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Creates a client over a custom transport.
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn StreamTransport>,
    ) -> Result<Self, StreamError> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builds the request for `path` without sending it.
    pub fn build_request(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        credentials: &Credentials,
    ) -> Result<StreamRequest, StreamError> {
        Ok(StreamRequest {
            url: self.config.resolve_url(path),
            headers: build_headers(credentials, &[])?,
            body,
            timeout: self.config.timeout,
        })
    }

    /// Opens the response and wraps its body in an idle session.
    pub async fn open(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        credentials: &Credentials,
    ) -> Result<StreamSession, StreamError> {
        let request = self.build_request(path, body, credentials)?;
        debug!(url = %request.url, "opening debug stream");
        let opened = self.transport.open(request).await?;
        Ok(StreamSession::new(opened.body))
    }

    /// Opens the response and runs it on a background task.
    pub async fn stream(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        credentials: &Credentials,
    ) -> Result<DebugStream, StreamError> {
        let session = self.open(path, body, credentials).await?;
        Ok(DebugStream::spawn(
            session,
            self.config.stream_buffer_capacity,
        ))
    }

    /// Opens the response and drives it into `sink` on the current task.
    ///
    /// An open failure is reported through `sink.on_error` exactly once and
    /// returned, the same as a read failure.
    pub async fn run<K>(
        &self,
        path: &str,
        body: Option<serde_json::Value>,
        credentials: &Credentials,
        sink: &mut K,
    ) -> Result<SessionOutcome, StreamError>
    where
        K: DebugSink + ?Sized,
    {
        let session = match self.open(path, body, credentials).await {
            Ok(session) => session,
            Err(err) => {
                sink.on_error(&err).await;
                return Err(err);
            }
        };
        session.run(sink).await
    }

    /// Starts an authenticated agent debug run.
    pub async fn debug_agent(
        &self,
        request: &DebugAgentRequest,
        auth: &AuthContext,
    ) -> Result<DebugStream, StreamError> {
        request.validate()?;
        let credentials = Credentials::Session(auth.clone());
        self.stream(DEBUG_AGENT_PATH, Some(request.to_json()?), &credentials)
            .await
    }

    /// Starts a public agent run authenticated by an API key.
    pub async fn run_agent_public(
        &self,
        body: serde_json::Value,
        api_key: &str,
    ) -> Result<DebugStream, StreamError> {
        self.stream(PUBLIC_RUN_PATH, Some(body), &Credentials::public(api_key))
            .await
    }
}
