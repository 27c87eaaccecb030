//! Incremental decoder for agent and workflow debug streams.
//!
//! While an agent or workflow runs, the admin API streams its execution trace
//! as a chunked HTTP body. This crate turns those bytes into an ordered
//! sequence of [`Emission`]s: typed [`DebugEvent`]s (model tokens, tool calls,
//! tool results, hand-offs, workflow nodes, errors) and plain text.
//!
//! Three wire formats are accepted line by line: `data: <payload>` lines
//! (`data: [DONE]` ends the stream), bare JSON lines, and plain text.
//!
//! # Channel-based usage
//!
//! ```no_run
//! use agent_debug_stream::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), StreamError> {
//! let client = DebugClient::new(ClientConfig::new("http://localhost:8090/api"))?;
//! let auth = AuthContext::new().token("session-token").workspace_id("ws-1");
//! let request = DebugAgentRequest::new(AgentType::Workflow, "Summarize today's tickets");
//!
//! let mut stream = client.debug_agent(&request, &auth).await?;
//! while let Some(event) = stream.next_event().await {
//!     if let StreamEvent::Message(emission) = event {
//!         println!("{}", emission.to_wire().unwrap_or_default());
//!     }
//! }
//! stream.finish().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Decoding an already-open byte stream
//!
//! ```
//! use agent_debug_stream::{Emission, StreamSession};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let chunks: Vec<Result<&'static [u8], std::io::Error>> =
//!     vec![Ok(&b"data: {\"type\":\"ai\",\"content\":\"hel"[..]), Ok(&b"lo\"}\ndata: [DONE]\n"[..])];
//! let session = StreamSession::from_stream(futures::stream::iter(chunks));
//!
//! let mut emissions: Vec<Emission> = Vec::new();
//! session.run(&mut emissions).await.unwrap();
//! assert_eq!(emissions[0].as_debug().unwrap().content.as_deref(), Some("hello"));
//! # }
//! ```

/// Line classification (labeled, bare JSON, plain text, terminator).
pub mod classify;
/// HTTP transport, configuration, and the client entry point.
pub mod client;
/// Framing, classification, and normalization composed into one decoder.
pub mod decoder;
/// Error types.
pub mod errors;
/// Debug event model and emissions.
pub mod event;
/// Chunk-to-line framing.
pub mod frame;
/// Payload to emission mapping.
pub mod normalize;
/// Process-wide tracing setup.
pub mod observability;
/// Common imports for typical usage.
pub mod prelude;
/// The stream controller: read loop, abort handle, terminal signaling.
pub mod session;
/// Consumer contract and callback-based sinks.
pub mod sink;
/// Channel-backed session handle.
pub mod stream;

pub use classify::{LineKind, classify_line};
pub use client::{
    AgentType, AuthContext, ClientConfig, Credentials, DebugAgentRequest, DebugClient,
    ReqwestTransport, StreamRequest, StreamTransport,
};
pub use decoder::{DecodeStats, Decoded, LineDecoder};
pub use errors::StreamError;
pub use event::{DebugEvent, DebugEventKind, DebugMetadata, Emission};
pub use frame::LineSplitter;
pub use normalize::{Normalized, normalize};
pub use session::{
    AbortHandle, ByteStream, SessionOutcome, SessionState, StreamSession, StreamSummary,
};
pub use sink::{CallbackSink, DebugSink};
pub use stream::{DebugStream, StreamEvent};
