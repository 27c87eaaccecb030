//! Common imports for typical usage.
//!
//! Exports the client, session, and event types most callers touch, so
//! examples and application code need fewer import lines.
pub use crate::{
    AbortHandle, AgentType, AuthContext, CallbackSink, ClientConfig, Credentials, DebugAgentRequest,
    DebugClient, DebugEvent, DebugEventKind, DebugSink, DebugStream, Emission, SessionOutcome,
    SessionState, StreamError, StreamEvent, StreamSession, StreamSummary,
};
