use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::StreamExt as _;
use tokio::sync::watch;
use tracing::{debug, error};

use crate::decoder::{DecodeStats, Decoded, LineDecoder};
use crate::errors::StreamError;
use crate::sink::DebugSink;

/// Already-open transport body.
pub type ByteStream =
    Pin<Box<dyn futures::Stream<Item = Result<Bytes, StreamError>> + Send + 'static>>;

/// Lifecycle of a [`StreamSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Reading,
    Completed,
    Cancelled,
    Failed,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Totals reported when a session ends without a transport error.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StreamSummary {
    pub session_id: uuid::Uuid,
    pub stats: DecodeStats,
}

/// How a session ended when it did not fail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionOutcome {
    /// End-of-stream or termination sentinel. The completion callback ran.
    Completed(StreamSummary),
    /// The caller aborted or the consumer went away. No completion callback.
    Cancelled(StreamSummary),
}

impl SessionOutcome {
    pub fn summary(&self) -> &StreamSummary {
        match self {
            Self::Completed(summary) | Self::Cancelled(summary) => summary,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Handle used to force-terminate a session and observe its state.
///
/// Available as soon as the session exists, so an abort requested before the
/// first byte arrives is still honored.
#[derive(Clone)]
pub struct AbortHandle {
    tx: watch::Sender<bool>,
    state: watch::Receiver<SessionState>,
}

impl AbortHandle {
    /// Requests cancellation.
    ///
    /// Takes effect before the next chunk read and before the next sink call.
    /// A read already in flight is abandoned, not interrupted mid-chunk.
    pub fn abort(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// `true` once the session has dropped its transport stream.
    pub fn is_released(&self) -> bool {
        self.tx.is_closed()
    }
}

impl fmt::Debug for AbortHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbortHandle")
            .field("aborted", &self.is_aborted())
            .field("state", &self.state())
            .finish()
    }
}

enum Exit {
    Completed,
    Cancelled,
}

/// One decode session over one streamed response.
///
/// Owns the byte stream, the line buffer, and the abort receiver. All three
/// are dropped on every exit path before the terminal callback runs.
pub struct StreamSession {
    session_id: uuid::Uuid,
    source: ByteStream,
    decoder: LineDecoder,
    abort_tx: watch::Sender<bool>,
    abort_rx: watch::Receiver<bool>,
    state_tx: watch::Sender<SessionState>,
}

impl StreamSession {
    /// Creates an idle session over an already-open byte stream.
    pub fn new(source: ByteStream) -> Self {
        let (abort_tx, abort_rx) = watch::channel(false);
        let (state_tx, _) = watch::channel(SessionState::Idle);
        Self {
            session_id: uuid::Uuid::new_v4(),
            source,
            decoder: LineDecoder::new(),
            abort_tx,
            abort_rx,
            state_tx,
        }
    }

    /// Creates a session from any byte stream whose errors can be displayed.
    pub fn from_stream<S, B, E>(stream: S) -> Self
    where
        S: futures::Stream<Item = Result<B, E>> + Send + 'static,
        B: Into<Bytes>,
        E: fmt::Display,
    {
        let source = stream.map(|item| {
            item.map(Into::into)
                .map_err(|e| StreamError::read(e.to_string()))
        });
        Self::new(Box::pin(source))
    }

    pub fn session_id(&self) -> uuid::Uuid {
        self.session_id
    }

    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            tx: self.abort_tx.clone(),
            state: self.state_tx.subscribe(),
        }
    }

    /// Reads the stream to a terminal state, feeding every emission to `sink`.
    ///
    /// Transport failures call `sink.on_error` once and are returned as `Err`.
    pub async fn run<K>(mut self, sink: &mut K) -> Result<SessionOutcome, StreamError>
    where
        K: DebugSink + ?Sized,
    {
        let session_id = self.session_id;
        debug!(%session_id, "debug stream session started");
        self.state_tx.send_replace(SessionState::Reading);

        let result = self.read_loop(sink).await;
        let stats = self.decoder.stats();
        let state_tx = self.release();
        let summary = StreamSummary { session_id, stats };

        match result {
            Ok(Exit::Completed) => {
                state_tx.send_replace(SessionState::Completed);
                debug!(
                    %session_id,
                    lines = stats.lines,
                    emissions = stats.emissions(),
                    malformed = stats.malformed,
                    "debug stream completed"
                );
                sink.on_complete(&summary).await;
                Ok(SessionOutcome::Completed(summary))
            }
            Ok(Exit::Cancelled) => {
                state_tx.send_replace(SessionState::Cancelled);
                debug!(%session_id, emissions = stats.emissions(), "debug stream cancelled");
                Ok(SessionOutcome::Cancelled(summary))
            }
            Err(err) => {
                state_tx.send_replace(SessionState::Failed);
                error!(%session_id, error = %err, "debug stream failed");
                sink.on_error(&err).await;
                Err(err)
            }
        }
    }

    async fn read_loop<K>(&mut self, sink: &mut K) -> Result<Exit, StreamError>
    where
        K: DebugSink + ?Sized,
    {
        loop {
            if self.abort_requested() {
                return Ok(Exit::Cancelled);
            }
            let next = tokio::select! {
                biased;
                _ = self.abort_rx.changed() => continue,
                next = self.source.next() => next,
            };
            match next {
                Some(Ok(chunk)) => {
                    debug!(session_id = %self.session_id, bytes = chunk.len(), "chunk received");
                    let decoded = self.decoder.push_chunk(&chunk);
                    if let Some(exit) = self.deliver(decoded, sink).await {
                        return Ok(exit);
                    }
                }
                Some(Err(err)) => return Err(err),
                None => {
                    let decoded = self.decoder.finish();
                    return Ok(self.deliver(decoded, sink).await.unwrap_or(Exit::Completed));
                }
            }
        }
    }

    async fn deliver<K>(&mut self, decoded: Vec<Decoded>, sink: &mut K) -> Option<Exit>
    where
        K: DebugSink + ?Sized,
    {
        for item in decoded {
            if self.abort_requested() {
                return Some(Exit::Cancelled);
            }
            match item {
                Decoded::Terminated => {
                    debug!(session_id = %self.session_id, "termination sentinel received");
                    return Some(Exit::Completed);
                }
                Decoded::Emit(emission) => {
                    if sink.on_message(emission).await.is_break() {
                        debug!(session_id = %self.session_id, "consumer closed");
                        return Some(Exit::Cancelled);
                    }
                }
            }
        }
        None
    }

    fn abort_requested(&self) -> bool {
        *self.abort_rx.borrow()
    }

    /// Drops the transport stream and the abort channel, keeping only the
    /// state sender for the terminal transition.
    fn release(self) -> watch::Sender<SessionState> {
        let Self {
            source,
            abort_tx,
            abort_rx,
            state_tx,
            ..
        } = self;
        drop(source);
        drop(abort_rx);
        drop(abort_tx);
        state_tx
    }
}

impl fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamSession")
            .field("session_id", &self.session_id)
            .field("stats", &self.decoder.stats())
            .finish_non_exhaustive()
    }
}
