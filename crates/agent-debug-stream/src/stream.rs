use std::ops::ControlFlow;

use tokio::sync::{mpsc, oneshot};

use crate::errors::StreamError;
use crate::event::Emission;
use crate::session::{AbortHandle, SessionOutcome, StreamSession, StreamSummary};
use crate::sink::DebugSink;

/// Events yielded by [`DebugStream`].
#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    /// One decoded emission.
    Message(Emission),
    /// Terminal success.
    Completed(StreamSummary),
    /// Terminal transport failure.
    Error(StreamError),
}

impl StreamEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed(_) | Self::Error(_))
    }
}

struct ChannelSink {
    tx: mpsc::Sender<StreamEvent>,
}

#[async_trait::async_trait]
impl DebugSink for ChannelSink {
    async fn on_message(&mut self, emission: Emission) -> ControlFlow<()> {
        match self.tx.send(StreamEvent::Message(emission)).await {
            Ok(()) => ControlFlow::Continue(()),
            Err(_) => ControlFlow::Break(()),
        }
    }

    async fn on_complete(&mut self, summary: &StreamSummary) {
        let _ = self.tx.send(StreamEvent::Completed(summary.clone())).await;
    }

    async fn on_error(&mut self, error: &StreamError) {
        let _ = self.tx.send(StreamEvent::Error(error.clone())).await;
    }
}

/// Channel-backed handle over a session running on the tokio runtime.
///
/// Use `next_event()` to consume events as they arrive and `finish()` to get
/// the session outcome. Dropping the handle closes the channel, which cancels
/// the session.
pub struct DebugStream {
    session_id: uuid::Uuid,
    rx: mpsc::Receiver<StreamEvent>,
    final_rx: oneshot::Receiver<Result<SessionOutcome, StreamError>>,
    abort_handle: AbortHandle,
    saw_terminal: bool,
}

impl DebugStream {
    /// Spawns `session` with a bounded event buffer of `capacity` (at least 1).
    pub fn spawn(session: StreamSession, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (final_tx, final_rx) = oneshot::channel();
        let session_id = session.session_id();
        let abort_handle = session.abort_handle();

        let closed_tx = tx.clone();
        let abort = abort_handle.clone();
        tokio::spawn(async move {
            let mut sink = ChannelSink { tx };
            let run = session.run(&mut sink);
            tokio::pin!(run);
            let result = tokio::select! {
                biased;
                result = &mut run => result,
                _ = closed_tx.closed() => {
                    abort.abort();
                    run.await
                }
            };
            let _ = final_tx.send(result);
        });

        Self {
            session_id,
            rx,
            final_rx,
            abort_handle,
            saw_terminal: false,
        }
    }

    pub fn session_id(&self) -> uuid::Uuid {
        self.session_id
    }

    /// Returns a handle that can cancel the session.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort_handle.clone()
    }

    /// Waits for the next event. Returns `None` once the channel is closed,
    /// which follows the terminal event or a cancellation.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        let event = self.rx.recv().await;
        if event.as_ref().is_some_and(StreamEvent::is_terminal) {
            self.saw_terminal = true;
        }
        event
    }

    /// Drains remaining events and returns how the session ended.
    pub async fn finish(mut self) -> Result<SessionOutcome, StreamError> {
        while !self.saw_terminal {
            match self.rx.recv().await {
                Some(event) if event.is_terminal() => self.saw_terminal = true,
                Some(_) => {}
                None => break,
            }
        }
        match self.final_rx.await {
            Ok(result) => result,
            Err(_) => Err(StreamError::Spawn(format!(
                "session {} ended without a result",
                self.session_id
            ))),
        }
    }

    /// Adapts the handle into a `futures::Stream` of events.
    pub fn into_stream(self) -> impl futures::Stream<Item = StreamEvent> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            let event = stream.next_event().await?;
            Some((event, stream))
        })
    }
}
