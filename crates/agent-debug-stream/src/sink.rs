use std::ops::ControlFlow;

use crate::errors::StreamError;
use crate::event::Emission;
use crate::session::StreamSummary;

/// Consumer of a decode session.
///
/// `on_message` runs once per emission, in arrival order. At most one of
/// `on_complete` / `on_error` runs, and neither runs after cancellation.
/// Returning `ControlFlow::Break` from `on_message` means the consumer is gone;
/// the session then ends as cancelled.
#[async_trait::async_trait]
pub trait DebugSink: Send {
    async fn on_message(&mut self, emission: Emission) -> ControlFlow<()>;

    async fn on_complete(&mut self, _summary: &StreamSummary) {}

    async fn on_error(&mut self, _error: &StreamError) {}
}

type MessageFn = Box<dyn FnMut(Emission) + Send>;
type CompleteFn = Box<dyn FnMut(&StreamSummary) + Send>;
type ErrorFn = Box<dyn FnMut(&StreamError) + Send>;

/// Sink assembled from plain callbacks.
///
/// ```
/// use agent_debug_stream::CallbackSink;
///
/// let sink = CallbackSink::new(|emission| println!("{emission:?}"))
///     .with_complete(|summary| println!("done: {} emissions", summary.stats.emissions()))
///     .with_error(|err| eprintln!("stream failed: {err}"));
/// # drop(sink);
/// ```
pub struct CallbackSink {
    on_message: MessageFn,
    on_complete: Option<CompleteFn>,
    on_error: Option<ErrorFn>,
}

impl CallbackSink {
    pub fn new(on_message: impl FnMut(Emission) + Send + 'static) -> Self {
        Self {
            on_message: Box::new(on_message),
            on_complete: None,
            on_error: None,
        }
    }

    /// Sets the completion callback.
    pub fn with_complete(mut self, on_complete: impl FnMut(&StreamSummary) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(on_complete));
        self
    }

    /// Sets the error callback.
    pub fn with_error(mut self, on_error: impl FnMut(&StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(on_error));
        self
    }
}

#[async_trait::async_trait]
impl DebugSink for CallbackSink {
    async fn on_message(&mut self, emission: Emission) -> ControlFlow<()> {
        (self.on_message)(emission);
        ControlFlow::Continue(())
    }

    async fn on_complete(&mut self, summary: &StreamSummary) {
        if let Some(callback) = self.on_complete.as_mut() {
            callback(summary);
        }
    }

    async fn on_error(&mut self, error: &StreamError) {
        if let Some(callback) = self.on_error.as_mut() {
            callback(error);
        }
    }
}

/// Collects emissions in memory.
#[async_trait::async_trait]
impl DebugSink for Vec<Emission> {
    async fn on_message(&mut self, emission: Emission) -> ControlFlow<()> {
        self.push(emission);
        ControlFlow::Continue(())
    }
}
