/// Errors that cross the decoder boundary.
///
/// Only transport-level failures and invalid client setup end up here.
/// Line-level anomalies (malformed JSON, unknown event kinds) are absorbed by
/// the decoder and only show up in [`crate::DecodeStats`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StreamError {
    /// Invalid client configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Invalid request input.
    #[error("validation error: {0}")]
    Validation(String),
    /// The HTTP request could not be sent.
    #[error("request failed: {0}")]
    Request(String),
    /// The server answered with a non-success status.
    #[error("HTTP error! status: {status}")]
    Status { status: u16, body: String },
    /// The response carries no readable body.
    #[error("response has no readable body")]
    NoBody,
    /// Reading the chunked body failed mid-stream.
    #[error("stream read failed: {0}")]
    Read(String),
    /// The background streaming task ended without reporting a result.
    #[error("stream task failed: {0}")]
    Spawn(String),
}

impl StreamError {
    /// Creates a request-level error.
    pub fn request(message: impl Into<String>) -> Self {
        Self::Request(message.into())
    }

    /// Creates a read-level error.
    pub fn read(message: impl Into<String>) -> Self {
        Self::Read(message.into())
    }

    /// Returns `true` for errors raised before any body byte was read.
    pub fn is_open_error(&self) -> bool {
        matches!(
            self,
            Self::Request(_)
                | Self::Status { .. }
                | Self::NoBody
                | Self::Config(_)
                | Self::Validation(_)
        )
    }

    /// HTTP status attached to this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message_matches_wire_wording() {
        let err = StreamError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(err.to_string(), "HTTP error! status: 502");
        assert_eq!(err.status_code(), Some(502));
        assert!(err.is_open_error());
    }

    #[test]
    fn read_errors_are_not_open_errors() {
        let err = StreamError::read("connection reset");
        assert!(!err.is_open_error());
        assert_eq!(err.status_code(), None);
    }
}
