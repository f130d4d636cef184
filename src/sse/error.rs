use std::io;

use thiserror::Error;

/// Errors produced while opening an event stream or delivering a frame.
///
/// `Write` and `Flush` carry the id that was assigned to the failed frame,
/// because ids are consumed before the write is attempted.
#[derive(Debug, Error)]
pub enum SseError {
    /// The response writer cannot push bytes to the transport on demand,
    /// so events would sit in an intermediate buffer.
    #[error("response writer does not support flushing; it cannot carry an event stream")]
    UnflushableSink,

    /// Event names must be non-empty and must not contain line breaks.
    #[error("invalid event name {name:?}: must be non-empty and contain no line breaks")]
    InvalidEventName {
        /// The rejected name
        name: String,
    },

    /// The id counter reached `i64::MAX`. No frame was attempted.
    #[error("event ids exhausted")]
    IdsExhausted,

    /// The JSON payload could not be produced. No id was consumed.
    #[error("failed to serialize event payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Committing the status line and headers failed.
    #[error("failed to commit response head: {0}")]
    Head(#[source] io::Error),

    /// The frame could not be written in full. The sink was not flushed.
    #[error("failed to write event {id} after {written} bytes: {source}")]
    Write {
        id: i64,
        written: usize,
        #[source]
        source: io::Error,
    },

    /// The frame was written but the flush failed; delivery is uncertain.
    #[error("failed to flush event {id} ({written} bytes written): {source}")]
    Flush {
        id: i64,
        written: usize,
        #[source]
        source: io::Error,
    },
}

impl SseError {
    /// The event id assigned to the frame this error belongs to, if any.
    pub fn id(&self) -> Option<i64> {
        match self {
            SseError::Write { id, .. } | SseError::Flush { id, .. } => Some(*id),
            _ => None,
        }
    }

    /// Bytes of the failed frame that reached the sink before the error.
    pub fn bytes_written(&self) -> usize {
        match self {
            SseError::Write { written, .. } | SseError::Flush { written, .. } => *written,
            _ => 0,
        }
    }

    /// True when the client may have seen a complete frame despite the error.
    pub fn is_uncertain_delivery(&self) -> bool {
        matches!(self, SseError::Flush { .. })
    }
}
