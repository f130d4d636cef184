use std::io::{self, Write};

use http::StatusCode;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, trace};

use super::event::{EventName, NamedEvent};
use super::frame::DEFAULT_FRAME_CAPACITY;
use super::send::send_frame;
use super::sink::{set_headers, FlushSupport, FlushableSink, ResponseWriter};
use super::SseError;

struct SourceState<W> {
    last_id: i64,
    buf: Vec<u8>,
    sink: Option<FlushableSink<W>>,
}

/// Per-connection event stream.
///
/// Owns the id counter and the scratch buffer for one client connection.
/// Every send holds the lock from id assignment until the flush returns,
/// so frames from concurrent producers never interleave on the wire and
/// wire order always matches id order.
///
/// Ids are assigned before the write is attempted: a failed send still
/// consumes its id, which is reported inside the error.
pub struct EventSource<W: Write> {
    state: Mutex<SourceState<W>>,
}

impl<W: ResponseWriter> EventSource<W> {
    /// Bind to a response: apply the SSE headers and commit `status`.
    ///
    /// # Errors
    ///
    /// [`SseError::UnflushableSink`] if the response cannot flush on demand,
    /// [`SseError::Head`] if committing the status line fails.
    pub fn new(res: W, status: StatusCode) -> Result<Self, SseError> {
        Self::with_capacity(res, status, DEFAULT_FRAME_CAPACITY)
    }

    /// Like [`new`](Self::new) with an explicit initial scratch capacity.
    pub fn with_capacity(mut res: W, status: StatusCode, capacity: usize) -> Result<Self, SseError> {
        let support = res.flush_support();
        if support == FlushSupport::Unsupported {
            return Err(SseError::UnflushableSink);
        }
        set_headers(res.headers_mut());
        res.write_head(status).map_err(SseError::Head)?;
        debug!(status = status.as_u16(), flush = ?support, "event stream opened");

        let sink = match support {
            FlushSupport::Transport => FlushableSink::Network(res),
            _ => FlushableSink::Noop(res),
        };
        Ok(Self::from_sink_with_capacity(sink, capacity))
    }
}

impl<W: Write> EventSource<W> {
    /// Bind to a sink whose response head, if any, is already committed.
    pub fn from_sink(sink: FlushableSink<W>) -> Self {
        Self::from_sink_with_capacity(sink, DEFAULT_FRAME_CAPACITY)
    }

    pub fn from_sink_with_capacity(sink: FlushableSink<W>, capacity: usize) -> Self {
        Self {
            state: Mutex::new(SourceState {
                last_id: 0,
                buf: Vec::with_capacity(capacity),
                sink: Some(sink),
            }),
        }
    }

    /// Send one event and return the id it was sent under.
    ///
    /// Blocks until the frame is written and flushed. On failure the
    /// consumed id is available through [`SseError::id`].
    ///
    /// Failures are only returned, never logged here.
    ///
    /// # Errors
    ///
    /// [`SseError::Write`] or [`SseError::Flush`] for the frame, or
    /// [`SseError::IdsExhausted`] once the last id was `i64::MAX`.
    pub fn send(&self, event: &EventName, data: &str) -> Result<i64, SseError> {
        let mut state = self.state.lock();
        let id = state.last_id.checked_add(1).ok_or(SseError::IdsExhausted)?;
        state.last_id = id;

        let SourceState { buf, sink, .. } = &mut *state;
        let bytes = match sink {
            Some(sink) => send_frame(sink, Some(buf), id, event.as_str(), data),
            None => send_frame(&mut FlushableSink::noop(io::sink()), Some(buf), id, event.as_str(), data),
        }?;
        trace!(id, event = %event, bytes, "event sent");
        Ok(id)
    }

    /// Serialize `value` as JSON and send it as `event`.
    ///
    /// A serialization failure returns before any id is consumed.
    pub fn send_json<T: Serialize + ?Sized>(&self, event: &EventName, value: &T) -> Result<i64, SseError> {
        let data = serde_json::to_string(value)?;
        self.send(event, &data)
    }

    /// Send a value under the event name it declares for itself.
    pub fn send_named<T: NamedEvent>(&self, value: &T) -> Result<i64, SseError> {
        self.send_json(&value.event_name(), value)
    }

    /// The most recently assigned id; `0` before the first send.
    pub fn last_event_id(&self) -> i64 {
        self.state.lock().last_id
    }

    /// Take the bound writer back, e.g. to terminate the response body.
    ///
    /// Later sends still assign ids but their frames are discarded.
    /// Returns `None` if the writer was already taken.
    pub fn detach(&self) -> Option<W> {
        let mut state = self.state.lock();
        let sink = state.sink.take()?;
        debug!(last_id = state.last_id, "event stream detached");
        Some(sink.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::MemoryResponse;
    use http::header::{CONNECTION, CONTENT_TYPE};
    use serde::ser::Error as _;
    use serde::Serializer;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("not representable"))
        }
    }

    #[derive(Serialize)]
    struct Tick {
        seq: u32,
    }

    impl NamedEvent for Tick {
        fn event_name(&self) -> EventName {
            EventName::from_static("tick")
        }
    }

    #[test]
    fn test_new_commits_head_once() {
        let res = MemoryResponse::streaming();
        let source = EventSource::new(res.clone(), StatusCode::OK).unwrap();
        assert_eq!(res.status(), Some(StatusCode::OK));
        assert_eq!(res.head_writes(), 1);
        let headers = res.headers();
        assert_eq!(headers[CONTENT_TYPE], "text/event-stream; charset=utf-8");
        assert_eq!(headers[CONNECTION], "keep-alive");
        assert!(res.body().is_empty());

        source.send(&EventName::MESSAGE, "x").unwrap();
        assert_eq!(res.head_writes(), 1);
    }

    #[test]
    fn test_unflushable_response_is_rejected() {
        let res = MemoryResponse::buffered();
        let err = EventSource::new(res.clone(), StatusCode::OK).err().unwrap();
        assert!(matches!(err, SseError::UnflushableSink));
        assert_eq!(res.status(), None);
        assert!(res.headers().is_empty());
    }

    #[test]
    fn test_head_failure_is_reported() {
        let mut res = MemoryResponse::streaming();
        res.write_head(StatusCode::OK).unwrap();
        let err = EventSource::new(res, StatusCode::OK).err().unwrap();
        assert!(matches!(err, SseError::Head(_)));
    }

    #[test]
    fn test_noop_flush_response_streams_without_flushing() {
        let res = MemoryResponse::new(FlushSupport::Noop);
        let source = EventSource::new(res.clone(), StatusCode::OK).unwrap();
        assert_eq!(source.send(&EventName::MESSAGE, "hi").unwrap(), 1);
        assert_eq!(res.flushes(), 0);
        assert_eq!(res.body_string(), "id: 1\nevent: message\ndata: hi\n\n");
    }

    #[test]
    fn test_send_flushes_every_frame() {
        let res = MemoryResponse::streaming();
        let source = EventSource::new(res.clone(), StatusCode::OK).unwrap();
        source.send(&EventName::MESSAGE, "a").unwrap();
        source.send(&EventName::MESSAGE, "b").unwrap();
        assert_eq!(res.flushes(), 2);
    }

    #[test]
    fn test_serialization_failure_consumes_no_id() {
        let res = MemoryResponse::streaming();
        let source = EventSource::new(res.clone(), StatusCode::OK).unwrap();
        source.send(&EventName::MESSAGE, "first").unwrap();
        let err = source.send_json(&EventName::MESSAGE, &Unserializable).unwrap_err();
        assert!(matches!(err, SseError::Serialization(_)));
        assert_eq!(source.last_event_id(), 1);
        assert_eq!(res.body_string(), "id: 1\nevent: message\ndata: first\n\n");
    }

    #[test]
    fn test_send_named_uses_declared_name() {
        let res = MemoryResponse::streaming();
        let source = EventSource::new(res.clone(), StatusCode::OK).unwrap();
        assert_eq!(source.send_named(&Tick { seq: 4 }).unwrap(), 1);
        assert_eq!(res.body_string(), "id: 1\nevent: tick\ndata: {\"seq\":4}\n\n");
    }

    #[test]
    fn test_detach_returns_writer_and_discards_later_sends() {
        let res = MemoryResponse::streaming();
        let source = EventSource::new(res.clone(), StatusCode::OK).unwrap();
        source.send(&EventName::MESSAGE, "kept").unwrap();

        assert!(source.detach().is_some());
        assert!(source.detach().is_none());

        assert_eq!(source.send(&EventName::MESSAGE, "dropped").unwrap(), 2);
        assert_eq!(source.last_event_id(), 2);
        assert_eq!(res.body_string(), "id: 1\nevent: message\ndata: kept\n\n");
    }

    #[derive(Clone, Default)]
    struct LogBuf(std::sync::Arc<Mutex<Vec<u8>>>);

    impl Write for LogBuf {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_send_is_returned_not_logged() {
        let logs = LogBuf::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let res = MemoryResponse::streaming();
        let source = EventSource::new(res.clone(), StatusCode::OK).unwrap();
        let logged_before = logs.0.lock().len();
        assert!(String::from_utf8_lossy(&logs.0.lock()).contains("event stream opened"));

        res.fail_writes(true);
        let err = source.send(&EventName::MESSAGE, "lost").unwrap_err();
        assert_eq!(err.id(), Some(1));
        assert_eq!(logs.0.lock().len(), logged_before);
    }

    #[test]
    fn test_exhausted_ids_fail_without_writing() {
        let res = MemoryResponse::streaming();
        let source = EventSource::new(res.clone(), StatusCode::OK).unwrap();
        source.state.lock().last_id = i64::MAX - 1;

        assert_eq!(source.send(&EventName::MESSAGE, "last").unwrap(), i64::MAX);
        let err = source.send(&EventName::MESSAGE, "overflow").unwrap_err();
        assert!(matches!(err, SseError::IdsExhausted));
        assert_eq!(err.id(), None);
        assert_eq!(source.last_event_id(), i64::MAX);
        assert_eq!(res.flushes(), 1);
        assert_eq!(
            res.body_string(),
            format!("id: {}\nevent: message\ndata: last\n\n", i64::MAX)
        );
    }

    #[test]
    fn test_from_sink_skips_headers() {
        let source = EventSource::from_sink(FlushableSink::noop(Vec::new()));
        source.send(&EventName::ERROR, "boom").unwrap();
        let bytes = source.detach().unwrap();
        assert_eq!(bytes, b"id: 1\nevent: error\ndata: boom\n\n");
    }
}
