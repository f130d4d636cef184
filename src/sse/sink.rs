use std::io::{self, Write};

use http::header::{CONNECTION, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue, StatusCode};

/// Content type every event stream is served with.
pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream; charset=utf-8";

/// What a response writer can do when asked to flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushSupport {
    /// `flush()` pushes buffered bytes to the transport immediately.
    Transport,
    /// Nothing is buffered in between; flushing is a successful no-op.
    Noop,
    /// Bytes are held until the response completes. Cannot stream.
    Unsupported,
}

/// An HTTP response an event stream can be bound to.
///
/// This is the seam to the surrounding web server. Headers are staged in
/// [`headers_mut`](ResponseWriter::headers_mut) and go out with the status
/// on [`write_head`](ResponseWriter::write_head). Writing body bytes first
/// commits `200 OK` implicitly.
pub trait ResponseWriter: Write + Send {
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Commit the status line and staged headers. Called at most once.
    fn write_head(&mut self, status: StatusCode) -> io::Result<()>;

    fn flush_support(&self) -> FlushSupport;
}

/// Apply the two headers an SSE response must carry.
pub fn set_headers(headers: &mut HeaderMap) {
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(EVENT_STREAM_CONTENT_TYPE));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));
}

/// A byte sink with a flush that always succeeds or reaches the network.
///
/// `Network` forwards `flush()` to the wrapped writer. `Noop` accepts
/// `flush()` without doing anything, so callers can flush unconditionally
/// whatever the sink is.
#[derive(Debug)]
pub enum FlushableSink<W> {
    Network(W),
    Noop(W),
}

impl<W: Write> FlushableSink<W> {
    pub fn network(inner: W) -> Self {
        FlushableSink::Network(inner)
    }

    /// Wrap a plain writer, e.g. `io::sink()`, with a no-op flush.
    pub fn noop(inner: W) -> Self {
        FlushableSink::Noop(inner)
    }

    pub fn get_ref(&self) -> &W {
        match self {
            FlushableSink::Network(w) | FlushableSink::Noop(w) => w,
        }
    }

    pub fn into_inner(self) -> W {
        match self {
            FlushableSink::Network(w) | FlushableSink::Noop(w) => w,
        }
    }
}

impl<W: Write> Write for FlushableSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            FlushableSink::Network(w) | FlushableSink::Noop(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            FlushableSink::Network(w) => w.flush(),
            FlushableSink::Noop(_) => Ok(()),
        }
    }
}
