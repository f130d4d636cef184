use std::io::{self, Write};
use std::sync::Arc;

use http::{HeaderMap, StatusCode};
use parking_lot::Mutex;

use super::sink::{FlushSupport, ResponseWriter};

#[derive(Debug, Default)]
struct Captured {
    status: Option<StatusCode>,
    headers: HeaderMap,
    head_writes: usize,
    body: Vec<u8>,
    flushes: usize,
    fail_writes: bool,
    fail_flush: bool,
}

/// In-memory [`ResponseWriter`] that records everything written to it.
///
/// Clones share the captured state, so a test keeps one handle and gives
/// the other to an [`EventSource`](super::EventSource). Write and flush
/// failures can be injected to simulate a client that went away.
#[derive(Clone, Debug)]
pub struct MemoryResponse {
    support: FlushSupport,
    staged: HeaderMap,
    captured: Arc<Mutex<Captured>>,
}

impl MemoryResponse {
    pub fn new(support: FlushSupport) -> Self {
        Self {
            support,
            staged: HeaderMap::new(),
            captured: Arc::new(Mutex::new(Captured::default())),
        }
    }

    /// A response whose flush reaches the (pretend) transport.
    pub fn streaming() -> Self {
        Self::new(FlushSupport::Transport)
    }

    /// A response that buffers until completion and cannot stream.
    pub fn buffered() -> Self {
        Self::new(FlushSupport::Unsupported)
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.captured.lock().status
    }

    /// Headers as committed by `write_head`.
    pub fn headers(&self) -> HeaderMap {
        self.captured.lock().headers.clone()
    }

    pub fn head_writes(&self) -> usize {
        self.captured.lock().head_writes
    }

    pub fn body(&self) -> Vec<u8> {
        self.captured.lock().body.clone()
    }

    pub fn body_string(&self) -> String {
        String::from_utf8_lossy(&self.captured.lock().body).into_owned()
    }

    pub fn flushes(&self) -> usize {
        self.captured.lock().flushes
    }

    pub fn fail_writes(&self, fail: bool) {
        self.captured.lock().fail_writes = fail;
    }

    pub fn fail_flush(&self, fail: bool) {
        self.captured.lock().fail_flush = fail;
    }
}

impl Write for MemoryResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.captured.lock().status.is_none() {
            self.write_head(StatusCode::OK)?;
        }
        let mut captured = self.captured.lock();
        if captured.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "client disconnected"));
        }
        captured.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut captured = self.captured.lock();
        if captured.fail_flush {
            return Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"));
        }
        captured.flushes += 1;
        Ok(())
    }
}

impl ResponseWriter for MemoryResponse {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.staged
    }

    fn write_head(&mut self, status: StatusCode) -> io::Result<()> {
        let mut captured = self.captured.lock();
        if captured.status.is_some() {
            return Err(io::Error::new(io::ErrorKind::Other, "response head already written"));
        }
        captured.status = Some(status);
        captured.headers = self.staged.clone();
        captured.head_writes += 1;
        Ok(())
    }

    fn flush_support(&self) -> FlushSupport {
        self.support
    }
}
