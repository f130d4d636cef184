use std::io::{self, Write};

use super::frame::{encode, frame_id, DEFAULT_FRAME_CAPACITY};
use super::sink::FlushableSink;
use super::SseError;

/// Encode one frame and push it through `sink`, flushing on success.
///
/// `buf` is scratch space: it is cleared first, or a fresh buffer is used
/// when none is supplied. The sink is only flushed after the whole frame
/// was accepted, so a client never receives a flushed partial frame.
///
/// Returns the number of frame bytes written. A flush failure is reported
/// as [`SseError::Flush`] even though the bytes went out.
pub fn send_frame<W: Write>(
    sink: &mut FlushableSink<W>,
    buf: Option<&mut Vec<u8>>,
    id: i64,
    event: &str,
    payload: &str,
) -> Result<usize, SseError> {
    let id = frame_id(id);
    let mut scratch: Vec<u8>;
    let buf = match buf {
        Some(buf) => {
            buf.clear();
            buf
        }
        None => {
            scratch = Vec::with_capacity(DEFAULT_FRAME_CAPACITY);
            &mut scratch
        }
    };
    encode(buf, id, event, payload).map_err(|source| SseError::Write {
        id,
        written: 0,
        source,
    })?;

    let written = write_frame(sink, buf).map_err(|(written, source)| SseError::Write {
        id,
        written,
        source,
    })?;
    sink.flush()
        .map_err(|source| SseError::Flush { id, written, source })?;
    Ok(written)
}

fn write_frame<W: Write>(sink: &mut W, frame: &[u8]) -> Result<usize, (usize, io::Error)> {
    let mut written = 0;
    while written < frame.len() {
        match sink.write(&frame[written..]) {
            Ok(0) => {
                return Err((
                    written,
                    io::Error::new(io::ErrorKind::WriteZero, "sink accepted no bytes"),
                ))
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err((written, e)),
        }
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Accepts at most `limit` bytes in total, then fails or stalls.
    struct LimitedWriter {
        bytes: Vec<u8>,
        limit: usize,
        stall: bool,
        flushes: usize,
    }

    impl LimitedWriter {
        fn new(limit: usize) -> Self {
            Self { bytes: Vec::new(), limit, stall: false, flushes: 0 }
        }
    }

    impl Write for LimitedWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.bytes.len();
            if room == 0 {
                if self.stall {
                    return Ok(0);
                }
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            // two bytes at a time to exercise the write loop
            let n = buf.len().min(room).min(2);
            self.bytes.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    #[test]
    fn test_send_writes_and_flushes() {
        let mut sink = FlushableSink::network(LimitedWriter::new(usize::MAX));
        let mut buf = b"stale bytes".to_vec();
        let n = send_frame(&mut sink, Some(&mut buf), 1, "message", "hello").unwrap();
        let expected = b"id: 1\nevent: message\ndata: hello\n\n";
        assert_eq!(n, expected.len());
        assert_eq!(buf, expected);
        let writer = sink.into_inner();
        assert_eq!(writer.bytes, expected);
        assert_eq!(writer.flushes, 1);
    }

    #[test]
    fn test_send_without_buffer() {
        let mut sink = FlushableSink::noop(Vec::new());
        let n = send_frame(&mut sink, None, 0, "message", "x").unwrap();
        assert_eq!(sink.get_ref().as_slice(), b"id: 1\nevent: message\ndata: x\n\n");
        assert_eq!(n, sink.get_ref().len());
    }

    #[test]
    fn test_failed_write_is_not_flushed() {
        let mut sink = FlushableSink::network(LimitedWriter::new(5));
        let err = send_frame(&mut sink, None, 3, "message", "hello").unwrap_err();
        match err {
            SseError::Write { id, written, ref source } => {
                assert_eq!(id, 3);
                assert_eq!(written, 5);
                assert_eq!(source.kind(), io::ErrorKind::BrokenPipe);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(sink.get_ref().flushes, 0);
    }

    #[test]
    fn test_stalled_sink_reports_write_zero() {
        let mut writer = LimitedWriter::new(4);
        writer.stall = true;
        let mut sink = FlushableSink::network(writer);
        let err = send_frame(&mut sink, None, 1, "message", "hello").unwrap_err();
        assert_eq!(err.bytes_written(), 4);
        assert!(matches!(err, SseError::Write { ref source, .. } if source.kind() == io::ErrorKind::WriteZero));
        assert_eq!(sink.get_ref().flushes, 0);
    }

    struct FailingFlush(Vec<u8>);

    impl Write for FailingFlush {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn test_flush_error_propagates_after_full_write() {
        let mut sink = FlushableSink::network(FailingFlush(Vec::new()));
        let err = send_frame(&mut sink, None, 8, "message", "a\nb").unwrap_err();
        let frame_len = b"id: 8\nevent: message\ndata: a\ndata: b\n\n".len();
        assert!(err.is_uncertain_delivery());
        assert_eq!(err.id(), Some(8));
        assert_eq!(err.bytes_written(), frame_len);
        assert_eq!(sink.get_ref().0.len(), frame_len);
    }

    #[test]
    fn test_noop_sink_ignores_flush_failure_capability() {
        let mut sink = FlushableSink::noop(FailingFlush(Vec::new()));
        assert!(send_frame(&mut sink, None, 1, "message", "ok").is_ok());
    }
}
