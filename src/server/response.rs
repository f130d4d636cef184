use std::io::{self, BufWriter, Write};

use http::header::{HeaderValue, CONNECTION, TRANSFER_ENCODING};
use http::{HeaderMap, StatusCode, Version};

use crate::sse::{FlushSupport, ResponseWriter};

/// Streaming HTTP/1.x response over a raw connection.
///
/// The head is written on [`write_head`](ResponseWriter::write_head) (or
/// implicitly as `200 OK` on the first body write). HTTP/1.1 responses use
/// `transfer-encoding: chunked` and each body `write` becomes one chunk, so
/// an event frame written in one call is never split across chunks.
/// HTTP/1.0 clients cannot decode chunks: their body is written as is and
/// ends when the connection closes. `flush` pushes everything to the socket.
pub struct HttpStreamWriter<S: Write> {
    out: BufWriter<S>,
    headers: HeaderMap,
    head_written: bool,
    chunked: bool,
}

impl<S: Write + Send> HttpStreamWriter<S> {
    /// An HTTP/1.1 response with a chunked body.
    pub fn new(stream: S) -> Self {
        Self::for_version(stream, Version::HTTP_11)
    }

    /// A response framed for a client that spoke `version`.
    pub fn for_version(stream: S, version: Version) -> Self {
        Self {
            out: BufWriter::new(stream),
            headers: HeaderMap::new(),
            head_written: false,
            chunked: version != Version::HTTP_10 && version != Version::HTTP_09,
        }
    }

    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    pub fn head_written(&self) -> bool {
        self.head_written
    }

    /// End the body and hand back the stream.
    ///
    /// Chunked responses get their terminating zero-length chunk. A
    /// close-delimited body ends once the returned stream is dropped.
    pub fn finish(mut self) -> io::Result<S> {
        if !self.head_written {
            self.write_head(StatusCode::OK)?;
        }
        if self.chunked {
            self.out.write_all(b"0\r\n\r\n")?;
        }
        self.out.into_inner().map_err(|e| e.into_error())
    }
}

impl<S: Write + Send> ResponseWriter for HttpStreamWriter<S> {
    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_head(&mut self, status: StatusCode) -> io::Result<()> {
        if self.head_written {
            return Err(io::Error::new(io::ErrorKind::Other, "response head already written"));
        }
        let version = if self.chunked {
            self.headers.insert(TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
            "HTTP/1.1"
        } else {
            self.headers.remove(TRANSFER_ENCODING);
            self.headers.insert(CONNECTION, HeaderValue::from_static("close"));
            "HTTP/1.0"
        };
        write!(
            self.out,
            "{} {} {}\r\n",
            version,
            status.as_u16(),
            status.canonical_reason().unwrap_or("")
        )?;
        for (name, value) in &self.headers {
            self.out.write_all(name.as_str().as_bytes())?;
            self.out.write_all(b": ")?;
            self.out.write_all(value.as_bytes())?;
            self.out.write_all(b"\r\n")?;
        }
        self.out.write_all(b"\r\n")?;
        self.head_written = true;
        self.out.flush()
    }

    fn flush_support(&self) -> FlushSupport {
        FlushSupport::Transport
    }
}

impl<S: Write + Send> Write for HttpStreamWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if !self.head_written {
            self.write_head(StatusCode::OK)?;
        }
        if !self.chunked {
            return self.out.write(buf);
        }
        // a zero-length chunk would end the body
        if buf.is_empty() {
            return Ok(0);
        }
        write!(self.out, "{:x}\r\n", buf.len())?;
        self.out.write_all(buf)?;
        self.out.write_all(b"\r\n")?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

/// Reply with a short plain-text error and no body streaming.
pub fn write_plain_error<S: Write>(stream: &mut S, status: StatusCode, message: &str) -> io::Result<()> {
    write!(
        stream,
        "HTTP/1.1 {} {}\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
        message.len(),
        message
    )?;
    stream.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sse::{EventName, EventSource};
    use http::header::CONTENT_TYPE;

    #[test]
    fn test_head_then_chunks() {
        let mut res = HttpStreamWriter::new(Vec::new());
        res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
        res.write_head(StatusCode::OK).unwrap();
        res.write_all(b"hello").unwrap();
        let out = String::from_utf8(res.finish().unwrap()).unwrap();
        assert_eq!(
            out,
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n5\r\nhello\r\n0\r\n\r\n"
        );
    }

    #[test]
    fn test_implicit_ok_on_first_write() {
        let mut res = HttpStreamWriter::new(Vec::new());
        res.write_all(b"x").unwrap();
        assert!(res.head_written());
        assert!(res.write_head(StatusCode::OK).is_err());
    }

    #[test]
    fn test_event_source_frame_is_one_chunk() {
        let res = HttpStreamWriter::new(Vec::new());
        let source = EventSource::new(res, StatusCode::OK).unwrap();
        source.send(&EventName::MESSAGE, "hello").unwrap();
        let out = source.detach().unwrap().finish().unwrap();
        let out = String::from_utf8(out).unwrap();
        let frame = "id: 1\nevent: message\ndata: hello\n\n";
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains("content-type: text/event-stream; charset=utf-8\r\n"));
        assert!(out.contains("connection: keep-alive\r\n"));
        assert!(out.contains(&format!("{:x}\r\n{}\r\n", frame.len(), frame)));
        assert!(out.ends_with("0\r\n\r\n"));
    }

    #[test]
    fn test_http10_body_is_close_delimited() {
        let res = HttpStreamWriter::for_version(Vec::new(), Version::HTTP_10);
        assert!(!res.is_chunked());
        let source = EventSource::new(res, StatusCode::OK).unwrap();
        source.send(&EventName::MESSAGE, "hello").unwrap();
        let out = source.detach().unwrap().finish().unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(out.contains("content-type: text/event-stream; charset=utf-8\r\n"));
        assert!(out.contains("connection: close\r\n"));
        assert!(!out.contains("transfer-encoding"));
        assert!(out.ends_with("\r\n\r\nid: 1\nevent: message\ndata: hello\n\n"));
    }

    #[test]
    fn test_plain_error() {
        let mut out = Vec::new();
        write_plain_error(&mut out, StatusCode::BAD_REQUEST, "nope").unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "HTTP/1.1 400 Bad Request\r\ncontent-type: text/plain\r\ncontent-length: 4\r\nconnection: close\r\n\r\nnope"
        );
    }
}
