use std::io::{self, Read};

use http::header::{HeaderName, HeaderValue};
use http::{HeaderMap, Method, Version};

/// Upper bound on the request line plus headers.
pub const MAX_HEAD_BYTES: usize = 8 * 1024;

/// Most headers accepted on one request.
pub const MAX_HEADERS: usize = 32;

/// The parts of an incoming request an event stream handler looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    pub method: Method,
    /// Request target including any query string
    pub path: String,
    /// `HTTP/1.0` or `HTTP/1.1`
    pub version: Version,
    pub headers: HeaderMap,
}

impl StreamRequest {
    /// The path without its query string.
    pub fn route(&self) -> &str {
        self.path.split_once('?').map_or(self.path.as_str(), |(route, _)| route)
    }
}

/// Read and parse an HTTP/1.x request head from `reader`.
///
/// Reads until `httparse` reports a complete head. Any body bytes that
/// arrived in the same read are ignored; event stream requests carry no body.
///
/// # Errors
///
/// `UnexpectedEof` if the peer closes before the head is complete,
/// `InvalidData` for heads over [`MAX_HEAD_BYTES`] or ones `httparse` rejects.
pub fn parse_request_head<R: Read>(reader: &mut R) -> io::Result<StreamRequest> {
    let mut raw = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    loop {
        match reader.read(&mut chunk) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before request head was complete",
                ))
            }
            Ok(n) => raw.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
        if let Some(req) = parse_head(&raw)? {
            return Ok(req);
        }
        if raw.len() > MAX_HEAD_BYTES {
            return Err(invalid("request head too large"));
        }
    }
}

/// `Ok(None)` while the head is still incomplete.
fn parse_head(raw: &[u8]) -> io::Result<Option<StreamRequest>> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    let len = match req.parse(raw) {
        Ok(httparse::Status::Complete(len)) => len,
        Ok(httparse::Status::Partial) => return Ok(None),
        Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
    };
    if len > MAX_HEAD_BYTES {
        return Err(invalid("request head too large"));
    }

    let (Some(method), Some(path), Some(version)) = (req.method, req.path, req.version) else {
        return Err(invalid("incomplete request line"));
    };
    let method = Method::from_bytes(method.as_bytes()).map_err(|_| invalid("invalid method"))?;
    let version = match version {
        0 => Version::HTTP_10,
        _ => Version::HTTP_11,
    };

    let mut map = HeaderMap::with_capacity(req.headers.len());
    for header in req.headers.iter() {
        let name = HeaderName::from_bytes(header.name.as_bytes()).map_err(|_| invalid("invalid header name"))?;
        let value = HeaderValue::from_bytes(header.value).map_err(|_| invalid("invalid header value"))?;
        map.append(name, value);
    }

    Ok(Some(StreamRequest {
        method,
        path: path.to_string(),
        version,
        headers: map,
    }))
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}
