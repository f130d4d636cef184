use std::io::{Read, Write};

use http::StatusCode;
use tracing::debug;

use super::request::{parse_request_head, StreamRequest};
use super::response::{write_plain_error, HttpStreamWriter};

/// Handles one event stream request.
///
/// The handler owns the response for the lifetime of the stream; it
/// usually binds an [`EventSource`](crate::sse::EventSource) to it and
/// returns once the stream is done or the client has gone away.
pub trait EventStreamHandler<S: Write + Send>: Send + Sync + 'static {
    fn handle(&self, req: StreamRequest, res: HttpStreamWriter<S>);
}

impl<S, F> EventStreamHandler<S> for F
where
    S: Write + Send,
    F: Fn(StreamRequest, HttpStreamWriter<S>) + Send + Sync + 'static,
{
    fn handle(&self, req: StreamRequest, res: HttpStreamWriter<S>) {
        self(req, res)
    }
}

/// Read the request head from `stream` and pass the connection to `handler`.
///
/// Malformed heads are answered with `400 Bad Request`.
pub fn serve_connection<S, H>(mut stream: S, handler: &H)
where
    S: Read + Write + Send,
    H: EventStreamHandler<S> + ?Sized,
{
    match parse_request_head(&mut stream) {
        Ok(req) => {
            debug!(method = %req.method, path = %req.path, version = ?req.version, "event stream request");
            let version = req.version;
            handler.handle(req, HttpStreamWriter::for_version(stream, version));
        }
        Err(e) => {
            debug!(error = %e, "rejecting request");
            if let Err(e) = write_plain_error(&mut stream, StatusCode::BAD_REQUEST, "malformed request") {
                debug!(error = %e, "failed to write 400 response");
            }
        }
    }
}
