//! # Server Module
//!
//! Minimal HTTP/1.1 transport for event streams: request head parsing, a
//! chunked streaming response that flushes to the socket, and a coroutine
//! per connection accept loop.

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{parse_request_head, StreamRequest, MAX_HEAD_BYTES};
pub use response::{write_plain_error, HttpStreamWriter};
pub use service::{serve_connection, EventStreamHandler};
