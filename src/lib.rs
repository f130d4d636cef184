//! # BRRTRouter SSE
//!
//! Server-Sent Events for coroutine-powered HTTP services: byte-exact
//! `text/event-stream` framing and a per-connection [`EventSource`] that
//! numbers events, serializes concurrent producers and flushes every frame
//! to the network as soon as it is written.
//!
//! ## Overview
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Producer
//!     participant Source as EventSource
//!     participant Encoder as sse::encode
//!     participant Sink as FlushableSink
//!     participant Client
//!
//!     Producer->>Source: send("message", "hello")
//!     Source->>Source: lock, id += 1
//!     Source->>Encoder: encode into scratch buffer
//!     Source->>Sink: write whole frame
//!     Source->>Sink: flush
//!     Sink-->>Client: id: 1 / event: message / data: hello
//!     Source-->>Producer: Ok(1)
//! ```
//!
//! ## Modules
//!
//! - **[`sse`]** - frame encoding, flushable sinks and the event source
//! - **[`server`]** - chunked HTTP/1.1 streaming response and a `may` accept loop
//! - **[`runtime_config`]** - environment-driven stack and buffer sizing
//! - **[`logging`]** - `tracing-subscriber` setup (JSON or pretty)
//! - **[`cli`]** - the `brrtsse` demo server
//!
//! ## Quick Start
//!
//! ```no_run
//! use brrtrouter_sse::server::{HttpServer, HttpStreamWriter, StreamRequest};
//! use brrtrouter_sse::sse::{EventName, EventSource};
//! use http::StatusCode;
//! use may::net::TcpStream;
//!
//! let handle = HttpServer(|_req: StreamRequest, res: HttpStreamWriter<TcpStream>| {
//!     let Ok(source) = EventSource::new(res, StatusCode::OK) else { return };
//!     for i in 0..3 {
//!         if source.send(&EventName::MESSAGE, &format!("tick {i}")).is_err() {
//!             return;
//!         }
//!     }
//!     if let Some(res) = source.detach() {
//!         let _ = res.finish();
//!     }
//! })
//! .start("127.0.0.1:8080")?;
//! handle.join().ok();
//! # Ok::<(), std::io::Error>(())
//! ```
//!
//! ## Runtime Considerations
//!
//! Sends block the calling coroutine (or thread) until the frame is
//! flushed. There is no background queue: network backpressure reaches the
//! producer directly, and a failed send means the client is most likely
//! gone.

pub mod cli;
pub mod logging;
pub mod runtime_config;
pub mod server;
pub mod sse;

pub use sse::{EventName, EventSource, FlushableSink, NamedEvent, SseError};
