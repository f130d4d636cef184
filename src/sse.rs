//! # Server-Sent Events (SSE) Module
//!
//! Encodes application events into the `text/event-stream` wire format and
//! pushes them to one connected client, flushing after every frame.
//!
//! ## Architecture
//!
//! - **[`encode`]** - byte-exact frame layout, including multi-line payloads
//! - **[`FlushableSink`]** - writer whose flush either reaches the transport or is a no-op
//! - **[`send_frame`]** - encode, write in full, then flush
//! - **[`EventSource`]** - per-connection id counter and scratch buffer behind one lock
//!
//! ## Usage
//!
//! ```rust
//! use brrtrouter_sse::sse::{EventName, EventSource, MemoryResponse};
//! use http::StatusCode;
//!
//! let res = MemoryResponse::streaming();
//! let source = EventSource::new(res.clone(), StatusCode::OK).unwrap();
//!
//! assert_eq!(source.send(&EventName::MESSAGE, "hello").unwrap(), 1);
//! assert_eq!(res.body_string(), "id: 1\nevent: message\ndata: hello\n\n");
//! ```
//!
//! ## SSE Format
//!
//! ```text
//! id: 2
//! event: error
//! data: line1
//! data: line2
//!
//! ```
//!
//! ## Concurrency
//!
//! An `EventSource` is `Sync` when its writer is `Send`. Share it behind an
//! `Arc` between coroutines or threads; each `send` blocks its caller until
//! the frame is flushed or fails. There is no internal queue. A caller that
//! needs a deadline must abandon the source when it expires.
//!
//! ## Client-Side
//!
//! ```javascript
//! const events = new EventSource('/events');
//! events.addEventListener('tick', (e) => console.log(e.lastEventId, e.data));
//! ```

mod error;
mod event;
mod frame;
mod memory;
mod send;
mod sink;
mod source;

pub use error::SseError;
pub use event::{EventName, NamedEvent};
pub use frame::{encode, frame_id, DEFAULT_FRAME_CAPACITY};
pub use memory::MemoryResponse;
pub use send::send_frame;
pub use sink::{set_headers, FlushSupport, FlushableSink, ResponseWriter, EVENT_STREAM_CONTENT_TYPE};
pub use source::EventSource;
