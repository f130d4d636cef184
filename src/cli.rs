//! # CLI Module
//!
//! Command-line interface for the `brrtsse` demo binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Serve a ticking event stream on every path:
//!
//! ```bash
//! brrtsse serve --addr 127.0.0.1:8080 --count 5 --interval-ms 500
//! curl -N http://127.0.0.1:8080/events
//! ```
//!
//! Each client receives `count` `tick` events carrying `{"seq":n}`, then a
//! `message` event with data `done`, after which the response ends.

use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use http::StatusCode;
use may::net::TcpStream;
use serde::Serialize;
use tracing::{debug, info};

use crate::runtime_config::RuntimeConfig;
use crate::server::{HttpServer, HttpStreamWriter, StreamRequest};
use crate::sse::{EventName, EventSource, NamedEvent, SseError};

#[derive(Parser)]
#[command(name = "brrtsse")]
#[command(about = "BRRTRouter SSE demo server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve a ticking event stream on every path
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "127.0.0.1:8080", env = "BRRTR_SSE_ADDR")]
        addr: String,

        /// Number of tick events per client
        #[arg(short, long, default_value_t = 10)]
        count: u32,

        /// Delay between ticks in milliseconds
        #[arg(long, default_value_t = 1000)]
        interval_ms: u64,
    },
}

const TICK: EventName = EventName::from_static("tick");

/// Payload of the demo `tick` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tick {
    pub seq: u32,
}

impl NamedEvent for Tick {
    fn event_name(&self) -> EventName {
        TICK
    }
}

/// How the demo stream is paced.
#[derive(Debug, Clone, Copy)]
pub struct TickSchedule {
    pub count: u32,
    pub interval: Duration,
    pub buffer_bytes: usize,
}

/// Stream `schedule.count` ticks and a final `done` message to `res`.
///
/// Returns the id of the last event. Stops at the first failed send, which
/// normally means the client went away.
pub fn stream_ticks<S: Write + Send>(res: HttpStreamWriter<S>, schedule: TickSchedule) -> Result<i64, SseError> {
    let source = EventSource::with_capacity(res, StatusCode::OK, schedule.buffer_bytes)?;
    let result = send_ticks(&source, schedule);
    if let Some(res) = source.detach() {
        if let Err(e) = res.finish() {
            debug!(error = %e, "failed to terminate event stream");
        }
    }
    result
}

fn send_ticks<W: Write>(source: &EventSource<W>, schedule: TickSchedule) -> Result<i64, SseError> {
    for seq in 0..schedule.count {
        if seq > 0 {
            may::coroutine::sleep(schedule.interval);
        }
        source.send_named(&Tick { seq })?;
    }
    source.send(&EventName::MESSAGE, "done")
}

/// Run the parsed command. Blocks while the server runs.
pub fn run_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Serve {
            addr,
            count,
            interval_ms,
        } => {
            let config = RuntimeConfig::from_env();
            may::config().set_stack_size(config.stack_size);
            let schedule = TickSchedule {
                count,
                interval: Duration::from_millis(interval_ms),
                buffer_bytes: config.sse_buffer_bytes,
            };

            let handler = move |req: StreamRequest, res: HttpStreamWriter<TcpStream>| {
                let path = req.path.clone();
                match stream_ticks(res, schedule) {
                    Ok(last_id) => info!(%path, last_id, "event stream complete"),
                    Err(e) => info!(%path, last_id = ?e.id(), error = %e, "event stream ended early"),
                }
            };
            let handle = HttpServer(handler)
                .start_with_config(addr.as_str(), &config)
                .with_context(|| format!("Failed to start server on {addr}"))?;
            info!(addr = %handle.addr(), count, interval_ms, "serving tick stream");
            handle.join().map_err(|_| anyhow!("accept loop panicked"))
        }
    }
}
