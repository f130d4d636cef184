use may::coroutine::{self, JoinHandle};
use may::net::{TcpListener, TcpStream};
use std::io;
use std::net::{SocketAddr, TcpStream as StdTcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

use super::service::{serve_connection, EventStreamHandler};
use crate::runtime_config::RuntimeConfig;

/// Event stream server on the `may` coroutine runtime.
///
/// Every accepted connection runs in its own coroutine, so a handler may
/// block on sends for as long as the stream lives.
pub struct HttpServer<H>(pub H);

/// Handle to a running HTTP server
///
/// Provides methods for waiting until the server is ready, stopping it,
/// or joining the accept coroutine.
pub struct ServerHandle {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ServerHandle {
    /// The bound address, with the real port when bound to port `0`.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the server to be ready to accept connections
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the server doesn't accept within ~250ms (50 attempts × 5ms).
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..50 {
            if StdTcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(Duration::from_millis(5));
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "server not ready"))
    }

    /// Stop accepting connections.
    ///
    /// Streams already being served keep running until their handler returns.
    pub fn stop(self) {
        // SAFETY: cancel() is marked unsafe by the may runtime. The handle is
        // valid because we own it, and cancelling the accept loop is the intent.
        unsafe {
            self.handle.coroutine().cancel();
        }
        if self.handle.join().is_err() {
            // a cancelled coroutine reports its unwind as an error
            tracing::debug!(addr = %self.addr, "accept loop cancelled");
        }
    }

    /// Block until the accept coroutine finishes.
    ///
    /// # Errors
    ///
    /// Returns an error if the accept coroutine panicked.
    pub fn join(self) -> std::thread::Result<()> {
        self.handle.join()
    }
}

impl<H: EventStreamHandler<TcpStream>> HttpServer<H> {
    /// Start the server with the stack size from [`RuntimeConfig::default`].
    pub fn start<A: ToSocketAddrs>(self, addr: A) -> io::Result<ServerHandle> {
        self.start_with_config(addr, &RuntimeConfig::default())
    }

    /// Start the server on the given address
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or the accept
    /// coroutine cannot be spawned.
    pub fn start_with_config<A: ToSocketAddrs>(self, addr: A, config: &RuntimeConfig) -> io::Result<ServerHandle> {
        let listener = TcpListener::bind(addr)?;
        let addr = listener.local_addr()?;
        let handler = Arc::new(self.0);
        let stack_size = config.stack_size;

        // SAFETY: Builder::spawn() is marked unsafe by the may runtime. The
        // closure is Send + 'static and owns everything it touches.
        let handle = unsafe {
            coroutine::Builder::new()
                .name("sse-accept".to_string())
                .stack_size(stack_size)
                .spawn(move || accept_loop(listener, handler, stack_size))
        }?;
        info!(%addr, stack_size, "event stream server listening");
        Ok(ServerHandle { addr, handle })
    }
}

fn accept_loop<H: EventStreamHandler<TcpStream>>(listener: TcpListener, handler: Arc<H>, stack_size: usize) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };
        let handler = Arc::clone(&handler);
        // SAFETY: as above; the connection coroutine owns its stream and handler.
        let spawned = unsafe {
            coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || serve_connection(stream, handler.as_ref()))
        };
        if let Err(e) = spawned {
            warn!(error = %e, "failed to spawn connection coroutine");
        }
    }
}
