//! Byte-exact SSE frame encoding.
//!
//! ```text
//! id: <id>
//! event: <name>
//! data: <line 1>
//! data: <line k>
//!
//! ```
//!
//! The payload is split on `\n` and every segment gets its own `data:`
//! prefix. A single trailing empty segment (payload ending in `\n`) is
//! dropped, and an empty payload produces no `data:` line at all.

use std::io::{self, Write};

/// Initial scratch capacity; fits a typical small frame without regrowth.
pub const DEFAULT_FRAME_CAPACITY: usize = 1024;

/// Ids must be positive. Anything below `1` is emitted as `1`.
pub fn frame_id(id: i64) -> i64 {
    id.max(1)
}

/// Append one complete frame to `buf`. Existing contents are kept.
pub fn encode<B: Write + ?Sized>(buf: &mut B, id: i64, event: &str, payload: &str) -> io::Result<()> {
    writeln!(buf, "id: {}", frame_id(id))?;
    writeln!(buf, "event: {event}")?;
    if !payload.is_empty() {
        let body = payload.strip_suffix('\n').unwrap_or(payload);
        for line in body.split('\n') {
            buf.write_all(b"data: ")?;
            buf.write_all(line.as_bytes())?;
            buf.write_all(b"\n")?;
        }
    }
    buf.write_all(b"\n")
}
