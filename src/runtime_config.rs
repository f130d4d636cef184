//! # Runtime Configuration Module
//!
//! Environment variable-based configuration for the coroutine runtime and
//! the per-connection event sources.
//!
//! ## Environment Variables
//!
//! ### `BRRTR_STACK_SIZE`
//!
//! Stack size for connection coroutines. Decimal (`16384`) or hexadecimal
//! (`0x4000`). Default: `0x10000` (64 KB).
//!
//! ### `BRRTR_SSE_BUFFER_BYTES`
//!
//! Initial capacity of the scratch buffer each
//! [`EventSource`](crate::sse::EventSource) encodes frames into. The buffer
//! grows on demand; this only avoids regrowth for larger typical frames.
//! Default: `1024`.
//!
//! ## Usage
//!
//! ```rust
//! use brrtrouter_sse::runtime_config::RuntimeConfig;
//!
//! let config = RuntimeConfig::from_env();
//! println!("Stack size: {} bytes", config.stack_size);
//! ```

use std::env;

use crate::sse::DEFAULT_FRAME_CAPACITY;

const DEFAULT_STACK_SIZE: usize = 0x10000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes (default: 64 KB / 0x10000)
    pub stack_size: usize,
    /// Initial scratch buffer capacity per event source (default: 1024)
    pub sse_buffer_bytes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            sse_buffer_bytes: DEFAULT_FRAME_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            stack_size: lookup("BRRTR_STACK_SIZE")
                .and_then(|v| parse_size(&v))
                .unwrap_or(defaults.stack_size),
            sse_buffer_bytes: lookup("BRRTR_SSE_BUFFER_BYTES")
                .and_then(|v| parse_size(&v))
                .unwrap_or(defaults.sse_buffer_bytes),
        }
    }
}

/// Parse `16384` or `0x4000`.
fn parse_size(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
