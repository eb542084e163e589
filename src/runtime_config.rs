//! # Runtime Configuration
//!
//! Coroutine runtime settings read from the environment at startup.
//!
//! ## `WEBFINGER_STACK_SIZE`
//!
//! Stack size of the `may` coroutines that serve connections. Accepts
//! decimal (`16384`) or hexadecimal (`0x4000`). Invalid values fall back to
//! the default of `0x4000` (16 KB).
//!
//! A WebFinger request is shallow (parse, one resolver call, JSON encode), so
//! the default is enough unless a custom resolver recurses deeply.
//!
//! ```bash
//! export WEBFINGER_STACK_SIZE=0x8000
//! webfinger-server serve --config webfinger.yaml
//! ```

use std::env;

use tracing::warn;

/// Environment variable holding the coroutine stack size
pub const STACK_SIZE_ENV: &str = "WEBFINGER_STACK_SIZE";

/// Default coroutine stack size (16 KB)
pub const DEFAULT_STACK_SIZE: usize = 0x4000;

/// Runtime configuration loaded from environment variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for coroutines in bytes
    pub stack_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        match env::var(STACK_SIZE_ENV) {
            Ok(val) => Self::from_stack_size_str(&val),
            Err(_) => Self::default(),
        }
    }

    /// Parse a decimal or `0x` hex stack size, falling back to the default
    pub fn from_stack_size_str(val: &str) -> Self {
        let val = val.trim();
        let parsed = match val.strip_prefix("0x").or_else(|| val.strip_prefix("0X")) {
            Some(hex) => usize::from_str_radix(hex, 16).ok(),
            None => val.parse().ok(),
        };
        match parsed {
            Some(stack_size) if stack_size > 0 => Self { stack_size },
            _ => {
                warn!(value = val, env = STACK_SIZE_ENV, "Invalid stack size, using default");
                Self::default()
            }
        }
    }

    /// Apply the settings to the global `may` scheduler
    ///
    /// Must run before the first coroutine is spawned.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
    }
}
