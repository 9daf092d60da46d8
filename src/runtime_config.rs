//! # Runtime Configuration
//!
//! Settings for the coroutine runtime and the listener, layered as:
//!
//! 1. built-in defaults (`0x4000` byte stacks, `0.0.0.0:9999`);
//! 2. the `[server]` section of the INI file (`stack_size`, `addr`);
//! 3. environment variables `XIA_STACK_SIZE` and `XIA_ADDR`.
//!
//! Stack sizes are accepted in decimal (`16384`) or hexadecimal (`0x4000`).
//! A value that does not parse falls back to the layer below.
//!
//! Stack size bounds memory per request: every connection runs on its own
//! coroutine, so total stack memory is `stack_size * concurrent requests`.
//!
//! ```bash
//! XIA_STACK_SIZE=0x8000 XIA_ADDR=127.0.0.1:8080 xia serve --config app.ini
//! ```

use std::env;
use tracing::{info, warn};

use crate::config::IniConfig;

pub const DEFAULT_STACK_SIZE: usize = 0x4000;
pub const DEFAULT_ADDR: &str = "0.0.0.0:9999";

pub const STACK_SIZE_ENV: &str = "XIA_STACK_SIZE";
pub const ADDR_ENV: &str = "XIA_ADDR";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Stack size for request coroutines in bytes
    pub stack_size: usize,
    /// Listen address
    pub addr: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            addr: DEFAULT_ADDR.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overridden by the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Defaults overridden by the `[server]` section, then the environment.
    #[must_use]
    pub fn from_config(cfg: &IniConfig) -> Self {
        let mut rc = Self::default();
        if let Some(addr) = cfg.get("server", "addr") {
            rc.addr = addr.to_string();
        }
        if let Some(raw) = cfg.get("server", "stack_size") {
            match parse_size(raw) {
                Some(size) => rc.stack_size = size,
                None => warn!(value = %raw, "Ignoring unparseable [server] stack_size"),
            }
        }
        rc.with_env()
    }

    fn with_env(mut self) -> Self {
        if let Ok(raw) = env::var(STACK_SIZE_ENV) {
            match parse_size(&raw) {
                Some(size) => self.stack_size = size,
                None => warn!(value = %raw, env = STACK_SIZE_ENV, "Ignoring unparseable stack size"),
            }
        }
        if let Ok(addr) = env::var(ADDR_ENV) {
            if !addr.trim().is_empty() {
                self.addr = addr.trim().to_string();
            }
        }
        self
    }

    /// Configure the `may` runtime with these settings.
    pub fn apply(&self) {
        may::config().set_stack_size(self.stack_size);
        info!(stack_size = self.stack_size, "Coroutine runtime configured");
    }
}

/// Parse a size in decimal or `0x` hexadecimal.
#[must_use]
pub fn parse_size(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => raw.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("0x4000"), Some(0x4000));
        assert_eq!(parse_size("0X10"), Some(16));
        assert_eq!(parse_size(" 32768 "), Some(32768));
        assert_eq!(parse_size("big"), None);
        assert_eq!(parse_size("0xZZ"), None);
    }

    #[test]
    fn test_from_config_section() {
        let cfg = IniConfig::parse_str("[server]\naddr = 127.0.0.1:1\nstack_size = 0x8000\n").unwrap();
        let rc = RuntimeConfig::from_config(&cfg);
        // Env vars, if a developer has them set, win over the file.
        if env::var(STACK_SIZE_ENV).is_err() {
            assert_eq!(rc.stack_size, 0x8000);
        }
        if env::var(ADDR_ENV).is_err() {
            assert_eq!(rc.addr, "127.0.0.1:1");
        }
    }

    #[test]
    fn test_bad_config_value_keeps_default() {
        let cfg = IniConfig::parse_str("[server]\nstack_size = lots\n").unwrap();
        if env::var(STACK_SIZE_ENV).is_err() {
            assert_eq!(RuntimeConfig::from_config(&cfg).stack_size, DEFAULT_STACK_SIZE);
        }
    }
}
