//! Worker configuration: a single externally recognized option.

use std::env;

/// `{debug: bool}`. When set, the name of each incoming command is echoed
/// to standard error before execution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Config {
    pub debug: bool,
}

impl Config {
    /// Read configuration from the environment. Unset or unrecognized
    /// values fall back to `debug: false`.
    pub fn from_env() -> Self {
        let debug = env::var("BRIDGE_WORKER_DEBUG")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);
        Self { debug }
    }
}
