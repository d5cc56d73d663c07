//! Logging setup for host applications.
//!
//! Library code only emits `tracing` events. Native hosts install a `fmt`
//! subscriber with [`init`]; browser builds route events through the `log`
//! facade to the devtools console with [`init_browser`].

use crate::config::StorageConfig;

/// Install a global `fmt` subscriber at the configured level.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init(config: &StorageConfig) -> bool {
    tracing_subscriber::fmt().with_max_level(config.log_level).try_init().is_ok()
}

/// Route `tracing` events to the browser console and install the panic hook.
#[cfg(feature = "hydrate")]
pub fn init_browser(config: &StorageConfig) {
    console_error_panic_hook::set_once();
    let level: log::Level = config.log_level.as_str().parse().unwrap_or(log::Level::Info);
    let _ = console_log::init_with_level(level);
}

#[cfg(test)]
#[path = "logging_test.rs"]
mod tests;
