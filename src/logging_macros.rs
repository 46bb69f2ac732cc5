#![warn(clippy::all, rust_2018_idioms)]

/// Unified logging macros with file, function, and line context.
/// Messages go to both the `log` facade and `tracing` so they reach the
/// file subscriber regardless of which ecosystem a dependency uses.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        log::debug!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
        tracing::debug!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        log::info!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
        tracing::info!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        log::warn!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
        tracing::warn!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        log::error!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
        tracing::error!("[{}:{}:{}] {}", file!(), module_path!(), line!(), format!($($arg)*));
    };
}

/*
Log level guidelines:

DEBUG: payload shapes, grouping decisions, cache-like internals
INFO: fetch completions, server lifecycle, user-initiated commands
WARN: discarded stale fetches, fallback behaviors, port-in-use fallback
ERROR: rejected payloads, fetch failures that leave the catalog unchanged
*/
