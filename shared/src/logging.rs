//! Shared logging utilities for consistent tracing across all processes

use crate::types::ProcessId;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Per-process filter directives for the given base level
pub fn filter_directives(process_id: &ProcessId, base_level: &str) -> String {
    match process_id {
        ProcessId::Controller => {
            format!("controller={base_level},shared={base_level},tokio_tungstenite=warn,tungstenite=warn,reqwest=warn")
        }
        ProcessId::Tracker => {
            format!("tracker={base_level},shared={base_level},tower_http=debug,axum={base_level}")
        }
        ProcessId::Embedded => base_level.to_string(),
    }
}

/// Initialize tracing subscriber with an optional log level.
///
/// `RUST_LOG` wins over the computed per-process directives when it is set.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{EnvFilter, fmt};

    let process_id = ProcessId::current();
    let base_level = log_level.unwrap_or("info");
    let directives = filter_directives(process_id, base_level);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    // try_init: a second call (tests, embedding) must not panic
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Initialize tracing subscriber with process-specific configuration
pub fn init_tracing() {
    init_tracing_with_level(None);
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for process-aware info logging
#[macro_export]
macro_rules! process_info {
    ($process_id:expr, $($arg:tt)*) => {
        tracing::info!(
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for process-aware warning logging
#[macro_export]
macro_rules! process_warn {
    ($process_id:expr, $($arg:tt)*) => {
        tracing::warn!(
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for process-aware error logging
#[macro_export]
macro_rules! process_error {
    ($process_id:expr, $($arg:tt)*) => {
        tracing::error!(
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for process-aware debug logging
#[macro_export]
macro_rules! process_debug {
    ($process_id:expr, $($arg:tt)*) => {
        tracing::debug!(
            process = %$process_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(process_id: &ProcessId, details: &str) {
    info!(
        process = %process_id,
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(process_id: &ProcessId, reason: &str) {
    info!(
        process = %process_id,
        timestamp = format_timestamp(),
        "🛑 Shutting down: {}",
        reason
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(process_id: &ProcessId, context: &str, error: &dyn std::fmt::Display) {
    error!(
        process = %process_id,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(process_id: &ProcessId, message: &str) {
    info!(
        process = %process_id,
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives_per_process() {
        let controller = filter_directives(&ProcessId::Controller, "debug");
        let tracker = filter_directives(&ProcessId::Tracker, "warn");

        assert!(controller.starts_with("controller=debug"));
        assert!(controller.contains("tungstenite=warn"));
        assert!(tracker.starts_with("tracker=warn"));
        assert!(tracker.contains("axum=warn"));
    }

    #[test]
    fn test_format_timestamp_shape() {
        let stamp = format_timestamp();
        // HH:MM:SS.mmm
        assert_eq!(stamp.len(), 12);
        assert_eq!(&stamp[2..3], ":");
        assert_eq!(&stamp[8..9], ".");
    }

    #[test]
    fn test_init_tracing_twice_does_not_panic() {
        init_tracing_with_level(Some("debug"));
        init_tracing();
    }
}
