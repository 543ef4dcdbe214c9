//! Tracing and logging (shared setup).

/// Initialize process-wide observability from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&LogConfig::from_env());
}

/// Initialize with an explicit configuration.
pub fn init_with(config: &LogConfig) {
    tracing::init(config);
}

/// Log output configuration.
pub mod config;

/// Tracing subscriber installation (filters, formatting).
pub mod tracing;

pub use config::{LogConfig, LogFormat};
