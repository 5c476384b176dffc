//! `tracing` subscriber setup.

use tracing_subscriber::{fmt, EnvFilter};

use crate::types::{GraphError, Result};

/// Installs a global `fmt` subscriber filtered by `filter`.
///
/// `RUST_LOG` takes precedence over `filter` when set. Fails if the directive
/// is invalid or a global subscriber is already installed.
pub fn init_logging(filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => EnvFilter::try_new(filter)
            .map_err(|e| GraphError::Logging(format!("invalid log filter: {e}")))?,
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| GraphError::Logging("logging already initialized".into()))
}

#[cfg(test)]
pub(crate) fn init_test_tracing() {
    use std::sync::Once;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("matrixgraph=trace"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}
