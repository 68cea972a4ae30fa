//! Operational helpers: logging setup.

use sunlog_types::{config::OpsConfig, Result, SunlogError};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = build_filter(&config.log_level)?;
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| SunlogError::Ops(format!("tracing init error: {err}")))?;
    Ok(())
}

/// Parses `level`, falling back to `info` when it is not a valid directive.
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| SunlogError::Ops(format!("failed to create log filter: {err}")))
}
