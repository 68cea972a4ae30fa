use thiserror::Error;

pub type Result<T, E = SunlogError> = std::result::Result<T, E>;

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum SunlogError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("payload decode error: {0}")]
    Decode(String),
    #[error("vision error: {0}")]
    Vision(String),
    #[error("engine error: {0}")]
    Engine(String),
    #[error("session store error: {0}")]
    Store(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
