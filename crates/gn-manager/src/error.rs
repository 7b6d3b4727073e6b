use crate::casting::CastingError;
use crate::config::ConfigError;
use crate::telemetry::TelemetryError;

/// Bootstrap-level error for the service binary: anything that can stop the
/// process from configuring, binding, or serving. Request-level failures are
/// [`crate::casting::CastingError`] and never reach this type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("server error: {0}")]
    Server(#[from] axum::Error),
    #[error("casting error: {0}")]
    Casting(#[from] CastingError),
}
