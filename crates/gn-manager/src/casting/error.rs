use super::store::StoreError;

/// Error taxonomy of the casting core, mirrored one-to-one onto HTTP statuses
/// by the router: Validation → 400, NotFound → 404, Permission → 403,
/// Database → 500.
#[derive(Debug, thiserror::Error)]
pub enum CastingError {
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("Unauthorized")]
    Permission,
    #[error(transparent)]
    Database(#[from] StoreError),
}

impl CastingError {
    pub fn validation(message: impl Into<String>) -> Self {
        CastingError::Validation(message.into())
    }
}
