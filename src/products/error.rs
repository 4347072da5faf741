use thiserror::Error;

use crate::repository::RepositoryError;

pub const CREATION_FAILED_MESSAGE: &str = "Could not create product. Please try again later.";

/// Errors surfaced by the catalog operations.
#[derive(Debug, Error)]
pub enum ProductError {
    #[error("{0}")]
    Validation(String),
    #[error("Product with id {id} not found")]
    NotFound { id: i64 },
    /// Store failure during create. The cause is logged, never carried.
    #[error("{}", CREATION_FAILED_MESSAGE)]
    CreationFailed,
    #[error("Product database error: {0}")]
    Persistence(#[from] RepositoryError),
    #[error("Actor communication error: {0}")]
    ActorCommunication(String),
}

impl ProductError {
    pub fn validation(message: impl Into<String>) -> Self {
        ProductError::Validation(message.into())
    }

    /// HTTP-style status code carried to the transport.
    ///
    /// A missing product is reported as 400, matching what existing callers
    /// of the catalog already handle.
    pub fn status(&self) -> u16 {
        match self {
            ProductError::Validation(_) | ProductError::NotFound { .. } => 400,
            ProductError::CreationFailed | ProductError::Persistence(_) => 500,
            ProductError::ActorCommunication(_) => 503,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status())
    }
}
