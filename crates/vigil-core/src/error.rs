use thiserror::Error;

use crate::model::Category;

/// Error type for the domain layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Wire-level failure bubbled up from `vigil-api`.
    #[error(transparent)]
    Api(#[from] vigil_api::Error),

    /// The client has not completed `initialize()`.
    #[error("Client not initialized -- call initialize() first")]
    NotInitialized,

    /// A category payload did not have the expected shape. Contained to
    /// that category; sibling syncs proceed.
    #[error("Malformed {category} payload: {message}")]
    Parse { category: Category, message: String },

    /// The installation directory response did not have the expected shape.
    #[error("Malformed installation directory: {message}")]
    Directory { message: String },
}

impl CoreError {
    /// Returns `true` when the underlying cause is a rejected or expired
    /// session, meaning re-authentication (not retry) is the fix.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth_expired())
    }
}
