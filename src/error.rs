//! Errors reported by lower layers (authentication, request validation)
//! that end up rendered as an HTTP error page.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Credentials were well formed but did not validate.
    #[error("Authentication failed")]
    AuthenticationFailed,

    /// Input from the client could not be understood.
    #[error("{0}")]
    InvalidData(String),

    /// A size or storage limit was hit.
    #[error("{0}")]
    NoSpace(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
