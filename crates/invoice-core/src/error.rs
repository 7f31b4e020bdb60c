//! Error types for invoice-core

use thiserror::Error;

use crate::api::TransportError;
use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::history::HistoryError;
use crate::session::SessionStoreError;
use crate::upload::UploadError;

/// Result type alias using invoice-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in invoice-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Client configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Request never completed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Sign-in or sign-up failure
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Upload precondition failure
    #[error(transparent)]
    Upload(#[from] UploadError),

    /// Credential storage failure
    #[error(transparent)]
    Session(#[from] SessionStoreError),

    /// Invoice lookup or deletion failure
    #[error(transparent)]
    History(#[from] HistoryError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
