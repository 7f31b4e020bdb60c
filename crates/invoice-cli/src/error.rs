use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] invoice_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Not signed in. Run `invoice auth login --identifier <USERNAME_OR_EMAIL> --password <PASSWORD>`.")]
    NotSignedIn,
    #[error("Upload did not complete")]
    UploadFailed,
    #[error("Invoice service unhealthy: {0}")]
    Unhealthy(String),
}

macro_rules! from_core_error {
    ($($error:ty),+ $(,)?) => {
        $(
            impl From<$error> for CliError {
                fn from(error: $error) -> Self {
                    Self::Core(error.into())
                }
            }
        )+
    };
}

from_core_error!(
    invoice_core::api::TransportError,
    invoice_core::auth::AuthError,
    invoice_core::upload::UploadError,
    invoice_core::history::HistoryError,
    invoice_core::config::ConfigError,
    invoice_core::session::SessionStoreError,
);
