use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("deeplink error: {0}")]
    DeeplinkError(String),

    #[error("keystore error: {0}")]
    KeyStoreError(String),

    #[error("io error: {0}")]
    IoError(String),

    #[error("output error: {0}")]
    OutputError(String),
}
