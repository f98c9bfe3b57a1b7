use rst_common::with_errors::thiserror::{self, Error};

pub const SUPPORTED_ALGORITHM: &str = "AES-256-CBC";
pub const AES_KEY_LEN: usize = 32;
pub const AES_IV_LEN: usize = 16;

/// `CryptoError` covers failures of the operations that must report a reason. Decryption
/// paths do not use it, they collapse into `None`
#[derive(Debug, PartialEq, Error)]
pub enum CryptoError {
    #[error("rsa key generation error: {0}")]
    GenerateKeyError(String),

    #[error("rsa encrypt error: {0}")]
    RsaEncryptError(String),

    #[error("aes encrypt error: {0}")]
    AesEncryptError(String),

    #[error("key agreement error: {0}")]
    KeyAgreementError(String),

    #[error("pem error: {0}")]
    PemError(String),

    #[error("encode error: {0}")]
    EncodeError(String),

    #[error("signature error: {0}")]
    SignatureError(String),

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}
