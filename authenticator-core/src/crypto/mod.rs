//! `crypto` holds the primitives used to protect every payload exchanged with a provider.
//!
//! There are two generations of payload protection:
//!
//! - `v1`, where each message carries its own AES key and IV wrapped with the device RSA key
//! - `v2`, where the AES key is the shared secret agreed through X25519 when the connection
//!   was created, and only a random IV travels with the message
//!
//! Every `decrypt` style function here returns `Option`, a failing step means the item is
//! skipped by the caller, never surfaced as a crash.
pub mod aes;
pub mod dh;
pub mod envelope;
pub mod pem;
pub mod rsa;
pub mod types;

pub use envelope::{EncryptedEnvelope, EncryptedEnvelopeV1, EncryptedEnvelopeV2, EnvelopeContent};
pub use types::{CryptoError, AES_IV_LEN, AES_KEY_LEN, SUPPORTED_ALGORITHM};
