use std::fmt;

use rsa::{RsaPrivateKey, RsaPublicKey};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use rst_common::with_errors::thiserror::{self, Error};

#[derive(Debug, PartialEq, Error)]
pub enum KeyStoreError {
    #[error("unable to generate key: {0}")]
    GenerateKeyError(String),

    #[error("invalid peer public key: {0}")]
    InvalidPeerKey(String),

    #[error("unable to store key: {0}")]
    StoreKeyError(String),

    #[error("invalid alias")]
    InvalidAlias,
}

#[derive(Clone)]
pub struct RsaKeyPair {
    pub private_key: RsaPrivateKey,
    pub public_key: RsaPublicKey,
}

impl RsaKeyPair {
    pub fn new(private_key: RsaPrivateKey) -> Self {
        let public_key = private_key.to_public_key();
        Self {
            private_key,
            public_key,
        }
    }
}

impl fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaKeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
pub struct DhKeyPair {
    pub secret: StaticSecret,
    pub public_key: X25519PublicKey,
}

impl DhKeyPair {
    pub fn new(secret: StaticSecret) -> Self {
        let public_key = X25519PublicKey::from(&secret);
        Self { secret, public_key }
    }
}

impl fmt::Debug for DhKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DhKeyPair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

/// `KeyStoreBuilder` is the boundary to the secure storage of the platform
///
/// Implementations must hold these rules:
///
/// - generating under an existing alias removes the previous entry first
/// - `get_*` never fails, missing or unreadable entries give `None` and unreadable
///   entries are removed on the way
/// - private key material never leaves the implementation through logs
pub trait KeyStoreBuilder: Send + Sync {
    fn generate_rsa_key_pair(&self, alias: &str) -> Result<RsaKeyPair, KeyStoreError>;

    /// `generate_dh_key_pair` creates the local X25519 pair for the group of the given peer
    /// key, the peer key is rejected when it is not an X25519 SPKI PEM
    fn generate_dh_key_pair(
        &self,
        alias: &str,
        peer_public_key_pem: &str,
    ) -> Result<DhKeyPair, KeyStoreError>;

    fn get_key_pair(&self, alias: &str) -> Option<RsaKeyPair>;
    fn get_dh_key_pair(&self, alias: &str) -> Option<DhKeyPair>;
    fn delete_key(&self, alias: &str);
    fn delete_keys(&self, aliases: &[String]);
    fn aliases(&self) -> Vec<String>;
}
