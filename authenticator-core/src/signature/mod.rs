//! `signature` signs outgoing requests with the device RSA key (SHA256withRSA).
//!
//! A `v1` request is signed over `"{method}|{url}|{expires_at}|{body}"` and the signature
//! travels in the `Signature` header. A `v2` request carries a detached JWS in the
//! `x-jws-signature` header, its body holds the `exp` claim.
use std::time::Duration;

use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use rst_common::standard::chrono::Utc;

mod v1;
pub use v1::{sign_v1, v1_payload, verify_v1};

mod v2;
pub use v2::{sign_v2, verify_v2, JWS_ALGORITHM};

/// `expires_at` is recomputed on every call, a signature is valid for the configured window.
/// Windows beyond the timestamp range saturate.
pub fn expires_at(window: Duration) -> i64 {
    let window = i64::try_from(window.as_secs()).unwrap_or(i64::MAX);
    Utc::now().timestamp().saturating_add(window)
}

fn rsa_sign(message: &[u8], private_key: &RsaPrivateKey) -> Vec<u8> {
    let signing_key = SigningKey::<Sha256>::new(private_key.clone());
    signing_key.sign(message).to_vec()
}

fn rsa_verify(message: &[u8], signature: &[u8], public_key: &RsaPublicKey) -> bool {
    let Ok(signature) = Signature::try_from(signature) else {
        return false;
    };

    let verifying_key = VerifyingKey::<Sha256>::new(public_key.clone());
    verifying_key.verify(message, &signature).is_ok()
}
