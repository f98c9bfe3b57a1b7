use hkdf::Hkdf;
use rand::rngs::OsRng;
use sha2::Sha256;
use x25519_dalek::{PublicKey, StaticSecret};

use super::types::{CryptoError, AES_KEY_LEN};

const SHARED_SECRET_INFO: &[u8] = b"SCA_AUTHENTICATOR_SHARED_SECRET_v1";

pub fn generate_secret() -> StaticSecret {
    StaticSecret::random_from_rng(OsRng)
}

/// `compute_shared_secret` runs X25519 and expands the raw point through HKDF-SHA256 into an
/// AES-256 key. Both sides get the same bytes whichever of them computes it.
pub fn compute_shared_secret(
    local_secret: &StaticSecret,
    remote_public: &PublicKey,
) -> Result<[u8; AES_KEY_LEN], CryptoError> {
    let shared = local_secret.diffie_hellman(remote_public);
    if !shared.was_contributory() {
        return Err(CryptoError::KeyAgreementError(
            "remote public key is a low order point".to_string(),
        ));
    }

    let hkdf = Hkdf::<Sha256>::new(None, shared.as_bytes());
    let mut output = [0u8; AES_KEY_LEN];
    hkdf.expand(SHARED_SECRET_INFO, &mut output)
        .map_err(|err| CryptoError::KeyAgreementError(err.to_string()))?;

    Ok(output)
}
