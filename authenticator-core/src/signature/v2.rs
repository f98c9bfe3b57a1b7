use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use jsonwebtoken::{crypto, Algorithm, DecodingKey, EncodingKey, Header};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};

use rst_common::standard::serde_json;

use crate::crypto::CryptoError;

pub const JWS_ALGORITHM: Algorithm = Algorithm::RS256;

fn encoded_header() -> Result<String, CryptoError> {
    let header = serde_json::to_vec(&Header::new(JWS_ALGORITHM))
        .map_err(|err| CryptoError::SignatureError(err.to_string()))?;

    Ok(URL_SAFE_NO_PAD.encode(header))
}

fn signing_input(header: &str, body: &str) -> String {
    format!("{}.{}", header, URL_SAFE_NO_PAD.encode(body))
}

/// `sign_v2` returns a compact JWS with a detached payload, `header..signature`. The body
/// is signed byte for byte as it is sent.
pub fn sign_v2(body: &str, private_key: &RsaPrivateKey) -> Result<String, CryptoError> {
    let der = private_key
        .to_pkcs1_der()
        .map_err(|err| CryptoError::SignatureError(err.to_string()))?;

    let header = encoded_header()?;
    let signature = crypto::sign(
        signing_input(&header, body).as_bytes(),
        &EncodingKey::from_rsa_der(der.as_bytes()),
        JWS_ALGORITHM,
    )
    .map_err(|err| CryptoError::SignatureError(err.to_string()))?;

    Ok(format!("{}..{}", header, signature))
}

pub fn verify_v2(jws: &str, body: &str, public_key: &RsaPublicKey) -> bool {
    let Some((header, signature)) = jws.split_once("..") else {
        return false;
    };

    let Ok(decoded) = jsonwebtoken::decode_header(jws) else {
        return false;
    };

    if decoded.alg != JWS_ALGORITHM {
        return false;
    }

    let Ok(der) = public_key.to_pkcs1_der() else {
        return false;
    };

    crypto::verify(
        signature,
        signing_input(header, body).as_bytes(),
        &DecodingKey::from_rsa_der(der.as_bytes()),
        JWS_ALGORITHM,
    )
    .unwrap_or(false)
}
