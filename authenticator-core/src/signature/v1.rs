use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use http::Method;
use rsa::{RsaPrivateKey, RsaPublicKey};

use super::{rsa_sign, rsa_verify};

pub fn v1_payload(method: &Method, url: &str, expires_at: i64, body: &str) -> String {
    format!(
        "{}|{}|{}|{}",
        method.as_str().to_lowercase(),
        url,
        expires_at,
        body
    )
}

pub fn sign_v1(
    method: &Method,
    url: &str,
    expires_at: i64,
    body: &str,
    private_key: &RsaPrivateKey,
) -> String {
    let payload = v1_payload(method, url, expires_at, body);
    STANDARD.encode(rsa_sign(payload.as_bytes(), private_key))
}

pub fn verify_v1(
    method: &Method,
    url: &str,
    expires_at: i64,
    body: &str,
    signature: &str,
    public_key: &RsaPublicKey,
) -> bool {
    let Ok(signature) = STANDARD.decode(signature) else {
        return false;
    };

    let payload = v1_payload(method, url, expires_at, body);
    rsa_verify(payload.as_bytes(), &signature, public_key)
}
