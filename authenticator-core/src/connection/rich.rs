use std::collections::HashMap;
use std::fmt;

use rsa::{RsaPrivateKey, RsaPublicKey};

use rst_common::with_logging::log::{debug, warn};

use crate::crypto::{dh, pem, AES_KEY_LEN};
use crate::keystore::types::KeyStoreBuilder;

use super::Connection;

/// `RichConnection` is a [`Connection`] joined with its live key material. It only exists
/// in memory and cannot be built without the device private key.
#[derive(Clone)]
pub struct RichConnection {
    connection: Connection,
    device_private_key: RsaPrivateKey,
    provider_public_key: Option<RsaPublicKey>,
    shared_secret: Option<[u8; AES_KEY_LEN]>,
}

impl RichConnection {
    pub fn new(
        connection: Connection,
        device_private_key: RsaPrivateKey,
        provider_public_key: Option<RsaPublicKey>,
        shared_secret: Option<[u8; AES_KEY_LEN]>,
    ) -> Self {
        Self {
            connection,
            device_private_key,
            provider_public_key,
            shared_secret,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn device_private_key(&self) -> &RsaPrivateKey {
        &self.device_private_key
    }

    pub fn provider_public_key(&self) -> Option<&RsaPublicKey> {
        self.provider_public_key.as_ref()
    }

    pub fn shared_secret(&self) -> Option<&[u8]> {
        self.shared_secret.as_ref().map(|secret| secret.as_slice())
    }

    pub fn id(&self) -> &str {
        &self.connection.id
    }

    pub fn guid(&self) -> &str {
        &self.connection.guid
    }
}

impl fmt::Debug for RichConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RichConnection")
            .field("connection", &self.connection)
            .field("has_provider_public_key", &self.provider_public_key.is_some())
            .field("has_shared_secret", &self.shared_secret.is_some())
            .finish_non_exhaustive()
    }
}

/// `build_rich_connection` gives `None` when any mandatory key material is missing. A `v2`
/// connection needs its DH pair and the provider DH key to derive the shared secret.
pub fn build_rich_connection<TKeyStore>(
    connection: &Connection,
    keystore: &TKeyStore,
) -> Option<RichConnection>
where
    TKeyStore: KeyStoreBuilder + ?Sized,
{
    let key_pair = keystore.get_key_pair(&connection.guid)?;

    let provider_public_key = if connection.provider_rsa_public_key_pem.is_empty() {
        None
    } else {
        pem::rsa_public_key_from_pem(&connection.provider_rsa_public_key_pem)
            .map_err(|err| {
                debug!(
                    "[connection:build_rich] provider key unreadable for {}: {}",
                    connection.guid, err
                )
            })
            .ok()
    };

    let shared_secret = if connection.is_v2() {
        let dh_pair = keystore.get_dh_key_pair(&connection.guid)?;
        let provider_dh_pem = connection.provider_dh_public_key_pem.as_deref()?;
        let provider_dh_key = pem::x25519_public_key_from_pem(provider_dh_pem).ok()?;

        Some(dh::compute_shared_secret(&dh_pair.secret, &provider_dh_key).ok()?)
    } else {
        None
    };

    Some(RichConnection::new(
        connection.clone(),
        key_pair.private_key,
        provider_public_key,
        shared_secret,
    ))
}

/// `build_rich_connections` is best effort, connections that fail to build are left out
/// so a single broken record never blocks the others. The map is keyed by connection id.
pub fn build_rich_connections<TKeyStore>(
    connections: &[Connection],
    keystore: &TKeyStore,
) -> HashMap<String, RichConnection>
where
    TKeyStore: KeyStoreBuilder + ?Sized,
{
    connections
        .iter()
        .filter_map(|connection| {
            let rich = build_rich_connection(connection, keystore);
            if rich.is_none() {
                warn!(
                    "[connection:build_rich_connections] skipped connection: {}",
                    connection.guid
                );
            }

            rich.map(|rich| (connection.id.clone(), rich))
        })
        .collect()
}
