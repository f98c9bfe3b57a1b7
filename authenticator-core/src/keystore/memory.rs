use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, RwLock};

use x25519_dalek::StaticSecret;

use rst_common::with_logging::log::{debug, info, warn};

use crate::config::KeyStore as KeyStoreConfig;
use crate::crypto::{dh, pem, rsa as rsa_crypto};

use super::types::{DhKeyPair, KeyStoreBuilder, KeyStoreError, RsaKeyPair};

#[derive(Default)]
struct Entries {
    rsa: HashMap<String, Vec<u8>>,
    dh: HashMap<String, Vec<u8>>,
}

/// `InMemoryKeyStore` keeps encoded key material, PKCS#8 DER for RSA and raw 32 bytes
/// for X25519, decoding it again on every read
#[derive(Clone)]
pub struct InMemoryKeyStore {
    rsa_key_bits: usize,
    entries: Arc<RwLock<Entries>>,
}

impl InMemoryKeyStore {
    pub fn new(config: &KeyStoreConfig) -> Self {
        Self {
            rsa_key_bits: config.rsa_key_bits(),
            entries: Arc::new(RwLock::new(Entries::default())),
        }
    }

    fn store_rsa(&self, alias: &str, der: Vec<u8>) -> Result<(), KeyStoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| KeyStoreError::StoreKeyError(err.to_string()))?;

        if entries.rsa.remove(alias).is_some() {
            debug!("[keystore:store_rsa] replaced key for alias: {}", alias);
        }

        entries.rsa.insert(alias.to_string(), der);
        Ok(())
    }

    fn store_dh(&self, alias: &str, raw: Vec<u8>) -> Result<(), KeyStoreError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|err| KeyStoreError::StoreKeyError(err.to_string()))?;

        if entries.dh.remove(alias).is_some() {
            debug!("[keystore:store_dh] replaced key for alias: {}", alias);
        }

        entries.dh.insert(alias.to_string(), raw);
        Ok(())
    }

    fn drop_corrupted(&self, alias: &str) {
        warn!("[keystore] corrupted entry removed for alias: {}", alias);
        self.delete_key(alias)
    }
}

impl KeyStoreBuilder for InMemoryKeyStore {
    fn generate_rsa_key_pair(&self, alias: &str) -> Result<RsaKeyPair, KeyStoreError> {
        if alias.is_empty() {
            return Err(KeyStoreError::InvalidAlias);
        }

        let private_key = rsa_crypto::generate_private_key(self.rsa_key_bits)
            .map_err(|err| KeyStoreError::GenerateKeyError(err.to_string()))?;
        let der = rsa_crypto::private_key_to_der(&private_key)
            .map_err(|err| KeyStoreError::GenerateKeyError(err.to_string()))?;

        self.store_rsa(alias, der)?;
        info!("[keystore:generate_rsa_key_pair] generated for alias: {}", alias);
        Ok(RsaKeyPair::new(private_key))
    }

    fn generate_dh_key_pair(
        &self,
        alias: &str,
        peer_public_key_pem: &str,
    ) -> Result<DhKeyPair, KeyStoreError> {
        if alias.is_empty() {
            return Err(KeyStoreError::InvalidAlias);
        }

        let _ = pem::x25519_public_key_from_pem(peer_public_key_pem)
            .map_err(|err| KeyStoreError::InvalidPeerKey(err.to_string()))?;

        let secret = dh::generate_secret();
        self.store_dh(alias, secret.to_bytes().to_vec())?;

        info!("[keystore:generate_dh_key_pair] generated for alias: {}", alias);
        Ok(DhKeyPair::new(secret))
    }

    fn get_key_pair(&self, alias: &str) -> Option<RsaKeyPair> {
        let der = self.entries.read().ok()?.rsa.get(alias).cloned()?;

        match rsa_crypto::private_key_from_der(&der) {
            Some(private_key) => Some(RsaKeyPair::new(private_key)),
            None => {
                self.drop_corrupted(alias);
                None
            }
        }
    }

    fn get_dh_key_pair(&self, alias: &str) -> Option<DhKeyPair> {
        let raw = self.entries.read().ok()?.dh.get(alias).cloned()?;

        match <[u8; 32]>::try_from(raw.as_slice()) {
            Ok(bytes) => Some(DhKeyPair::new(StaticSecret::from(bytes))),
            Err(_) => {
                self.drop_corrupted(alias);
                None
            }
        }
    }

    fn delete_key(&self, alias: &str) {
        if let Ok(mut entries) = self.entries.write() {
            let rsa = entries.rsa.remove(alias).is_some();
            let dh = entries.dh.remove(alias).is_some();
            if rsa || dh {
                debug!("[keystore:delete_key] removed alias: {}", alias);
            }
        }
    }

    fn delete_keys(&self, aliases: &[String]) {
        aliases.iter().for_each(|alias| self.delete_key(alias))
    }

    fn aliases(&self) -> Vec<String> {
        match self.entries.read() {
            Ok(entries) => entries
                .rsa
                .keys()
                .chain(entries.dh.keys())
                .cloned()
                .collect::<BTreeSet<String>>()
                .into_iter()
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}
