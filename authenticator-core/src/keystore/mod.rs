//! `keystore` manages the device key material of every connection, addressed by alias.
//!
//! The alias of a connection is its `guid`. A `v1` connection owns an RSA key pair, a `v2`
//! connection owns an additional X25519 key pair under the same alias.
pub mod types;

mod memory;
pub use memory::InMemoryKeyStore;
