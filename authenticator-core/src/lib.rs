//! `authenticator-core` is the client side engine of a Strong Customer Authentication
//! authenticator.
//!
//! It keeps the device keys of every provider connection, builds signed and encrypted
//! requests for both protocol versions, opens the encrypted envelopes a provider returns
//! and polls pending authorizations. HTTP transport and persistent storage stay outside,
//! behind [`protocol::types::TransportBuilder`] and
//! [`connection::types::ConnectionStoreBuilder`].
pub mod authorization;
pub mod common;
pub mod config;
pub mod connection;
pub mod crypto;
pub mod deeplink;
pub mod errors;
pub mod gate;
pub mod keystore;
pub mod polling;
pub mod protocol;
pub mod signature;
