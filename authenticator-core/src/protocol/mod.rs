//! `protocol` is the client side of the provider API.
//!
//! [`ProtocolClient`] turns a [`crate::connection::RichConnection`] and the verb parameters
//! into signed requests, hands them to a [`types::TransportBuilder`] and turns the answers
//! back into decrypted items or an [`crate::errors::ApiError`].
pub mod endpoint;
pub mod types;
pub mod wire;

mod authorizations;
mod client;
mod connections;
mod consents;

pub use client::ProtocolClient;

#[cfg(test)]
pub(crate) mod fixtures;

