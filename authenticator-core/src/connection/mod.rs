//! `connection` models the link between this device and one provider.
//!
//! A persisted [`Connection`] only holds public data. Before any protocol call it is joined
//! with its live key material from the keystore into a [`RichConnection`].
pub mod types;

mod connection;
pub use connection::Connection;

mod rich;
pub use rich::{build_rich_connection, build_rich_connections, RichConnection};
