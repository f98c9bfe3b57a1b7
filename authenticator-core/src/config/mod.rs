//! `config` holds the runtime settings of the authenticator engine, loaded from a TOML
//! file through `rstdev-config`
mod client;
pub use client::Client;

mod polling;
pub use polling::Polling;

mod keystore;
pub use keystore::KeyStore;

mod config;
pub use config::Config;

mod parser;
pub use parser::Parser;
