pub mod config;
pub mod deeplink;
pub mod handler;
pub mod keys;

mod output;
