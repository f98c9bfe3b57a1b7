//! `deeplink` reads the links a provider hands to the application.
//!
//! Two kinds exist. A connect link points to the provider configuration used to start a
//! new connection, an action link asks an existing connection to run an action. Links are
//! only consumed here, never produced.
pub mod types;

mod parser;
pub use parser::{parse_action_link, parse_connect_link, parse_link};
