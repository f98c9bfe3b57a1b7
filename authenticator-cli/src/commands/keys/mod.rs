use clap::{Args, Subcommand};

mod handler;

pub use handler::handle_commands as keys_handler;

#[derive(Args, Clone)]
pub struct KeysArgs {
    #[command(subcommand)]
    pub commands: KeysCommands,
}

#[derive(Subcommand, Clone)]
#[command(subcommand_help_heading = "Keys")]
pub enum KeysCommands {
    /// Generate a device RSA key pair and print its public key
    Rsa(RsaArgs),

    /// Generate an X25519 key pair against a provider key and print its public key
    Dh(DhArgs),
}

#[derive(Args, Clone)]
pub struct RsaArgs {
    #[arg(long, default_value = "device")]
    pub alias: String,
}

#[derive(Args, Clone)]
pub struct DhArgs {
    #[arg(long, default_value = "device")]
    pub alias: String,

    /// PEM file holding the provider X25519 public key
    #[arg(long, value_name = "FILE", required(true))]
    pub peer: String,
}
