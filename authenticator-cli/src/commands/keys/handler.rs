use std::fs;

use rst_common::with_logging::log::{debug, info};
use rst_common::with_tokio::tokio;

use authenticator_core::crypto::pem;
use authenticator_core::keystore::types::KeyStoreBuilder;
use authenticator_core::keystore::InMemoryKeyStore;

use crate::commands::handler::ContextHandler;
use crate::types::CliError;

use super::KeysCommands;

pub(crate) fn generate_rsa(keystore: &InMemoryKeyStore, alias: &str) -> Result<String, CliError> {
    let pair = keystore
        .generate_rsa_key_pair(alias)
        .map_err(|err| CliError::KeyStoreError(err.to_string()))?;

    pem::rsa_public_key_to_pem(&pair.public_key)
        .map_err(|err| CliError::KeyStoreError(err.to_string()))
}

pub(crate) fn generate_dh(
    keystore: &InMemoryKeyStore,
    alias: &str,
    peer_pem: &str,
) -> Result<String, CliError> {
    let pair = keystore
        .generate_dh_key_pair(alias, peer_pem)
        .map_err(|err| CliError::KeyStoreError(err.to_string()))?;

    pem::x25519_public_key_to_pem(&pair.public_key)
        .map_err(|err| CliError::KeyStoreError(err.to_string()))
}

pub async fn handle_commands(ctx: &ContextHandler, commands: KeysCommands) -> Result<(), CliError> {
    debug!("keys command handler triggered...");
    let keystore = InMemoryKeyStore::new(ctx.config().keystore());

    let public_pem = match commands {
        KeysCommands::Rsa(args) => {
            debug!(
                "[keys:rsa] alias: {} | bits: {}",
                args.alias,
                ctx.config().keystore().rsa_key_bits()
            );

            tokio::task::spawn_blocking(move || generate_rsa(&keystore, &args.alias))
                .await
                .map_err(|err| CliError::KeyStoreError(err.to_string()))??
        }
        KeysCommands::Dh(args) => {
            debug!("[keys:dh] alias: {} | peer: {}", args.alias, args.peer);

            let peer_pem =
                fs::read_to_string(&args.peer).map_err(|err| CliError::IoError(err.to_string()))?;
            generate_dh(&keystore, &args.alias, &peer_pem)?
        }
    };

    info!("[keys] key pair generated");
    println!("{}", public_pem);
    Ok(())
}
