use rst_common::with_logging::log::{debug, info};

use authenticator_core::config::{Config, Parser};

use crate::commands::output::{print_rows, FieldRow};
use crate::types::CliError;

use super::ConfigArgs;

pub(crate) fn config_rows(config: &Config) -> Vec<FieldRow> {
    vec![
        FieldRow::new("client.user_agent", config.client().user_agent()),
        FieldRow::new("client.accept_language", config.client().accept_language()),
        FieldRow::new(
            "client.signature_expiry_secs",
            config.client().signature_window().as_secs(),
        ),
        FieldRow::new(
            "polling.interval_millis",
            config.polling().interval().as_millis(),
        ),
        FieldRow::new("keystore.rsa_key_bits", config.keystore().rsa_key_bits()),
    ]
}

pub fn handle_command(args: ConfigArgs) -> Result<(), CliError> {
    debug!("[config:validate] file: {}", args.file);

    let config = Parser::new(args.file)
        .parse()
        .map_err(|err| CliError::ConfigError(err.to_string()))?;

    info!("[config:validate] config is valid");
    print_rows(config_rows(&config))
}
