use rst_common::with_logging::log::debug;

use authenticator_core::config::{Config, Parser};

use crate::types::CliError;

/// `ContextHandler` carries what every command needs, today only the engine settings
pub struct ContextHandler {
    config: Config,
}

impl ContextHandler {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// `from_file` falls back to the default settings when no file is given
    pub fn from_file(config_file: Option<String>) -> Result<Self, CliError> {
        match config_file {
            Some(path) => {
                debug!("[ctx:from_file] loading config: {}", path);
                let config = Parser::new(path)
                    .parse()
                    .map_err(|err| CliError::ConfigError(err.to_string()))?;

                Ok(Self::new(config))
            }
            None => {
                debug!("[ctx:from_file] using default config");
                Ok(Self::new(Config::default()))
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}
