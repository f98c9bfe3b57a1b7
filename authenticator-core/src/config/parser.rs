use rstdev_config::format::use_toml;
use rstdev_config::parser::from_file;
use rstdev_config::Builder;

use crate::common::types::{CommonError, ToValidate};

use super::Config;

pub struct Parser {
    conf_file: String,
}

impl Parser {
    pub fn new(conf_file: String) -> Self {
        Self { conf_file }
    }

    /// `parse` loads the TOML file and validates every section before handing it out
    pub fn parse(&self) -> Result<Config, CommonError> {
        let config: Config = Builder::new(from_file(self.conf_file.to_owned()))
            .fetch()
            .map_err(|err| CommonError::ConfigError(err.to_string()))?
            .parse(use_toml)
            .map_err(|err| CommonError::ConfigError(err.to_string()))?;

        config.validate()?;
        Ok(config)
    }
}
