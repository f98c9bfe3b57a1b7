use std::time::Duration;

use rst_common::standard::serde::{self, Deserialize};

use crate::common::types::{CommonError, ToValidate};

pub const DEFAULT_POLLING_INTERVAL_MILLIS: u64 = 3000;

#[derive(Deserialize, Debug, Clone)]
#[serde(crate = "self::serde")]
pub struct Polling {
    pub(super) interval_millis: u64,
}

impl Polling {
    pub fn new(interval_millis: u64) -> Self {
        Self { interval_millis }
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_millis)
    }
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval_millis: DEFAULT_POLLING_INTERVAL_MILLIS,
        }
    }
}

impl ToValidate for Polling {
    fn validate(&self) -> Result<(), CommonError> {
        if self.interval_millis == 0 {
            return Err(CommonError::ValidationError(
                "config: polling:interval_millis must be positive".to_string(),
            ));
        }

        Ok(())
    }
}
