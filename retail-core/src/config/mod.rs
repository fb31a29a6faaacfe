//! Configuration shared by every retail platform service.
//!
//! Each service layers its own env-driven settings on top of this (see the
//! service's `config` module); only the pieces all services carry live here.

use crate::error::AppError;
use serde::Deserialize;

/// Settings common to all retail services.
#[derive(Debug, Deserialize, Clone)]
pub struct CommonConfig {
    /// HTTP listen port. Port 0 binds an ephemeral port, which the test
    /// harness relies on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl CommonConfig {
    /// Load from an optional `configuration` file overlaid with
    /// `RETAIL__`-prefixed environment variables.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("RETAIL").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
