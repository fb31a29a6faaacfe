use anyhow::Result;
use dotenvy::dotenv;
use retail_core::config::CommonConfig;
use secrecy::Secret;
use serde::Deserialize;
use std::env;

#[derive(Deserialize, Clone, Debug)]
pub struct CreditConfig {
    pub common: CommonConfig,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub database: DatabaseConfig,
    pub credit: CreditTermsConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Deserialize, Clone, Debug)]
pub struct CreditTermsConfig {
    /// Days until a credit sale without an explicit due date falls due.
    pub term_days: u32,
}

impl CreditConfig {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let port = env::var("CREDIT_SERVICE_PORT")
            .unwrap_or_else(|_| "3006".to_string())
            .parse()?;

        let db_url = env::var("CREDIT_DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("CREDIT_DATABASE_URL must be set"))?;
        let max_connections = env::var("CREDIT_DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;
        let min_connections = env::var("CREDIT_DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| "1".to_string())
            .parse()?;

        let term_days = env::var("CREDIT_TERM_DAYS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?;

        let log_level = env::var("CREDIT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let otlp_endpoint = env::var("CREDIT_OTLP_ENDPOINT").ok();

        Ok(Self {
            common: CommonConfig { port },
            service_name: "credit-service".to_string(),
            log_level,
            otlp_endpoint,
            database: DatabaseConfig {
                url: Secret::new(db_url),
                max_connections,
                min_connections,
            },
            credit: CreditTermsConfig { term_days },
        })
    }
}
