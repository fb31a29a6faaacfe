//! Common test utilities for credit-service integration tests.

use chrono::{DateTime, Utc};
use credit_service::config::{CreditConfig, CreditTermsConfig, DatabaseConfig};
use credit_service::startup::Application;
use retail_core::config::CommonConfig;
use rust_decimal::Decimal;
use secrecy::Secret;
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Once;
use uuid::Uuid;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,credit_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("invalid decimal literal")
}

pub struct TestApp {
    pub address: String,
    pub db: PgPool,
    pub client: reqwest::Client,
    pub tenant_id: Uuid,
}

impl TestApp {
    /// Spawn a test application with a fresh tenant id.
    ///
    /// Returns None (skipping the test) when TEST_DATABASE_URL is not set, so
    /// the suite stays runnable without a provisioned Postgres.
    pub async fn spawn() -> Option<Self> {
        init_tracing();

        let database_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL not set - skipping database-backed test");
                return None;
            }
        };

        let config = CreditConfig {
            common: CommonConfig { port: 0 },
            service_name: "credit-service-test".to_string(),
            log_level: "debug".to_string(),
            otlp_endpoint: None,
            database: DatabaseConfig {
                url: Secret::new(database_url),
                max_connections: 5,
                min_connections: 1,
            },
            credit: CreditTermsConfig { term_days: 30 },
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build application");

        let port = app.port();
        let db = app.db().pool().clone();

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to be ready by polling the health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("http://127.0.0.1:{}/health", port);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Some(TestApp {
            address: format!("http://127.0.0.1:{}", port),
            db,
            client,
            tenant_id: Uuid::new_v4(),
        })
    }

    /// Insert a sale row directly; the checkout flow that creates sales is an
    /// external collaborator, so tests seed fixtures at the table level.
    #[allow(clippy::too_many_arguments)]
    pub async fn seed_sale(
        &self,
        customer_id: Option<Uuid>,
        customer_name: Option<&str>,
        total: Decimal,
        payment_method: &str,
        status: &str,
        created_utc: Option<DateTime<Utc>>,
    ) -> Uuid {
        let sale_id = Uuid::new_v4();
        let credit_status = if payment_method == "store_credit" {
            Some("pending")
        } else {
            None
        };

        sqlx::query(
            r#"
            INSERT INTO sales (
                sale_id, tenant_id, invoice_number, customer_id, customer_name,
                subtotal, total, payment_method, credit_status, status, created_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $6, $7, $8, $9, COALESCE($10, now()))
            "#,
        )
        .bind(sale_id)
        .bind(self.tenant_id)
        .bind(format!("INV-{}", sale_id))
        .bind(customer_id)
        .bind(customer_name)
        .bind(total)
        .bind(payment_method)
        .bind(credit_status)
        .bind(status)
        .bind(created_utc)
        .execute(&self.db)
        .await
        .expect("Failed to seed sale");

        sale_id
    }

    /// Seed a completed store-credit sale.
    pub async fn seed_credit_sale(&self, customer_id: Uuid, total: &str) -> Uuid {
        self.seed_sale(
            Some(customer_id),
            Some("Test Customer"),
            dec(total),
            "store_credit",
            "completed",
            None,
        )
        .await
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("X-Tenant-ID", self.tenant_id.to_string())
            .send()
            .await
            .expect("Request failed")
    }

    /// GET with an arbitrary tenant header (for isolation tests).
    pub async fn get_as_tenant(&self, path: &str, tenant_id: Uuid) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.address, path))
            .header("X-Tenant-ID", tenant_id.to_string())
            .send()
            .await
            .expect("Request failed")
    }

    pub async fn register_payment(
        &self,
        sale_id: Uuid,
        body: serde_json::Value,
    ) -> reqwest::Response {
        self.client
            .post(format!("{}/credits/{}/payments", self.address, sale_id))
            .header("X-Tenant-ID", self.tenant_id.to_string())
            .header("X-User-ID", "test-operator")
            .json(&body)
            .send()
            .await
            .expect("Request failed")
    }
}

/// Parse a Decimal out of a JSON value serialized by rust_decimal (string form).
pub fn json_dec(value: &serde_json::Value) -> Decimal {
    match value {
        serde_json::Value::String(s) => dec(s),
        serde_json::Value::Number(n) => dec(&n.to_string()),
        other => panic!("Expected decimal JSON value, got {:?}", other),
    }
}
