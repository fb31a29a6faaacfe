//! Credit payment model. Payments are append-only: created once inside the
//! registration transaction, never updated or deleted.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How a credit payment was settled. A credit cannot be paid with more
/// credit, so store credit is not representable here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMethod {
    Cash,
    Card,
    Transfer,
}

impl SettlementMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementMethod::Cash => "cash",
            SettlementMethod::Card => "card",
            SettlementMethod::Transfer => "transfer",
        }
    }
}

impl std::fmt::Display for SettlementMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A partial payment against a credit sale.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditPayment {
    pub payment_id: Uuid,
    pub tenant_id: Uuid,
    pub sale_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub amount: Decimal,
    pub payment_method: String,
    pub receipt_number: String,
    pub notes: Option<String>,
    pub received_by: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for registering a payment.
#[derive(Debug, Clone)]
pub struct RegisterPayment {
    pub tenant_id: Uuid,
    pub sale_id: Uuid,
    pub amount: Decimal,
    pub payment_method: SettlementMethod,
    pub notes: Option<String>,
    pub received_by: Option<String>,
}
