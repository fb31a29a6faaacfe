//! Customer exposure aggregate. Entirely derived from the sale and payment
//! tables; nothing here is stored on the customer record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// `total_credit` sums the totals of completed store-credit sales,
/// `total_paid` sums all payments, `balance` is the difference.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomerBalance {
    pub customer_id: Uuid,
    pub customer_name: Option<String>,
    pub total_credit: Decimal,
    pub total_paid: Decimal,
    pub balance: Decimal,
}

impl CustomerBalance {
    /// Zero exposure for a customer with no credit activity.
    pub fn zero(customer_id: Uuid) -> Self {
        Self {
            customer_id,
            customer_name: None,
            total_credit: Decimal::ZERO,
            total_paid: Decimal::ZERO,
            balance: Decimal::ZERO,
        }
    }
}

/// Platform-wide credit exposure for one tenant.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CreditSummary {
    pub total_pending: Decimal,
    pub total_credits: i64,
    pub customers_with_debt: i64,
}
