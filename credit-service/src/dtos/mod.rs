//! Request/response DTOs for the HTTP surface.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreditDetail, CustomerBalance, SettlementMethod};

/// Success envelope. Errors use the same shape with `success: false` and an
/// `error` field (see `retail_core::error::AppError`).
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

/// Query parameters for the pending-credit listing.
#[derive(Debug, Deserialize)]
pub struct ListCreditsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub customer_id: Option<Uuid>,
    pub status: Option<String>,
}

/// Query parameters for the customer-balance listing.
#[derive(Debug, Deserialize)]
pub struct ListBalancesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Pagination metadata returned alongside every page.
#[derive(Debug, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: (total + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreditListData {
    pub credits: Vec<CreditDetail>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct CustomerBalanceListData {
    pub customers: Vec<CustomerBalance>,
    pub pagination: Pagination,
}

/// Body for `POST /credits/{sale_id}/payments`.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterPaymentRequest {
    pub amount: Decimal,
    pub payment_method: SettlementMethod,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_rounds_up() {
        let p = Pagination::new(1, 20, 41);
        assert_eq!(p.total_pages, 3);

        let p = Pagination::new(1, 20, 40);
        assert_eq!(p.total_pages, 2);

        let p = Pagination::new(1, 20, 0);
        assert_eq!(p.total_pages, 0);
    }

    #[test]
    fn register_payment_rejects_store_credit_method() {
        let body = serde_json::json!({
            "amount": "50.00",
            "payment_method": "store_credit"
        });
        assert!(serde_json::from_value::<RegisterPaymentRequest>(body).is_err());
    }

    #[test]
    fn register_payment_accepts_settlement_methods() {
        for method in ["cash", "card", "transfer"] {
            let body = serde_json::json!({
                "amount": "50.00",
                "payment_method": method,
                "notes": "first installment"
            });
            let parsed: RegisterPaymentRequest = serde_json::from_value(body).unwrap();
            assert_eq!(parsed.payment_method.as_str(), method);
        }
    }
}
