//! Sale model and the derived credit-status rule.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::payment::CreditPayment;

/// Sale lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Voided,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Voided => "voided",
        }
    }
}

/// Derived state of a credit sale. Always recomputable from
/// `(sum(payments), total)`; never set any other way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditStatus {
    Pending,
    Partial,
    Paid,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Pending => "pending",
            CreditStatus::Partial => "partial",
            CreditStatus::Paid => "paid",
        }
    }

    /// The three-way rule: paid iff paid >= total, partial iff 0 < paid < total,
    /// pending iff paid == 0.
    pub fn derive(paid_amount: Decimal, total: Decimal) -> Self {
        if paid_amount >= total {
            CreditStatus::Paid
        } else if paid_amount > Decimal::ZERO {
            CreditStatus::Partial
        } else {
            CreditStatus::Pending
        }
    }
}

/// Sale row. Created by the checkout flow (external to this service);
/// the ledger only mutates `amount_paid` / `credit_status`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Sale {
    pub sale_id: Uuid,
    pub tenant_id: Uuid,
    pub invoice_number: String,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub payment_method: String,
    pub amount_paid: Decimal,
    pub credit_status: Option<String>,
    pub status: String,
    pub due_date: Option<NaiveDate>,
    pub created_utc: DateTime<Utc>,
}

impl Sale {
    pub fn is_voided(&self) -> bool {
        self.status == SaleStatus::Voided.as_str()
    }

    /// Explicit due date when set, else creation date plus the credit term.
    pub fn effective_due_date(&self, term_days: u32) -> NaiveDate {
        self.due_date
            .unwrap_or_else(|| self.created_utc.date_naive() + chrono::Days::new(term_days as u64))
    }
}

/// Full credit-detail projection: the sale snapshot plus the values derived
/// from the payment log.
#[derive(Debug, Clone, Serialize)]
pub struct CreditDetail {
    pub sale: Sale,
    pub paid_amount: Decimal,
    pub remaining_balance: Decimal,
    pub status: CreditStatus,
    pub due_date: NaiveDate,
    pub is_overdue: bool,
    pub payments: Vec<CreditPayment>,
}

/// Status filter for the pending-credit listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// Pending and partial credits (the default listing).
    #[default]
    Open,
    Pending,
    Partial,
    All,
}

impl StatusFilter {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(StatusFilter::Pending),
            "partial" => Some(StatusFilter::Partial),
            "all" => Some(StatusFilter::All),
            _ => None,
        }
    }

    /// Credit statuses the filter matches against.
    pub fn statuses(&self) -> Vec<&'static str> {
        match self {
            StatusFilter::Open => vec!["pending", "partial"],
            StatusFilter::Pending => vec!["pending"],
            StatusFilter::Partial => vec!["partial"],
            StatusFilter::All => vec!["pending", "partial", "paid"],
        }
    }
}

/// Filter parameters for listing credits.
#[derive(Debug, Clone)]
pub struct CreditFilter {
    pub customer_id: Option<Uuid>,
    pub status: StatusFilter,
    pub page: i64,
    pub limit: i64,
}

/// Format a monetary amount for user-facing messages.
pub fn format_currency(amount: Decimal) -> String {
    format!("${:.2}", amount)
}
