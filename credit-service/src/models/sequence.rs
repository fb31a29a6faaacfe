//! Per-tenant receipt sequence: a monotonic counter row mutated only under a
//! row lock inside the payment-registration transaction.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Default prefix used when a tenant's sequence row is first provisioned.
pub const DEFAULT_RECEIPT_PREFIX: &str = "REC";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReceiptSequence {
    pub tenant_id: Uuid,
    pub prefix: String,
    pub current_number: i64,
}

/// Human-readable receipt number: prefix plus the counter zero-padded
/// to 5 digits.
pub fn format_receipt_number(prefix: &str, number: i64) -> String {
    format!("{}-{:05}", prefix, number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_numbers_are_zero_padded() {
        assert_eq!(format_receipt_number("REC", 1), "REC-00001");
        assert_eq!(format_receipt_number("REC", 42), "REC-00042");
        assert_eq!(format_receipt_number("FIADO", 99999), "FIADO-99999");
    }

    #[test]
    fn receipt_numbers_grow_past_padding() {
        assert_eq!(format_receipt_number("REC", 123456), "REC-123456");
    }
}
