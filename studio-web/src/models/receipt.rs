use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::null_as_default;
use super::service::Service;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    #[default]
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    #[default]
    Pending,
    Partial,
    Paid,
}

impl ReceiptStatus {
    pub const ALL: [ReceiptStatus; 3] = [ReceiptStatus::Pending, ReceiptStatus::Partial, ReceiptStatus::Paid];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Pending => "pending",
            ReceiptStatus::Partial => "partial",
            ReceiptStatus::Paid => "paid",
        }
    }

    pub fn from_string(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(ReceiptStatus::Pending),
            "partial" => Some(ReceiptStatus::Partial),
            "paid" => Some(ReceiptStatus::Paid),
            _ => None,
        }
    }
}

/// A service snapshot inside a receipt; name and price are copied so later
/// catalog edits do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptItem {
    pub service_id: String,
    pub service_name: String,
    pub quantity: u32,
    pub price: Decimal,
    pub total: Decimal,
}

impl ReceiptItem {
    pub fn for_service(service: &Service) -> Self {
        Self {
            service_id: service.id.clone(),
            service_name: service.name.clone(),
            quantity: 1,
            price: service.price,
            total: service.price,
        }
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.total = self.price * Decimal::from(quantity);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub id: String,
    pub receipt_number: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_phone: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub customer_email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub event_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<ReceiptItem>,
    pub subtotal: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub discount_type: DiscountType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tax: Decimal,
    pub total: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: ReceiptStatus,
    #[serde(default, deserialize_with = "null_as_default")]
    pub amount_paid: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub balance_due: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub advance_payment: Decimal,
}

impl Receipt {
    /// Copy with only the status changed; amounts are left as they were.
    pub fn with_status(&self, status: ReceiptStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// `MFW0001` for the first receipt when the prefix is `MFW`.
pub fn receipt_number(prefix: &str, existing_count: usize) -> String {
    format!("{}{:04}", prefix, existing_count + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_are_zero_padded_from_count() {
        assert_eq!(receipt_number("MFW", 0), "MFW0001");
        assert_eq!(receipt_number("MFW", 41), "MFW0042");
        assert_eq!(receipt_number("MFW", 12345), "MFW12346");
    }

    #[test]
    fn quantity_recomputes_line_total() {
        let service = crate::models::service::default_catalog().remove(14);
        let mut item = ReceiptItem::for_service(&service);
        assert_eq!(item.total, Decimal::from(4000));

        item.set_quantity(3);
        assert_eq!(item.total, Decimal::from(12000));
    }

    #[test]
    fn item_count_handles_huge_stored_quantities() {
        let row = json!({
            "id": "1", "receiptNumber": "MFW0001",
            "items": [
                {"serviceId": "1", "serviceName": "A", "price": 1, "quantity": 4294967295u32, "total": 1},
                {"serviceId": "2", "serviceName": "B", "price": 1, "quantity": 4294967295u32, "total": 1}
            ],
            "subtotal": 2, "tax": 0, "total": 2, "balanceDue": 2
        });
        let receipt: Receipt = serde_json::from_value(row).unwrap();

        assert_eq!(receipt.item_count(), 2 * u64::from(u32::MAX));
    }

    #[test]
    fn reads_row_missing_payment_columns() {
        let row = json!({
            "id": "1712345678901",
            "receiptNumber": "TEST002",
            "customerName": "Test Customer",
            "customerPhone": null,
            "items": [],
            "subtotal": 1000,
            "discount": 0,
            "discountType": "fixed",
            "tax": 0,
            "total": 1000,
            "status": "pending",
            "balanceDue": 1000
        });

        let receipt: Receipt = serde_json::from_value(row).unwrap();
        assert_eq!(receipt.amount_paid, Decimal::ZERO);
        assert_eq!(receipt.advance_payment, Decimal::ZERO);
        assert_eq!(receipt.customer_phone, "");
        assert!(receipt.created_at.is_none());
    }

    #[test]
    fn status_change_keeps_amounts() {
        let row = json!({
            "id": "1", "receiptNumber": "MFW0001", "items": [],
            "subtotal": 250, "tax": 25, "total": 275, "balanceDue": 275,
            "createdAt": "2024-06-01T10:00:00.000Z"
        });
        let receipt: Receipt = serde_json::from_value(row).unwrap();

        let paid = receipt.with_status(ReceiptStatus::Paid);
        assert_eq!(paid.status, ReceiptStatus::Paid);
        assert_eq!(paid.total, receipt.total);
        assert_eq!(paid.balance_due, receipt.balance_due);
        assert_eq!(paid.created_at, receipt.created_at);
    }
}
