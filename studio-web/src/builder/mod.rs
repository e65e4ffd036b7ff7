//! The customer's in-progress quote.

pub mod storage;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::receipt::{receipt_number, DiscountType, Receipt, ReceiptItem, ReceiptStatus};
use crate::models::service::Service;
use crate::models::settings::BusinessSettings;

pub const DEFAULT_EVENT_TYPE: &str = "Wedding";
pub const WALK_IN_CUSTOMER: &str = "Walk-in Customer";
/// Largest quantity a single line can hold.
pub const MAX_QUANTITY: u32 = 999;

pub const EVENT_TYPES: [&str; 8] = [
    "Wedding",
    "Pre-Wedding",
    "Birthday",
    "Corporate",
    "Product",
    "Portrait",
    "Maternity",
    "Other",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DraftError {
    #[error("Please add at least one service")]
    EmptyCart,
}

/// Customer and event fields edited together on the quote form.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct DraftDetails {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub event_date: String,
    pub event_type: String,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptDraft {
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub event_date: String,
    pub event_type: String,
    pub selected_items: Vec<ReceiptItem>,
    pub notes: String,
}

impl Default for ReceiptDraft {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            customer_phone: String::new(),
            customer_email: String::new(),
            event_date: String::new(),
            event_type: DEFAULT_EVENT_TYPE.to_string(),
            selected_items: Vec::new(),
            notes: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Discount exists on the receipt but is never applied here; it stays zero.
pub fn compute_totals(items: &[ReceiptItem], settings: &BusinessSettings) -> Totals {
    let subtotal: Decimal = items.iter().map(|item| item.total).sum();
    let discount = Decimal::ZERO;
    let tax = settings.tax_on(subtotal);
    Totals {
        subtotal,
        discount,
        tax,
        total: subtotal - discount + tax,
    }
}

impl ReceiptDraft {
    /// Adds one unit, appending a line the first time a service is picked.
    pub fn add_service(&mut self, service: &Service) {
        match self
            .selected_items
            .iter_mut()
            .find(|item| item.service_id == service.id)
        {
            Some(item) => {
                let quantity = item.quantity.saturating_add(1).min(MAX_QUANTITY);
                item.set_quantity(quantity);
            }
            None => self.selected_items.push(ReceiptItem::for_service(service)),
        }
    }

    /// Sets a line's quantity; zero or less removes the line and anything
    /// above [`MAX_QUANTITY`] is capped.
    pub fn update_quantity(&mut self, service_id: &str, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(service_id);
            return;
        }
        let quantity = u32::try_from(quantity).map_or(MAX_QUANTITY, |q| q.min(MAX_QUANTITY));
        if let Some(item) = self
            .selected_items
            .iter_mut()
            .find(|item| item.service_id == service_id)
        {
            item.set_quantity(quantity);
        }
    }

    pub fn remove_item(&mut self, service_id: &str) {
        self.selected_items.retain(|item| item.service_id != service_id);
    }

    pub fn quantity_of(&self, service_id: &str) -> u32 {
        self.selected_items
            .iter()
            .find(|item| item.service_id == service_id)
            .map_or(0, |item| item.quantity)
    }

    pub fn total(&self) -> Decimal {
        self.selected_items.iter().map(|item| item.total).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.selected_items.is_empty()
    }

    pub fn apply_details(&mut self, details: DraftDetails) {
        self.customer_name = details.customer_name;
        self.customer_phone = details.customer_phone;
        self.customer_email = details.customer_email;
        self.event_date = details.event_date;
        if !details.event_type.is_empty() {
            self.event_type = details.event_type;
        }
        self.notes = details.notes;
    }

    /// Turns the draft into a pending receipt and resets the draft. `existing`
    /// is the number of receipts already on record.
    pub fn submit(
        &mut self,
        settings: &BusinessSettings,
        prefix: &str,
        existing: usize,
        now: DateTime<Utc>,
    ) -> Result<Receipt, DraftError> {
        if self.is_empty() {
            return Err(DraftError::EmptyCart);
        }

        let draft = std::mem::take(self);
        let totals = compute_totals(&draft.selected_items, settings);
        let customer_name = if draft.customer_name.trim().is_empty() {
            WALK_IN_CUSTOMER.to_string()
        } else {
            draft.customer_name
        };

        Ok(Receipt {
            id: now.timestamp_millis().to_string(),
            receipt_number: receipt_number(prefix, existing),
            customer_name,
            customer_phone: draft.customer_phone,
            customer_email: draft.customer_email,
            event_date: draft.event_date,
            event_type: draft.event_type,
            items: draft.selected_items,
            subtotal: totals.subtotal,
            discount: totals.discount,
            discount_type: DiscountType::Fixed,
            tax: totals.tax,
            total: totals.total,
            notes: draft.notes,
            created_at: Some(now),
            status: ReceiptStatus::Pending,
            amount_paid: Decimal::ZERO,
            balance_due: totals.total,
            advance_payment: Decimal::ZERO,
        })
    }
}
