//! Sending a finished quote to the studio over WhatsApp.

use std::fmt::Write;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tokio::task::JoinHandle;

use crate::models::money::format_amount;
use crate::models::{BusinessSettings, Receipt};
use crate::services::metrics;
use crate::stores::ReceiptsStore;

const RULE: &str = "━━━━━━━━━━━━━━━━";

fn display_event_date(event_date: &str) -> String {
    if event_date.trim().is_empty() {
        return "TBD".to_string();
    }
    NaiveDate::parse_from_str(event_date, "%Y-%m-%d")
        .map(|date| date.format("%-m/%-d/%Y").to_string())
        .unwrap_or_else(|_| event_date.to_string())
}

/// The quote-request message the studio receives.
pub fn quote_message(receipt: &Receipt, settings: &BusinessSettings, received_at: DateTime<Utc>) -> String {
    let currency = &settings.currency;
    let email = if receipt.customer_email.trim().is_empty() {
        "Not provided"
    } else {
        receipt.customer_email.as_str()
    };

    let mut message = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(message, "🎬 *NEW QUOTE REQUEST*");
    let _ = writeln!(message, "{RULE}");
    let _ = writeln!(message, "📋 *Quote #{}*", receipt.receipt_number);
    let _ = writeln!(message, "{RULE}");
    let _ = writeln!(message);
    let _ = writeln!(message, "👤 *Customer Details:*");
    let _ = writeln!(message, "• Name: {}", receipt.customer_name);
    let _ = writeln!(message, "• Phone: {}", receipt.customer_phone);
    let _ = writeln!(message, "• Email: {email}");
    let _ = writeln!(message);
    let _ = writeln!(message, "📅 *Event Details:*");
    let _ = writeln!(message, "• Date: {}", display_event_date(&receipt.event_date));
    let _ = writeln!(message, "• Type: {}", receipt.event_type);
    let _ = writeln!(message);
    let _ = writeln!(message, "📦 *Requested Services:*");
    for item in &receipt.items {
        let _ = writeln!(
            message,
            "• {} ({}x) - {}{}",
            item.service_name,
            item.quantity,
            currency,
            format_amount(item.total)
        );
    }
    let _ = writeln!(message);
    let _ = writeln!(message, "{RULE}");
    let _ = writeln!(message, "💰 *QUOTED AMOUNT:* {}{}", currency, format_amount(receipt.total));
    let _ = writeln!(message, "{RULE}");
    if !receipt.notes.trim().is_empty() {
        let _ = writeln!(message);
        let _ = writeln!(message, "📝 *Customer Notes:* {}", receipt.notes);
    }
    let _ = writeln!(message);
    let _ = writeln!(
        message,
        "⏰ *Received:* {}",
        received_at.format("%-m/%-d/%Y, %-I:%M:%S %p")
    );
    let _ = writeln!(message);
    let _ = write!(message, "_Please follow up with the customer to confirm booking._");

    message
}

/// `https://wa.me/<digits>[?text=..]`, or `None` when the number has no digits.
pub fn whatsapp_link(number: &str, message: Option<&str>) -> Option<String> {
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    Some(match message {
        Some(text) => format!("https://wa.me/{}?text={}", digits, urlencoding::encode(text)),
        None => format!("https://wa.me/{digits}"),
    })
}

pub struct Handoff {
    pub receipt: Receipt,
    pub message: String,
    /// Absent when no WhatsApp number is configured.
    pub whatsapp_url: Option<String>,
    /// Resolves to whether the receipt was saved.
    pub persistence: JoinHandle<bool>,
}

/// Prepares the WhatsApp link and saves the receipt in the background. A
/// failed save is only logged; the customer still gets the link.
pub fn hand_off(
    receipts: Arc<ReceiptsStore>,
    receipt: Receipt,
    settings: &BusinessSettings,
    now: DateTime<Utc>,
) -> Handoff {
    let message = quote_message(&receipt, settings, now);
    let whatsapp_url = whatsapp_link(&settings.whatsapp_number, Some(&message));
    if whatsapp_url.is_none() {
        tracing::warn!(receipt = %receipt.receipt_number, "No WhatsApp number configured, skipping link");
    }
    metrics::record_quote_submitted();

    let to_save = receipt.clone();
    let persistence = tokio::spawn(async move {
        match receipts.add(&to_save, None).await {
            Ok(()) => {
                tracing::info!(receipt = %to_save.receipt_number, "Receipt saved");
                true
            }
            Err(e) => {
                metrics::record_persist_failure();
                tracing::warn!(
                    receipt = %to_save.receipt_number,
                    error = %e,
                    "Could not save receipt, quote was still sent"
                );
                false
            }
        }
    });

    Handoff {
        receipt,
        message,
        whatsapp_url,
        persistence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::receipt::ReceiptItem;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn receipt() -> Receipt {
        serde_json::from_value(serde_json::json!({
            "id": "1717236000000",
            "receiptNumber": "MFW0003",
            "customerName": "Sana Khan",
            "customerPhone": "0300 7654321",
            "customerEmail": "",
            "eventDate": "2024-12-14",
            "eventType": "Wedding",
            "items": [],
            "subtotal": 0, "tax": 0, "total": 0, "balanceDue": 0
        }))
        .unwrap()
    }

    #[test]
    fn message_lists_customer_event_and_services() {
        let mut receipt = receipt();
        receipt.items = vec![ReceiptItem {
            service_id: "1".to_string(),
            service_name: "Wedding Photography".to_string(),
            quantity: 2,
            price: Decimal::from(50000),
            total: Decimal::from(100000),
        }];
        receipt.total = Decimal::from(100000);
        let received = Utc.with_ymd_and_hms(2024, 6, 1, 15, 4, 5).unwrap();

        let message = quote_message(&receipt, &BusinessSettings::default(), received);

        assert!(message.starts_with("🎬 *NEW QUOTE REQUEST*"));
        assert!(message.contains("📋 *Quote #MFW0003*"));
        assert!(message.contains("• Email: Not provided"));
        assert!(message.contains("• Date: 12/14/2024"));
        assert!(message.contains("• Wedding Photography (2x) - Rs. 100,000"));
        assert!(message.contains("💰 *QUOTED AMOUNT:* Rs. 100,000"));
        assert!(message.contains("⏰ *Received:* 6/1/2024, 3:04:05 PM"));
        assert!(!message.contains("Customer Notes"));
        assert!(message.ends_with("_Please follow up with the customer to confirm booking._"));
    }

    #[test]
    fn message_includes_notes_and_tbd_date() {
        let mut receipt = receipt();
        receipt.event_date = String::new();
        receipt.notes = "Mehndi night too".to_string();

        let message = quote_message(&receipt, &BusinessSettings::default(), Utc::now());

        assert!(message.contains("• Date: TBD"));
        assert!(message.contains("📝 *Customer Notes:* Mehndi night too"));
    }

    #[test]
    fn link_uses_digits_and_encodes_text() {
        let link = whatsapp_link("+92 300-1234567", Some("Hi & bye")).unwrap();
        assert_eq!(link, "https://wa.me/923001234567?text=Hi%20%26%20bye");

        assert_eq!(whatsapp_link("+92 300", None).unwrap(), "https://wa.me/92300");
        assert!(whatsapp_link("none", Some("hello")).is_none());
    }
}
