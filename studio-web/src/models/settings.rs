use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Primary key of the single settings row.
pub const SETTINGS_ID: &str = "default_settings";

pub const DEFAULT_THEME: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessSettings {
    pub business_name: String,
    pub tagline: String,
    pub phone: String,
    pub whatsapp_number: String,
    pub email: String,
    pub instagram: String,
    pub address: String,
    pub currency: String,
    pub bank_details: String,
    pub terms_and_conditions: String,
    pub tax_rate: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme_preference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            business_name: "Moonfilmwork".to_string(),
            tagline: "Capturing Moments, Creating Memories".to_string(),
            phone: "+92 300 1234567".to_string(),
            whatsapp_number: "+923001234567".to_string(),
            email: "moonfilmwork@gmail.com".to_string(),
            instagram: "@moonfilmwork".to_string(),
            address: "Studio Address, City, Pakistan".to_string(),
            currency: "Rs. ".to_string(),
            bank_details: "Bank Name: HBL\nAccount No: 1234567890\nIBAN: PK00HABB1234567890".to_string(),
            terms_and_conditions: [
                "• 50% advance payment required for booking",
                "• Balance payment before delivery",
                "• Delivery within 15-30 working days",
                "• All photos/videos are digitally delivered",
            ]
            .join("\n"),
            tax_rate: Decimal::ZERO,
            upi_id: None,
            theme_preference: None,
            dark_mode: None,
        }
    }
}

impl BusinessSettings {
    /// Overlays a fetched row on the defaults. The key columns are dropped and
    /// so are nulls, so a half-migrated row still yields complete settings.
    pub fn merge_remote(row: Value) -> Result<Self, serde_json::Error> {
        let mut merged = serde_json::to_value(Self::default())?;

        if let (Value::Object(base), Value::Object(remote)) = (&mut merged, row) {
            for (column, value) in remote {
                if column == "id" || column == "created_at" || value.is_null() {
                    continue;
                }
                base.insert(column, value);
            }
        }

        serde_json::from_value(merged)
    }

    /// The full row as written to the backend, keyed by the fixed id.
    pub fn to_row(&self) -> Result<Value, serde_json::Error> {
        let mut row = serde_json::to_value(self)?;
        if let Value::Object(columns) = &mut row {
            columns.insert("id".to_string(), Value::String(SETTINGS_ID.to_string()));
        }
        Ok(row)
    }

    /// Digits of the WhatsApp number, as `wa.me` expects them.
    pub fn whatsapp_digits(&self) -> String {
        self.whatsapp_number.chars().filter(char::is_ascii_digit).collect()
    }

    pub fn theme_id(&self) -> &str {
        self.theme_preference.as_deref().unwrap_or(DEFAULT_THEME)
    }

    pub fn is_dark(&self) -> bool {
        self.dark_mode.unwrap_or(false)
    }

    /// `tax_rate` is a percentage.
    pub fn tax_on(&self, subtotal: Decimal) -> Decimal {
        subtotal * self.tax_rate / Decimal::ONE_HUNDRED
    }
}
