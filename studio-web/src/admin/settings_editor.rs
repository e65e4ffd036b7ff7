use rust_decimal::Decimal;
use serde::Deserialize;
use studio_core::supabase::SupabaseError;

use crate::models::BusinessSettings;
use crate::stores::LiveSettings;

/// An editable copy of the settings for one panel. Edits stay local until
/// [`SettingsEditor::save`] pushes the whole object.
#[derive(Debug, Clone)]
pub struct SettingsEditor {
    original: BusinessSettings,
    local: BusinessSettings,
    dirty: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    NoChanges,
}

impl SettingsEditor {
    pub fn new(settings: BusinessSettings) -> Self {
        Self {
            original: settings.clone(),
            local: settings,
            dirty: false,
        }
    }

    pub fn local(&self) -> &BusinessSettings {
        &self.local
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn edit(&mut self, change: impl FnOnce(&mut BusinessSettings)) {
        change(&mut self.local);
        self.dirty = self.local != self.original;
    }

    /// Discards local edits and starts over from `settings`.
    pub fn reset(&mut self, settings: BusinessSettings) {
        *self = Self::new(settings);
    }

    /// Pushes the local copy through the store. On failure the edits and the
    /// dirty flag are kept so the panel can show the error and retry.
    pub async fn save(&mut self, store: &LiveSettings, token: Option<&str>) -> Result<SaveOutcome, SupabaseError> {
        if !self.dirty {
            return Ok(SaveOutcome::NoChanges);
        }
        store.update(self.local.clone(), token).await?;
        self.original = self.local.clone();
        self.dirty = false;
        Ok(SaveOutcome::Saved)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessProfileForm {
    pub business_name: String,
    pub tagline: String,
    pub phone: String,
    pub whatsapp_number: String,
    pub email: String,
    pub instagram: String,
    pub address: String,
    pub currency: String,
}

impl BusinessProfileForm {
    pub fn apply(self, settings: &mut BusinessSettings) {
        settings.business_name = self.business_name;
        settings.tagline = self.tagline;
        settings.phone = self.phone;
        settings.whatsapp_number = self.whatsapp_number;
        settings.email = self.email;
        settings.instagram = self.instagram;
        settings.address = self.address;
        settings.currency = self.currency;
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentForm {
    pub bank_details: String,
    #[serde(default)]
    pub upi_id: String,
    pub tax_rate: Decimal,
    pub terms_and_conditions: String,
}

impl PaymentForm {
    pub fn apply(self, settings: &mut BusinessSettings) {
        settings.bank_details = self.bank_details;
        let upi = self.upi_id.trim();
        settings.upi_id = (!upi.is_empty()).then(|| upi.to_string());
        settings.tax_rate = self.tax_rate;
        settings.terms_and_conditions = self.terms_and_conditions;
    }
}
