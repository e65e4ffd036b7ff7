pub mod admin;
pub mod app;
pub mod auth;
pub mod quote;

use serde::{Deserialize, Serialize};
use studio_core::error::AppError;
use tower_sessions::Session;

use crate::models::theme::find_theme;
use crate::models::BusinessSettings;

const FLASH_KEY: &str = "flash";

/// Page chrome shared by every template.
pub struct Layout {
    pub title: String,
    pub business_name: String,
    pub theme_css: String,
    pub dark: bool,
}

impl Layout {
    pub fn new(title: &str, settings: &BusinessSettings) -> Self {
        let dark = settings.is_dark();
        Self {
            title: format!("{} | {}", title, settings.business_name),
            business_name: settings.business_name.clone(),
            theme_css: find_theme(settings.theme_id()).css_variables(dark),
            dark,
        }
    }
}

/// One-shot notice shown after a redirect.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Flash {
    pub message: String,
    pub error: bool,
}

impl Flash {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error: true,
        }
    }
}

pub async fn set_flash(session: &Session, flash: Flash) -> Result<(), AppError> {
    session
        .insert(FLASH_KEY, flash)
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to store flash message: {e}")))
}

pub async fn take_flash(session: &Session) -> Flash {
    session
        .remove::<Flash>(FLASH_KEY)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}
