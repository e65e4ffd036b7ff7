use studio_core::error::AppError;
use tower_sessions::Session;

use super::ReceiptDraft;

/// Session key the draft is kept under.
pub const DRAFT_SESSION_KEY: &str = "receiptData";

/// Restores the visitor's draft. A stored value that no longer parses is
/// logged and replaced by an empty draft.
pub async fn load_draft(session: &Session) -> ReceiptDraft {
    match session.get::<ReceiptDraft>(DRAFT_SESSION_KEY).await {
        Ok(Some(draft)) => draft,
        Ok(None) => ReceiptDraft::default(),
        Err(e) => {
            tracing::error!(error = %e, "Error loading saved draft");
            ReceiptDraft::default()
        }
    }
}

pub async fn save_draft(session: &Session, draft: &ReceiptDraft) -> Result<(), AppError> {
    session
        .insert(DRAFT_SESSION_KEY, draft)
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to save draft: {e}")))
}

pub async fn clear_draft(session: &Session) -> Result<(), AppError> {
    session
        .remove::<serde_json::Value>(DRAFT_SESSION_KEY)
        .await
        .map(|_| ())
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to clear draft: {e}")))
}
