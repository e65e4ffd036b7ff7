use serde::Deserialize;
use studio_core::error::AppError;

use crate::models::{Receipt, ReceiptStatus};

/// Receipts for the history tab, newest first.
pub fn history(receipts: &[Receipt]) -> Vec<Receipt> {
    receipts.iter().rev().cloned().collect()
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
}

impl StatusForm {
    pub fn parse(&self) -> Result<ReceiptStatus, AppError> {
        ReceiptStatus::from_string(&self.status)
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown receipt status '{}'", self.status)))
    }
}
