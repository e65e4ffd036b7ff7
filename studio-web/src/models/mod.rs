pub mod money;
pub mod receipt;
pub mod service;
pub mod settings;
pub mod theme;
pub mod user;

pub use receipt::{DiscountType, Receipt, ReceiptItem, ReceiptStatus};
pub use service::{Service, ServiceCategory};
pub use settings::BusinessSettings;

use serde::{Deserialize, Deserializer};

/// Treats an explicit JSON `null` like a missing column.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
