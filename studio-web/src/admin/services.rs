use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use studio_core::error::AppError;
use validator::Validate;

use crate::models::{Service, ServiceCategory};

/// Search box plus category dropdown on the services tab.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServiceFilter {
    pub search: String,
    pub category: Option<ServiceCategory>,
}

impl ServiceFilter {
    /// Case-insensitive match on name or description, then the category.
    pub fn apply(&self, services: &[Service]) -> Vec<Service> {
        let needle = self.search.trim().to_lowercase();
        services
            .iter()
            .filter(|s| {
                needle.is_empty()
                    || s.name.to_lowercase().contains(&needle)
                    || s.description.to_lowercase().contains(&needle)
            })
            .filter(|s| self.category.map_or(true, |c| s.category == c))
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServiceForm {
    #[validate(length(min = 1, message = "Service name is required"))]
    pub name: String,
    pub category: ServiceCategory,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
}

impl ServiceForm {
    /// Trims text fields and checks the name is present and the price positive.
    pub fn validated(mut self) -> Result<Self, AppError> {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.validate()?;
        if self.price <= Decimal::ZERO {
            return Err(AppError::BadRequest(anyhow::anyhow!("Price must be greater than zero")));
        }
        Ok(self)
    }

    /// A new active service keyed by the creation time in milliseconds.
    pub fn into_new_service(self, now: DateTime<Utc>) -> Service {
        Service {
            id: now.timestamp_millis().to_string(),
            name: self.name,
            category: self.category,
            price: self.price,
            description: self.description,
            is_active: true,
        }
    }

    /// Applies the edit; the active flag is not part of the form.
    pub fn apply_to(self, existing: &Service) -> Service {
        Service {
            id: existing.id.clone(),
            name: self.name,
            category: self.category,
            price: self.price,
            description: self.description,
            is_active: existing.is_active,
        }
    }
}

/// Flips only the active flag.
pub fn toggled(service: &Service) -> Service {
    Service {
        is_active: !service.is_active,
        ..service.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::service::{customer_catalog, default_catalog};
    use chrono::TimeZone;

    fn form(name: &str, price: i64) -> ServiceForm {
        ServiceForm {
            name: name.to_string(),
            category: ServiceCategory::Addon,
            price: Decimal::from(price),
            description: " Same-day edit ".to_string(),
        }
    }

    #[test]
    fn search_matches_name_or_description_case_insensitively() {
        let catalog = default_catalog();

        let by_name = ServiceFilter { search: "DRONE".to_string(), category: None }.apply(&catalog);
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "11");

        let by_description = ServiceFilter { search: "usb".to_string(), category: None }.apply(&catalog);
        assert_eq!(by_description[0].name, "USB Drive");
    }

    #[test]
    fn filter_combines_search_and_category() {
        let catalog = default_catalog();
        let filter = ServiceFilter {
            search: "wedding".to_string(),
            category: Some(ServiceCategory::Package),
        };

        let found = filter.apply(&catalog);

        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|s| s.category == ServiceCategory::Package));
        assert_eq!(ServiceFilter::default().apply(&catalog).len(), 20);
    }

    #[test]
    fn rejects_blank_name_and_non_positive_price() {
        assert!(matches!(form("   ", 100).validated(), Err(AppError::ValidationError(_))));
        assert!(matches!(form("Reels", 0).validated(), Err(AppError::BadRequest(_))));
        assert!(form("Reels", 5000).validated().is_ok());
    }

    #[test]
    fn new_service_is_active_with_millisecond_id() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let service = form("Reels", 5000).validated().unwrap().into_new_service(now);

        assert_eq!(service.id, "1717200000000");
        assert_eq!(service.description, "Same-day edit");
        assert!(service.is_active);
    }

    #[test]
    fn toggling_hides_and_restores_without_touching_price() {
        let mut catalog = default_catalog();
        let original = catalog[3].clone();

        catalog[3] = toggled(&original);
        assert!(customer_catalog(&catalog, None).iter().all(|s| s.id != original.id));
        assert_eq!(catalog[3].price, original.price);
        assert_eq!(catalog[3].description, original.description);

        catalog[3] = toggled(&catalog[3]);
        assert_eq!(catalog[3], original);
        assert!(customer_catalog(&catalog, None).iter().any(|s| s.id == original.id));
    }

    #[test]
    fn edit_keeps_active_flag() {
        let mut existing = default_catalog().remove(0);
        existing.is_active = false;

        let edited = form("Wedding Photography (Full)", 55000).apply_to(&existing);

        assert_eq!(edited.id, existing.id);
        assert!(!edited.is_active);
        assert_eq!(edited.price, Decimal::from(55000));
    }
}
