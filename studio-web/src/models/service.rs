use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::null_as_default;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Photography,
    Videography,
    Package,
    Addon,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 4] = [
        ServiceCategory::Photography,
        ServiceCategory::Videography,
        ServiceCategory::Package,
        ServiceCategory::Addon,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Photography => "photography",
            ServiceCategory::Videography => "videography",
            ServiceCategory::Package => "package",
            ServiceCategory::Addon => "addon",
        }
    }

    pub fn from_string(value: &str) -> Option<Self> {
        match value {
            "photography" => Some(ServiceCategory::Photography),
            "videography" => Some(ServiceCategory::Videography),
            "package" => Some(ServiceCategory::Package),
            "addon" => Some(ServiceCategory::Addon),
            _ => None,
        }
    }

    /// Short tab label shown on the customer page.
    pub fn label(&self) -> &'static str {
        match self {
            ServiceCategory::Photography => "Photo",
            ServiceCategory::Videography => "Video",
            ServiceCategory::Package => "Packages",
            ServiceCategory::Addon => "Add-ons",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            ServiceCategory::Photography => "📷",
            ServiceCategory::Videography => "🎬",
            ServiceCategory::Package => "📦",
            ServiceCategory::Addon => "➕",
        }
    }
}

/// Parses a `?category=` value; `all`, empty or unknown values mean no filter.
pub fn category_filter(value: Option<&str>) -> Option<ServiceCategory> {
    value.and_then(ServiceCategory::from_string)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    pub name: String,
    pub category: ServiceCategory,
    pub price: Decimal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Service {
    fn stock(id: &str, name: &str, category: ServiceCategory, price: i64, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            price: Decimal::from(price),
            description: description.to_string(),
            is_active: true,
        }
    }
}

/// The active services the customer may pick from, optionally one category.
pub fn customer_catalog(services: &[Service], category: Option<ServiceCategory>) -> Vec<Service> {
    services
        .iter()
        .filter(|s| s.is_active)
        .filter(|s| category.map_or(true, |c| s.category == c))
        .cloned()
        .collect()
}

/// Stock catalog shown until the first fetch from the backend completes.
pub fn default_catalog() -> Vec<Service> {
    use ServiceCategory::*;

    vec![
        Service::stock("1", "Wedding Photography", Photography, 50000, "Full day wedding coverage"),
        Service::stock("2", "Pre-Wedding Shoot", Photography, 30000, "Pre-wedding couple photoshoot"),
        Service::stock("3", "Portrait Session", Photography, 10000, "1-2 hour portrait session"),
        Service::stock("4", "Product Photography", Photography, 6000, "Per product (5 photos)"),
        Service::stock("5", "Event Photography", Photography, 20000, "Corporate/Private events"),
        Service::stock("6", "Maternity Shoot", Photography, 15000, "Maternity photoshoot session"),
        Service::stock("7", "Wedding Film", Videography, 70000, "Full wedding day coverage"),
        Service::stock("8", "Cinematic Trailer", Videography, 30000, "3-5 min highlight video"),
        Service::stock("9", "Event Videography", Videography, 40000, "Full event coverage"),
        Service::stock("10", "Commercial Video", Videography, 50000, "Brand/Product commercial"),
        Service::stock("11", "Drone Coverage", Videography, 15000, "Aerial videography addon"),
        Service::stock("12", "Wedding Complete Package", Package, 110000, "Photo + Video + Album"),
        Service::stock("13", "Pre-Wedding Package", Package, 50000, "Photo + Video + Prints"),
        Service::stock("14", "Event Complete Package", Package, 55000, "Photo + Video coverage"),
        Service::stock("15", "Extra Hour", Addon, 4000, "Additional coverage hour"),
        Service::stock("16", "Photo Album", Addon, 10000, "20 page premium album"),
        Service::stock("17", "USB Drive", Addon, 3000, "All files on USB"),
        Service::stock("18", "Express Delivery", Addon, 6000, "48 hour turnaround"),
        Service::stock("19", "Extra Photographer", Addon, 10000, "Additional photographer"),
        Service::stock("20", "Printed Photos (10)", Addon, 2000, "10 printed photos 8x10"),
    ]
}
