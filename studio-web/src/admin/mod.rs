//! Admin dashboard: view models and the mutation flows behind each tab.

pub mod overview;
pub mod receipts;
pub mod services;
pub mod settings_editor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Overview,
    Services,
    Receipts,
    Settings,
    Payments,
    Themes,
}

impl AdminTab {
    pub const ALL: [AdminTab; 6] = [
        AdminTab::Overview,
        AdminTab::Services,
        AdminTab::Receipts,
        AdminTab::Settings,
        AdminTab::Payments,
        AdminTab::Themes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdminTab::Overview => "overview",
            AdminTab::Services => "services",
            AdminTab::Receipts => "receipts",
            AdminTab::Settings => "settings",
            AdminTab::Payments => "payments",
            AdminTab::Themes => "themes",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AdminTab::Overview => "Overview",
            AdminTab::Services => "Services",
            AdminTab::Receipts => "Receipts",
            AdminTab::Settings => "Business",
            AdminTab::Payments => "Payments",
            AdminTab::Themes => "Themes",
        }
    }

    /// Unknown values open the overview.
    pub fn parse(value: Option<&str>) -> Self {
        Self::ALL
            .into_iter()
            .find(|tab| Some(tab.as_str()) == value)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_tabs_and_defaults_to_overview() {
        assert_eq!(AdminTab::parse(Some("receipts")), AdminTab::Receipts);
        assert_eq!(AdminTab::parse(Some("bogus")), AdminTab::Overview);
        assert_eq!(AdminTab::parse(None), AdminTab::Overview);
    }
}
