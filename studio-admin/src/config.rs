use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use studio_core::error::AppError;
use studio_core::supabase::management::DEFAULT_MANAGEMENT_API;
use studio_core::supabase::{ManagementSettings, SupabaseSettings};

/// Everything the maintenance commands may need, read from `SUPABASE_*`
/// variables (and `.env`). Each command checks only the values it uses.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ScriptSettings {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<Secret<String>>,
    #[serde(default)]
    pub project_ref: Option<String>,
    #[serde(default)]
    pub access_token: Option<Secret<String>>,
    /// Overrides the hosted management API, mostly for tests.
    #[serde(default)]
    pub api_url: Option<String>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn missing(names: &str) -> AppError {
    AppError::ConfigError(anyhow::anyhow!("Missing required environment variables: {names}"))
}

impl ScriptSettings {
    pub fn load() -> Result<Self, AppError> {
        studio_core::config::load(None, "SUPABASE")
    }

    /// Project ref and personal access token for the SQL endpoint.
    pub fn management(&self) -> Result<ManagementSettings, AppError> {
        let project_ref = present(self.project_ref.as_deref());
        let access_token = present(self.access_token.as_ref().map(|t| t.expose_secret().as_str()));

        match (project_ref, access_token) {
            (Some(project_ref), Some(access_token)) => Ok(ManagementSettings {
                api_url: present(self.api_url.as_deref())
                    .unwrap_or(DEFAULT_MANAGEMENT_API)
                    .to_string(),
                project_ref: project_ref.to_string(),
                access_token: Secret::new(access_token.to_string()),
            }),
            _ => Err(missing("SUPABASE_PROJECT_REF, SUPABASE_ACCESS_TOKEN")),
        }
    }

    /// Project URL and anon key for table access as the anonymous role.
    pub fn supabase(&self) -> Result<SupabaseSettings, AppError> {
        let url = present(self.url.as_deref());
        let anon_key = present(self.anon_key.as_ref().map(|k| k.expose_secret().as_str()));

        match (url, anon_key) {
            (Some(url), Some(anon_key)) => Ok(SupabaseSettings {
                url: url.to_string(),
                anon_key: Secret::new(anon_key.to_string()),
            }),
            _ => Err(missing("SUPABASE_URL, SUPABASE_ANON_KEY")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn management_needs_ref_and_token() {
        let settings = ScriptSettings {
            project_ref: Some("abcd".to_string()),
            access_token: Some(Secret::new("  ".to_string())),
            ..ScriptSettings::default()
        };

        let err = settings.management().unwrap_err();
        assert!(err.to_string().contains("SUPABASE_PROJECT_REF, SUPABASE_ACCESS_TOKEN"));
    }

    #[test]
    fn management_defaults_to_hosted_api() {
        let settings = ScriptSettings {
            project_ref: Some("abcd".to_string()),
            access_token: Some(Secret::new("sbp_token".to_string())),
            ..ScriptSettings::default()
        };

        let management = settings.management().unwrap();
        assert_eq!(management.api_url, DEFAULT_MANAGEMENT_API);
        assert_eq!(management.project_ref, "abcd");
    }

    #[test]
    fn table_access_needs_url_and_anon_key() {
        let settings = ScriptSettings {
            url: Some("https://abcd.supabase.co".to_string()),
            ..ScriptSettings::default()
        };
        assert!(matches!(settings.supabase(), Err(AppError::ConfigError(_))));
    }
}
