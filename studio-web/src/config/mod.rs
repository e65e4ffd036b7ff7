use std::path::PathBuf;

use serde::Deserialize;
use studio_core::config::TelemetrySettings;
use studio_core::error::AppError;
use studio_core::supabase::SupabaseSettings;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    #[serde(default)]
    pub studio: StudioSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure`; enable behind HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Deserialize, Clone, Debug)]
pub struct StudioSettings {
    #[serde(default = "default_receipt_prefix")]
    pub receipt_prefix: String,
    /// Listen to the hosted realtime feed in addition to local change echoes.
    #[serde(default = "default_realtime")]
    pub realtime: bool,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
}

impl ServerSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            receipt_prefix: default_receipt_prefix(),
            realtime: default_realtime(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
        }
    }
}

fn default_receipt_prefix() -> String {
    "MFW".to_string()
}

fn default_realtime() -> bool {
    true
}

fn default_reconnect_delay_secs() -> u64 {
    5
}

fn configuration_file() -> Result<PathBuf, AppError> {
    let base_path = std::env::current_dir()?;

    // Run from the workspace root or from inside the crate.
    let configuration_directory = if base_path.ends_with("studio-web") {
        base_path.join("config")
    } else {
        base_path.join("studio-web").join("config")
    };

    Ok(configuration_directory.join("base.yaml"))
}

pub fn get_configuration() -> Result<Settings, AppError> {
    let path = configuration_file()?;
    let settings: Settings = studio_core::config::load(Some(&path), "APP")?;
    settings.validate()?;
    Ok(settings)
}

impl Settings {
    fn validate(&self) -> Result<(), AppError> {
        use secrecy::ExposeSecret;

        if self.supabase.url.trim().is_empty() || self.supabase.anon_key.expose_secret().trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "Missing backend url or anon key (APP_SUPABASE__URL, APP_SUPABASE__ANON_KEY)"
            )));
        }
        Ok(())
    }
}
