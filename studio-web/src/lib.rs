pub mod admin;
pub mod builder;
pub mod config;
pub mod handlers;
pub mod handoff;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod stores;

use std::sync::Arc;

use studio_core::supabase::{AuthClient, ChangeHub, RestClient};

use config::{Settings, StudioSettings};
use models::service::default_catalog;
use stores::{LiveSettings, ReceiptsStore, ServicesStore};

/// Shared application state: the backend clients and the three live stores.
#[derive(Clone)]
pub struct AppState {
    pub studio: Arc<StudioSettings>,
    pub auth: Arc<AuthClient>,
    pub hub: ChangeHub,
    pub services: Arc<ServicesStore>,
    pub receipts: Arc<ReceiptsStore>,
    pub settings: Arc<LiveSettings>,
}

impl AppState {
    /// Stores start from the built-in catalog and default settings until
    /// their first fetch completes.
    pub fn new(settings: &Settings, hub: ChangeHub) -> Self {
        let rest = RestClient::new(&settings.supabase);
        Self {
            studio: Arc::new(settings.studio.clone()),
            auth: Arc::new(AuthClient::new(&settings.supabase)),
            services: ServicesStore::new(rest.clone(), hub.clone(), default_catalog()),
            receipts: ReceiptsStore::new(rest.clone(), hub.clone(), Vec::new()),
            settings: LiveSettings::new(rest, hub.clone()),
            hub,
        }
    }
}
