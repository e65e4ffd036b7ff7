use std::sync::Arc;

use serde_json::Value;
use studio_core::supabase::{ChangeEvent, ChangeHub, ChangeKind, Query, RestClient, SupabaseError};
use tokio::sync::watch;

use super::{mount_with, Mount, Snapshot};
use crate::models::settings::{BusinessSettings, SETTINGS_ID};
use crate::services::metrics;

pub const TABLE: &str = "settings";

/// The single settings row, seeded with defaults when the table is empty.
pub struct LiveSettings {
    rest: RestClient,
    hub: ChangeHub,
    state: watch::Sender<Snapshot<BusinessSettings>>,
}

impl LiveSettings {
    pub fn new(rest: RestClient, hub: ChangeHub) -> Arc<Self> {
        let (state, _) = watch::channel(Snapshot {
            data: BusinessSettings::default(),
            loading: true,
        });
        Arc::new(Self { rest, hub, state })
    }

    pub fn mount(self: &Arc<Self>) -> Mount {
        let store = Arc::clone(self);
        mount_with(&self.hub, TABLE, move || {
            let store = Arc::clone(&store);
            async move { store.refresh().await }
        })
    }

    pub fn current(&self) -> BusinessSettings {
        self.state.borrow().data.clone()
    }

    pub fn snapshot(&self) -> Snapshot<BusinessSettings> {
        self.state.borrow().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn watch(&self) -> watch::Receiver<Snapshot<BusinessSettings>> {
        self.state.subscribe()
    }

    pub async fn refresh(&self) {
        metrics::record_store_refresh(TABLE);
        let query = Query::new().select("*").eq("id", SETTINGS_ID);

        match self.rest.select_single::<Value>(TABLE, &query, None).await {
            Ok(row) => match BusinessSettings::merge_remote(row) {
                Ok(settings) => {
                    self.state.send_replace(Snapshot {
                        data: settings,
                        loading: false,
                    });
                    return;
                }
                Err(e) => tracing::error!(error = %e, "Error reading settings row"),
            },
            Err(e) if e.is_not_found() => {
                tracing::info!("No settings row yet, seeding defaults");
                if let Err(e) = self.seed_defaults().await {
                    tracing::error!(error = %e, "Error seeding default settings");
                }
            }
            Err(e) => tracing::error!(error = %e, "Error fetching settings"),
        }

        self.state.send_modify(|snapshot| snapshot.loading = false);
    }

    async fn seed_defaults(&self) -> Result<(), SupabaseError> {
        let defaults = BusinessSettings::default();
        self.rest.insert_minimal(TABLE, &defaults.to_row()?, None).await?;
        self.state.send_replace(Snapshot {
            data: defaults,
            loading: false,
        });
        Ok(())
    }

    /// Shows `settings` immediately, then writes the full row. The local copy
    /// stays even when the write fails; the error is returned for display.
    pub async fn update(&self, settings: BusinessSettings, token: Option<&str>) -> Result<(), SupabaseError> {
        let row = settings.to_row()?;
        self.state.send_modify(|snapshot| snapshot.data = settings);

        let query = Query::new().eq("id", SETTINGS_ID);
        match self.rest.update::<_, Value>(TABLE, &query, &row, token).await {
            Ok(_) => {
                tracing::info!("Settings updated");
                self.hub.publish(ChangeEvent::new(TABLE, ChangeKind::Update));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "Error updating settings");
                Err(e)
            }
        }
    }
}
