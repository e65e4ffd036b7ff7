use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use studio_core::supabase::{ChangeEvent, ChangeHub, ChangeKind, Query, RestClient, SupabaseError};
use tokio::sync::watch;

use super::{mount_with, Mount, Snapshot};
use crate::services::metrics;

/// A row type backed by one table.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: &'static str;

    fn id(&self) -> &str;
}

fn decode_rows<T: DeserializeOwned>(table: &str, rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.get("id").map(Value::to_string).unwrap_or_default();
            match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!(table, id = %id, error = %e, "Skipping unreadable row");
                    None
                }
            }
        })
        .collect()
}

/// Ordered list of every row in `T::TABLE`.
pub struct LiveCollection<T: Record> {
    rest: RestClient,
    hub: ChangeHub,
    state: watch::Sender<Snapshot<Vec<T>>>,
}

impl<T: Record> LiveCollection<T> {
    pub fn new(rest: RestClient, hub: ChangeHub, initial: Vec<T>) -> Arc<Self> {
        let (state, _) = watch::channel(Snapshot {
            data: initial,
            loading: true,
        });
        Arc::new(Self { rest, hub, state })
    }

    pub fn mount(self: &Arc<Self>) -> Mount {
        let store = Arc::clone(self);
        mount_with(&self.hub, T::TABLE, move || {
            let store = Arc::clone(&store);
            async move { store.refresh().await }
        })
    }

    pub fn snapshot(&self) -> Snapshot<Vec<T>> {
        self.state.borrow().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.state.borrow().data.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn len(&self) -> usize {
        self.state.borrow().data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find(&self, id: &str) -> Option<T> {
        self.state.borrow().data.iter().find(|r| r.id() == id).cloned()
    }

    pub fn watch(&self) -> watch::Receiver<Snapshot<Vec<T>>> {
        self.state.subscribe()
    }

    /// Rows that do not decode as `T` are logged and left out.
    pub async fn fetch(&self) -> Result<Vec<T>, SupabaseError> {
        let query = Query::new().select("*").order("created_at", true);
        let rows: Vec<Value> = self.rest.select(T::TABLE, &query, None).await?;
        Ok(decode_rows(T::TABLE, rows))
    }

    /// Replaces the collection with a fresh fetch. Failures keep the previous
    /// rows; `loading` clears either way.
    pub async fn refresh(&self) {
        metrics::record_store_refresh(T::TABLE);
        match self.fetch().await {
            Ok(rows) => {
                tracing::debug!(table = T::TABLE, count = rows.len(), "Store refreshed");
                self.state.send_replace(Snapshot {
                    data: rows,
                    loading: false,
                });
            }
            Err(e) => {
                tracing::error!(table = T::TABLE, error = %e, "Error fetching rows");
                self.state.send_modify(|snapshot| snapshot.loading = false);
            }
        }
    }

    pub async fn add(&self, record: &T, token: Option<&str>) -> Result<(), SupabaseError> {
        let _: Vec<Value> = self.rest.insert(T::TABLE, record, token).await?;
        tracing::info!(table = T::TABLE, id = record.id(), "Row added");
        self.hub.publish(ChangeEvent::new(T::TABLE, ChangeKind::Insert));
        Ok(())
    }

    pub async fn update(&self, record: &T, token: Option<&str>) -> Result<(), SupabaseError> {
        let query = Query::new().eq("id", record.id());
        let _: Vec<Value> = self.rest.update(T::TABLE, &query, record, token).await?;
        tracing::info!(table = T::TABLE, id = record.id(), "Row updated");
        self.hub.publish(ChangeEvent::new(T::TABLE, ChangeKind::Update));
        Ok(())
    }

    /// Deletes remotely, then drops the row locally without waiting for a refetch.
    pub async fn delete(&self, id: &str, token: Option<&str>) -> Result<(), SupabaseError> {
        self.rest.delete(T::TABLE, &Query::new().eq("id", id), token).await?;
        self.state
            .send_modify(|snapshot| snapshot.data.retain(|record| record.id() != id));
        tracing::info!(table = T::TABLE, id, "Row deleted");
        self.hub.publish(ChangeEvent::new(T::TABLE, ChangeKind::Delete));
        Ok(())
    }
}
