//! Live views of the backend tables.
//!
//! A store holds the latest snapshot of its table in a `watch` channel.
//! Mounting it fetches once and then refetches the whole table whenever the
//! [`ChangeHub`] reports a change to that table. Dropping the returned
//! [`Mount`] stops listening.

pub mod collection;
pub mod settings;

use std::future::Future;

use studio_core::supabase::ChangeHub;
use tokio::task::JoinHandle;

use crate::models::{Receipt, Service};

pub use collection::{LiveCollection, Record};
pub use settings::LiveSettings;

pub type ServicesStore = LiveCollection<Service>;
pub type ReceiptsStore = LiveCollection<Receipt>;

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<T> {
    pub data: T,
    /// True until the first fetch attempt finishes, successful or not.
    pub loading: bool,
}

/// Handle to a mounted store's refresh task.
#[must_use = "dropping the mount unsubscribes the store"]
pub struct Mount {
    table: &'static str,
    handle: JoinHandle<()>,
}

impl Mount {
    pub fn table(&self) -> &'static str {
        self.table
    }
}

impl Drop for Mount {
    fn drop(&mut self) {
        tracing::debug!(table = self.table, "Unmounting store");
        self.handle.abort();
    }
}

/// Subscribes before the initial fetch so no change can slip between the two.
pub(crate) fn mount_with<F, Fut>(hub: &ChangeHub, table: &'static str, refresh: F) -> Mount
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut subscription = hub.subscribe(table);
    let handle = tokio::spawn(async move {
        refresh().await;
        while let Some(event) = subscription.recv().await {
            tracing::debug!(table, kind = ?event.kind, "Change received, refetching");
            refresh().await;
        }
    });

    Mount { table, handle }
}

impl Record for Service {
    const TABLE: &'static str = "services";

    fn id(&self) -> &str {
        &self.id
    }
}

impl Record for Receipt {
    const TABLE: &'static str = "receipts";

    fn id(&self) -> &str {
        &self.id
    }
}
