//! Change notifications.
//!
//! [`ChangeHub`] is the in-process fan-out every store subscribes to. A
//! [`RealtimeListener`] feeds it from the hosted realtime websocket, which
//! speaks the Phoenix channel protocol: one `phx_join` per table with a
//! `postgres_changes` filter, a heartbeat on the `phoenix` topic, and
//! `postgres_changes` frames whenever a row changes.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{SupabaseError, SupabaseSettings};

const PROTOCOL_VERSION: &str = "1.0.0";
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const RECONNECT_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
    /// Missed or unrecognised events; subscribers should refetch.
    Unknown,
}

impl ChangeKind {
    fn from_wire(value: &str) -> Self {
        match value {
            "INSERT" => ChangeKind::Insert,
            "UPDATE" => ChangeKind::Update,
            "DELETE" => ChangeKind::Delete,
            _ => ChangeKind::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: String,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(table: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            table: table.into(),
            kind,
        }
    }
}

#[derive(Clone)]
pub struct ChangeHub {
    sender: broadcast::Sender<ChangeEvent>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ChangeHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: ChangeEvent) {
        tracing::debug!(table = %event.table, kind = ?event.kind, "Publishing change");
        // No subscribers is fine: nothing is mounted yet.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self, table: impl Into<String>) -> TableSubscription {
        TableSubscription {
            table: table.into(),
            receiver: self.sender.subscribe(),
        }
    }
}

/// Receives only the events for one table.
pub struct TableSubscription {
    table: String,
    receiver: broadcast::Receiver<ChangeEvent>,
}

impl TableSubscription {
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Next change for this table, or `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.table == self.table => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(table = %self.table, skipped, "Change subscription lagged");
                    return Some(ChangeEvent::new(self.table.clone(), ChangeKind::Unknown));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Builds `ws(s)://<host>/realtime/v1/websocket?apikey=..&vsn=1.0.0` from the project URL.
pub fn socket_url(project_url: &str, anon_key: &str) -> Result<String, SupabaseError> {
    let trimmed = project_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(SupabaseError::InvalidUrl(project_url.to_string()));
    };

    let url = reqwest::Url::parse_with_params(
        &format!("{ws_base}/realtime/v1/websocket"),
        &[("apikey", anon_key), ("vsn", PROTOCOL_VERSION)],
    )
    .map_err(|e| SupabaseError::InvalidUrl(format!("{project_url}: {e}")))?;

    Ok(url.to_string())
}

fn topic_for(table: &str) -> String {
    format!("realtime:{table}_changes")
}

fn join_frame(table: &str, reference: u64) -> Value {
    json!({
        "topic": topic_for(table),
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": [
                    { "event": "*", "schema": "public", "table": table }
                ]
            }
        },
        "ref": reference.to_string()
    })
}

fn heartbeat_frame(reference: u64) -> Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": reference.to_string()
    })
}

/// Extracts a change from one websocket frame; anything else (replies,
/// presence, system messages) yields `None`.
pub fn parse_frame(text: &str) -> Option<ChangeEvent> {
    let frame: Value = serde_json::from_str(text).ok()?;
    if frame.get("event")?.as_str()? != "postgres_changes" {
        return None;
    }

    let data = frame.pointer("/payload/data");
    let table = data
        .and_then(|d| d.get("table"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| {
            frame
                .get("topic")
                .and_then(Value::as_str)
                .and_then(|topic| topic.strip_prefix("realtime:"))
                .map(|name| name.trim_end_matches("_changes").to_string())
        })?;
    let kind = data
        .and_then(|d| d.get("type"))
        .and_then(Value::as_str)
        .map(ChangeKind::from_wire)
        .unwrap_or(ChangeKind::Unknown);

    Some(ChangeEvent::new(table, kind))
}

/// Keeps a websocket to the hosted realtime service open and republishes
/// row changes into a [`ChangeHub`].
pub struct RealtimeListener {
    socket_url: String,
    tables: Vec<String>,
    hub: ChangeHub,
    heartbeat: Duration,
    reconnect_delay: Duration,
}

impl RealtimeListener {
    pub fn new(settings: &SupabaseSettings, tables: &[&str], hub: ChangeHub) -> Result<Self, SupabaseError> {
        Ok(Self {
            socket_url: socket_url(settings.base_url(), settings.anon_key.expose_secret())?,
            tables: tables.iter().map(|t| t.to_string()).collect(),
            hub,
            heartbeat: HEARTBEAT_INTERVAL,
            reconnect_delay: RECONNECT_DELAY,
        })
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.run_once().await {
                    Ok(()) => tracing::info!("Realtime socket closed by server"),
                    Err(e) => tracing::warn!(error = %e, "Realtime socket failed"),
                }
                tokio::time::sleep(self.reconnect_delay).await;
                tracing::info!("Reconnecting realtime socket");
            }
        })
    }

    async fn run_once(&self) -> Result<(), SupabaseError> {
        let (socket, _) = connect_async(self.socket_url.as_str())
            .await
            .map_err(|e| SupabaseError::Realtime(e.to_string()))?;
        let (mut sink, mut stream) = socket.split();

        let mut reference: u64 = 0;
        for table in &self.tables {
            reference += 1;
            sink.send(Message::Text(join_frame(table, reference).to_string().into()))
                .await
                .map_err(|e| SupabaseError::Realtime(e.to_string()))?;
        }
        tracing::info!(tables = ?self.tables, "Joined realtime channels");

        let mut heartbeat = tokio::time::interval(self.heartbeat);
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    reference += 1;
                    sink.send(Message::Text(heartbeat_frame(reference).to_string().into()))
                        .await
                        .map_err(|e| SupabaseError::Realtime(e.to_string()))?;
                }
                message = stream.next() => match message {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = parse_frame(&text) {
                            self.hub.publish(event);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(SupabaseError::Realtime(e.to_string())),
                },
            }
        }
    }
}
