//! PostgreSQL change listener
//!
//! Bridges `pg_notify` row triggers onto the in-process [`ChangeFeed`].

use serde::Deserialize;
use sqlx::postgres::PgListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::database::store::{ChangeEvent, ChangeFeed, ChangeKind, Table};
use crate::database::DatabasePool;
use crate::utils::errors::Result;

/// Payload written by the `notify_row_change` trigger
#[derive(Debug, Deserialize)]
struct TriggerPayload {
    table: String,
    op: String,
    id: Option<Uuid>,
    record: Option<serde_json::Value>,
}

/// Decode a trigger payload. Unknown tables or operations yield `None`.
pub fn parse_notification(payload: &str) -> Option<ChangeEvent> {
    let raw: TriggerPayload = serde_json::from_str(payload).ok()?;
    let table = Table::from_name(&raw.table)?;
    let kind = match raw.op.to_ascii_uppercase().as_str() {
        "INSERT" => ChangeKind::Insert,
        "UPDATE" => ChangeKind::Update,
        "DELETE" => ChangeKind::Delete,
        _ => return None,
    };

    Some(ChangeEvent {
        table,
        kind,
        id: raw.id,
        record: raw.record,
    })
}

/// Background task relaying notifications; stops when dropped
#[derive(Debug)]
pub struct ChangeListener {
    handle: JoinHandle<()>,
}

impl ChangeListener {
    pub async fn start(pool: &DatabasePool, channel: &str, feed: ChangeFeed) -> Result<Self> {
        let mut listener = PgListener::connect_with(pool).await?;
        listener.listen(channel).await?;
        info!(channel = %channel, "Listening for row changes");

        let handle = tokio::spawn(async move {
            loop {
                match listener.try_recv().await {
                    Ok(Some(notification)) => match parse_notification(notification.payload()) {
                        Some(event) => {
                            debug!(table = %event.table, kind = ?event.kind, "Row change received");
                            feed.publish(event);
                        }
                        None => warn!(payload = %notification.payload(), "Ignoring unrecognised notification"),
                    },
                    Ok(None) => {
                        // The connection dropped; notifications sent meanwhile are lost.
                        warn!("Change listener reconnected, forcing resync");
                        for table in Table::ALL {
                            feed.publish(ChangeEvent::resync(table));
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Change listener failed, retrying");
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                }
            }
        });

        Ok(Self { handle })
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
