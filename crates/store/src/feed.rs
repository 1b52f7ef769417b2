//! Change notifications

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::query::{Collection, Row};

/// Buffered events per subscription before the forwarder waits
pub const SUBSCRIPTION_BUFFER: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Delete,
}

/// One change on a collection
///
/// For inserts `record` is the new row; for deletes it is the old row, which
/// may carry only the primary key.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    pub collection: Collection,
    pub kind: ChangeKind,
    pub record: Row,
}

impl ChangeEvent {
    pub fn id(&self) -> Option<&str> {
        self.record.get("id").and_then(|v| v.as_str())
    }
}

/// Live stream of change events; unsubscribes when dropped
#[derive(Debug)]
pub struct Subscription {
    events: mpsc::Receiver<ChangeEvent>,
    task: JoinHandle<()>,
}

impl Subscription {
    pub(crate) fn new(events: mpsc::Receiver<ChangeEvent>, task: JoinHandle<()>) -> Self {
        Self { events, task }
    }

    /// Next event, or None once the feed has closed
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Non-blocking poll used by tests and drain loops
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}
