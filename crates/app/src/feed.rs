//! Live check-in list fed by the backend change feed

use futures_util::Stream;
use futures_util::stream;
use hadir_ipc::{CheckInRecord, ServerEvent};
use hadir_store::{
    Backend, ChangeEvent, ChangeFeed, ChangeKind, Collection, Subscription, from_row,
};
use tracing::{debug, warn};

use crate::error::AppError;

pub const FEED_CLOSED_CODE: &str = "feed_closed";
pub const FEED_CLOSED_MESSAGE: &str = "Koneksi realtime terputus. Muat ulang halaman.";

/// Dashboard check-in list kept current from change events
///
/// Delivery is at-least-once, so both operations are idempotent.
#[derive(Debug, Clone, Default)]
pub struct CheckInFeed {
    records: Vec<CheckInRecord>,
}

impl CheckInFeed {
    pub fn new(initial: Vec<CheckInRecord>) -> Self {
        Self { records: initial }
    }

    pub fn records(&self) -> &[CheckInRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prepend unless a record with the same id is already listed
    pub fn insert(&mut self, record: CheckInRecord) -> bool {
        if self.records.iter().any(|r| r.id == record.id) {
            return false;
        }
        self.records.insert(0, record);
        true
    }

    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.records.len() != before
    }

    /// Apply a pushed event; returns whether the list changed
    pub fn apply(&mut self, event: &ServerEvent) -> bool {
        match event {
            ServerEvent::CheckInAdded(record) => self.insert(record.clone()),
            ServerEvent::CheckInRemoved { id } => self.remove(id),
            ServerEvent::Error { .. } => false,
        }
    }
}

/// Translate a raw change into what dashboard clients receive
pub fn to_server_event(change: ChangeEvent) -> Option<ServerEvent> {
    match change.kind {
        ChangeKind::Insert => match from_row::<CheckInRecord>(change.record) {
            Ok(record) => Some(ServerEvent::CheckInAdded(record)),
            Err(e) => {
                warn!("Dropping undecodable check-in insert: {}", e);
                None
            }
        },
        ChangeKind::Delete => match change.id() {
            Some(id) => Some(ServerEvent::CheckInRemoved { id: id.to_string() }),
            None => {
                warn!("Dropping check-in delete without id");
                None
            }
        },
    }
}

pub async fn subscribe_check_ins(backend: &Backend) -> Result<Subscription, AppError> {
    let subscription = backend
        .subscribe(
            Collection::DaftarHadir,
            &[ChangeKind::Insert, ChangeKind::Delete],
        )
        .await?;
    debug!("Check-in feed subscribed");
    Ok(subscription)
}

/// Server events from a subscription
///
/// Ends with a single `Error` event when the upstream feed closes. Dropping
/// the stream drops the subscription, which unsubscribes.
pub fn server_events(subscription: Subscription) -> impl Stream<Item = ServerEvent> {
    stream::unfold(Some(subscription), |state| async move {
        let mut subscription = state?;
        loop {
            match subscription.recv().await {
                Some(change) => {
                    if let Some(event) = to_server_event(change) {
                        return Some((event, Some(subscription)));
                    }
                }
                None => {
                    warn!("Check-in feed closed");
                    let event = ServerEvent::Error {
                        code: FEED_CLOSED_CODE.to_string(),
                        message: FEED_CLOSED_MESSAGE.to_string(),
                    };
                    return Some((event, None));
                }
            }
        }
    })
}
