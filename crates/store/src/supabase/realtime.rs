//! Realtime change feed over the Phoenix websocket protocol

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::SupabaseBackend;
use crate::ChangeFeed;
use crate::error::StoreError;
use crate::feed::{ChangeEvent, ChangeKind, SUBSCRIPTION_BUFFER, Subscription};
use crate::query::{Collection, Row};

const PROTOCOL_VERSION: &str = "1.0.0";

/// `https://x` -> `wss://x/realtime/v1/websocket?apikey=...`
fn websocket_url(base_url: &str, anon_key: &str) -> String {
    let ws_base = if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base_url.to_string()
    };
    format!("{ws_base}/realtime/v1/websocket?apikey={anon_key}&vsn={PROTOCOL_VERSION}")
}

fn topic(collection: Collection) -> String {
    format!("realtime:hadir-{}", collection.table())
}

fn kind_name(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Insert => "INSERT",
        ChangeKind::Delete => "DELETE",
    }
}

fn join_message(collection: Collection, kinds: &[ChangeKind], anon_key: &str) -> Value {
    let changes: Vec<Value> = kinds
        .iter()
        .map(|kind| {
            json!({
                "event": kind_name(*kind),
                "schema": "public",
                "table": collection.table(),
            })
        })
        .collect();
    json!({
        "topic": topic(collection),
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "self": false },
                "presence": { "key": "" },
                "postgres_changes": changes,
            },
            "access_token": anon_key,
        },
        "ref": "1",
        "join_ref": "1",
    })
}

fn heartbeat_message(seq: u64) -> Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": seq.to_string(),
    })
}

#[derive(Deserialize)]
struct PhoenixMessage {
    event: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct ChangePayload {
    data: ChangeData,
}

#[derive(Deserialize)]
struct ChangeData {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    record: Option<Row>,
    #[serde(default)]
    old_record: Option<Row>,
}

/// What one incoming frame means for the subscription
#[derive(Debug, PartialEq)]
enum Incoming {
    Change(ChangeEvent),
    JoinRejected(String),
    Closed,
    Ignore,
}

fn parse_frame(text: &str, collection: Collection, kinds: &[ChangeKind]) -> Incoming {
    let Ok(message) = serde_json::from_str::<PhoenixMessage>(text) else {
        return Incoming::Ignore;
    };
    match message.event.as_str() {
        "postgres_changes" => {
            let Ok(change) = serde_json::from_value::<ChangePayload>(message.payload) else {
                return Incoming::Ignore;
            };
            let (kind, record) = match change.data.kind.as_str() {
                "INSERT" => (ChangeKind::Insert, change.data.record),
                "DELETE" => (ChangeKind::Delete, change.data.old_record),
                _ => return Incoming::Ignore,
            };
            match record {
                Some(record) if kinds.contains(&kind) => Incoming::Change(ChangeEvent {
                    collection,
                    kind,
                    record,
                }),
                _ => Incoming::Ignore,
            }
        }
        "phx_reply" if message.payload["status"] == "error" => {
            Incoming::JoinRejected(message.payload["response"].to_string())
        }
        "phx_close" | "phx_error" => Incoming::Closed,
        _ => Incoming::Ignore,
    }
}

impl ChangeFeed for SupabaseBackend {
    async fn subscribe(
        &self,
        collection: Collection,
        kinds: &[ChangeKind],
    ) -> Result<Subscription, StoreError> {
        let url = websocket_url(&self.base_url, &self.anon_key);
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        let (mut write, mut read) = ws_stream.split();

        let join = join_message(collection, kinds, &self.anon_key).to_string();
        write.send(Message::Text(join.into())).await?;
        info!("Realtime subscription joined for {}", collection.table());

        let kinds = kinds.to_vec();
        let period = self.heartbeat;
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);

        let task = tokio::spawn(async move {
            let mut heartbeat = tokio::time::interval(period);
            // First tick completes immediately
            heartbeat.tick().await;
            let mut seq: u64 = 1;

            loop {
                tokio::select! {
                    _ = heartbeat.tick() => {
                        seq += 1;
                        let beat = heartbeat_message(seq).to_string();
                        if let Err(e) = write.send(Message::Text(beat.into())).await {
                            warn!("Realtime heartbeat failed: {}", e);
                            break;
                        }
                    }
                    frame = read.next() => {
                        let text = match frame {
                            Some(Ok(Message::Text(text))) => text,
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Realtime socket closed");
                                break;
                            }
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => {
                                warn!("Realtime socket error: {}", e);
                                break;
                            }
                        };
                        match parse_frame(text.as_str(), collection, &kinds) {
                            Incoming::Change(event) => {
                                if tx.send(event).await.is_err() {
                                    break;
                                }
                            }
                            Incoming::JoinRejected(reason) => {
                                warn!("Realtime join rejected: {}", reason);
                                break;
                            }
                            Incoming::Closed => break,
                            Incoming::Ignore => {}
                        }
                    }
                }
            }
            let _ = write.close().await;
            debug!("Realtime subscription on {} ended", collection.table());
        });

        Ok(Subscription::new(rx, task))
    }
}
