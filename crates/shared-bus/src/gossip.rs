//! # Gossip Boundary
//!
//! Raw peer-layer payloads are decoded once, here, into [`GossipMessage`].
//! Nothing past this module sees topic strings or JSON.

use crate::seen_cache::{SeenError, SeenMessageCache};
use serde::{Deserialize, Serialize};
use shared_types::{hash_from_hex, hash_hex, Hash, Transaction};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

/// A tagged byte payload as delivered by the peer layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMessage {
    /// Sender-assigned unique id, used for at-most-once delivery.
    pub id: Uuid,
    /// Topic tag (see [`GossipTopic`]).
    pub topic: String,
    /// Sender timestamp, unix seconds.
    pub timestamp: u64,
    /// JSON body.
    pub payload: Vec<u8>,
}

/// Known gossip topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GossipTopic {
    Heartbeat,
    NewBlock,
    NewTransaction,
    PeerList,
}

impl GossipTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heartbeat => "heartbeat",
            Self::NewBlock => "new-block",
            Self::NewTransaction => "new-transaction",
            Self::PeerList => "peer-list",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "heartbeat" => Some(Self::Heartbeat),
            "new-block" => Some(Self::NewBlock),
            "new-transaction" => Some(Self::NewTransaction),
            "peer-list" => Some(Self::PeerList),
            _ => None,
        }
    }
}

/// A decoded gossip message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GossipMessage {
    /// Liveness ping carrying the sender's best height.
    Heartbeat { node_id: String, best_height: u64 },
    /// Announcement that a block exists; a hint to re-check the graph.
    NewBlock { hash: Hash, height: u64 },
    /// Announcement of a transaction.
    NewTransaction(Transaction),
    /// Addresses of known peers.
    PeerList(Vec<String>),
}

impl GossipMessage {
    pub fn topic(&self) -> GossipTopic {
        match self {
            Self::Heartbeat { .. } => GossipTopic::Heartbeat,
            Self::NewBlock { .. } => GossipTopic::NewBlock,
            Self::NewTransaction(_) => GossipTopic::NewTransaction,
            Self::PeerList(_) => GossipTopic::PeerList,
        }
    }

    /// Encode into a raw message for the peer layer.
    pub fn encode(&self, id: Uuid, timestamp: u64) -> Result<RawMessage, GossipError> {
        let payload = match self {
            Self::Heartbeat {
                node_id,
                best_height,
            } => serde_json::to_vec(&HeartbeatBody {
                node_id: node_id.clone(),
                best_height: *best_height,
            }),
            Self::NewBlock { hash, height } => serde_json::to_vec(&NewBlockBody {
                hash: hash_hex(hash),
                height: *height,
            }),
            Self::NewTransaction(tx) => serde_json::to_vec(tx),
            Self::PeerList(peers) => serde_json::to_vec(&PeerListBody {
                peers: peers.clone(),
            }),
        }
        .map_err(|e| GossipError::MalformedPayload {
            topic: self.topic().as_str().to_string(),
            reason: e.to_string(),
        })?;

        Ok(RawMessage {
            id,
            topic: self.topic().as_str().to_string(),
            timestamp,
            payload,
        })
    }

    /// Decode a raw message. Unknown topics and malformed bodies are errors.
    pub fn decode(raw: &RawMessage) -> Result<Self, GossipError> {
        let topic = GossipTopic::parse(&raw.topic)
            .ok_or_else(|| GossipError::UnknownTopic(raw.topic.clone()))?;
        let malformed = |reason: String| GossipError::MalformedPayload {
            topic: raw.topic.clone(),
            reason,
        };

        match topic {
            GossipTopic::Heartbeat => {
                let body: HeartbeatBody =
                    serde_json::from_slice(&raw.payload).map_err(|e| malformed(e.to_string()))?;
                Ok(Self::Heartbeat {
                    node_id: body.node_id,
                    best_height: body.best_height,
                })
            }
            GossipTopic::NewBlock => {
                let body: NewBlockBody =
                    serde_json::from_slice(&raw.payload).map_err(|e| malformed(e.to_string()))?;
                let hash = hash_from_hex(&body.hash).map_err(|e| malformed(e.to_string()))?;
                Ok(Self::NewBlock {
                    hash,
                    height: body.height,
                })
            }
            GossipTopic::NewTransaction => {
                let tx: Transaction =
                    serde_json::from_slice(&raw.payload).map_err(|e| malformed(e.to_string()))?;
                Ok(Self::NewTransaction(tx))
            }
            GossipTopic::PeerList => {
                let body: PeerListBody =
                    serde_json::from_slice(&raw.payload).map_err(|e| malformed(e.to_string()))?;
                Ok(Self::PeerList(body.peers))
            }
        }
    }
}

#[derive(Serialize, Deserialize)]
struct HeartbeatBody {
    node_id: String,
    best_height: u64,
}

#[derive(Serialize, Deserialize)]
struct NewBlockBody {
    hash: String,
    height: u64,
}

#[derive(Serialize, Deserialize)]
struct PeerListBody {
    peers: Vec<String>,
}

/// Errors at the gossip boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GossipError {
    #[error("Unknown gossip topic: {0}")]
    UnknownTopic(String),

    #[error("Malformed {topic} payload: {reason}")]
    MalformedPayload { topic: String, reason: String },

    #[error(transparent)]
    NotAdmitted(#[from] SeenError),
}

impl GossipError {
    /// Duplicates are expected steady-state traffic, not faults.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::NotAdmitted(SeenError::Duplicate { .. }))
    }
}

/// Dedup-then-decode entry point for inbound gossip.
#[derive(Debug, Default)]
pub struct GossipInbox {
    seen: SeenMessageCache,
}

impl GossipInbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(seen: SeenMessageCache) -> Self {
        Self { seen }
    }

    /// Admit and decode one raw message.
    ///
    /// The id is recorded before decoding, so a malformed message is not
    /// re-examined when a peer repeats it.
    pub fn accept(&mut self, raw: &RawMessage, now: u64) -> Result<GossipMessage, GossipError> {
        self.seen.check_and_insert(raw.id, raw.timestamp, now)?;
        let message = GossipMessage::decode(raw)?;
        debug!(id = %raw.id, topic = %raw.topic, "Gossip message admitted");
        Ok(message)
    }

    /// Number of ids currently remembered.
    pub fn remembered(&self) -> usize {
        self.seen.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn raw(topic: &str, payload: &str) -> RawMessage {
        RawMessage {
            id: Uuid::new_v4(),
            topic: topic.to_string(),
            timestamp: NOW,
            payload: payload.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_decode_new_block() {
        let hash = [0xCDu8; 32];
        let body = format!(r#"{{"hash":"{}","height":7}}"#, hash_hex(&hash));
        let message = GossipMessage::decode(&raw("new-block", &body)).unwrap();
        assert_eq!(message, GossipMessage::NewBlock { hash, height: 7 });
    }

    #[test]
    fn test_decode_peer_list() {
        let message =
            GossipMessage::decode(&raw("peer-list", r#"{"peers":["10.0.0.1:7000"]}"#)).unwrap();
        assert_eq!(
            message,
            GossipMessage::PeerList(vec!["10.0.0.1:7000".to_string()])
        );
    }

    #[test]
    fn test_encode_decode_transaction() {
        let tx = Transaction::transfer([1; 32], [2; 32], 5, 1, 0);
        let encoded = GossipMessage::NewTransaction(tx.clone())
            .encode(Uuid::new_v4(), NOW)
            .unwrap();
        assert_eq!(encoded.topic, "new-transaction");
        assert_eq!(
            GossipMessage::decode(&encoded).unwrap(),
            GossipMessage::NewTransaction(tx)
        );
    }

    #[test]
    fn test_unknown_topic_rejected() {
        let result = GossipMessage::decode(&raw("mempool-dump", "{}"));
        assert_eq!(
            result,
            Err(GossipError::UnknownTopic("mempool-dump".to_string()))
        );
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let result = GossipMessage::decode(&raw("new-block", r#"{"hash":"zz","height":1}"#));
        assert!(matches!(result, Err(GossipError::MalformedPayload { .. })));

        let result = GossipMessage::decode(&raw("heartbeat", "not json"));
        assert!(matches!(result, Err(GossipError::MalformedPayload { .. })));
    }

    #[test]
    fn test_inbox_delivers_at_most_once() {
        let mut inbox = GossipInbox::new();
        let message = raw("heartbeat", r#"{"node_id":"n1","best_height":3}"#);

        assert!(inbox.accept(&message, NOW).is_ok());
        let repeat = inbox.accept(&message, NOW).unwrap_err();
        assert!(repeat.is_duplicate());
        assert_eq!(inbox.remembered(), 1);
    }
}
