//! # Gossip Boundary
//!
//! Inbound peer messages are admitted by the dedup cache and decoded once
//! into a [`GossipMessage`]; nothing past this module sees raw payloads.
//!
//! A `NewBlock` announcement carries no block body, so it only marks the
//! hash as wanted when the graph does not have it. The body arrives later
//! through the sync gateway. Announcements are unauthenticated, so the
//! wanted set is bounded and forgets its oldest hash when full.

use crate::adapters::Mempool;
use parking_lot::Mutex;
use shared_bus::{GossipError, GossipInbox, GossipMessage, RawMessage};
use shared_types::{short_hex, Hash, TimeSource};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tc_01_block_graph::BlockGraph;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};
use uuid::Uuid;

/// Default bound on remembered wanted hashes.
pub const DEFAULT_WANTED_CAPACITY: usize = 4_096;

#[derive(Debug, Default)]
struct WantedSet {
    hashes: HashSet<Hash>,
    /// Insertion order, oldest first.
    order: VecDeque<Hash>,
}

/// Hashes announced by peers that the graph does not hold yet.
#[derive(Debug)]
pub struct WantedBlocks {
    inner: Mutex<WantedSet>,
    capacity: usize,
}

impl Default for WantedBlocks {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_WANTED_CAPACITY)
    }
}

impl WantedBlocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(WantedSet::default()),
            capacity: capacity.max(1),
        }
    }

    /// Returns how many hashes were newly added. Evicts the oldest hashes to
    /// stay within capacity.
    pub fn want(&self, hashes: impl IntoIterator<Item = Hash>) -> usize {
        let mut wanted = self.inner.lock();
        let mut added = 0;
        for hash in hashes {
            if !wanted.hashes.insert(hash) {
                continue;
            }
            wanted.order.push_back(hash);
            added += 1;
            while wanted.order.len() > self.capacity {
                if let Some(oldest) = wanted.order.pop_front() {
                    wanted.hashes.remove(&oldest);
                    debug!(hash = %short_hex(&oldest), "Wanted set full, forgot oldest");
                }
            }
        }
        added
    }

    /// Forget a hash once its block is stored.
    pub fn fulfil(&self, hash: &Hash) -> bool {
        let mut wanted = self.inner.lock();
        if !wanted.hashes.remove(hash) {
            return false;
        }
        wanted.order.retain(|h| h != hash);
        true
    }

    pub fn contains(&self, hash: &Hash) -> bool {
        self.inner.lock().hashes.contains(hash)
    }

    /// Sorted snapshot.
    pub fn snapshot(&self) -> Vec<Hash> {
        let mut hashes: Vec<Hash> = self.inner.lock().hashes.iter().copied().collect();
        hashes.sort_unstable();
        hashes
    }

    pub fn len(&self) -> usize {
        self.inner.lock().hashes.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// What an admitted message changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GossipOutcome {
    PeerHeight { node_id: String, best_height: u64 },
    BlockWanted(Hash),
    BlockKnown(Hash),
    TransactionQueued(Hash),
    TransactionIgnored(Hash),
    PeersLearned(usize),
    /// Our own heartbeat echoed back.
    OwnMessage,
}

#[derive(Debug, Default)]
struct PeerBook {
    heights: HashMap<String, u64>,
    addresses: BTreeSet<String>,
}

pub struct GossipHandler {
    node_id: String,
    inbox: Mutex<GossipInbox>,
    peers: Mutex<PeerBook>,
    graph: Arc<BlockGraph>,
    mempool: Arc<Mempool>,
    wanted: Arc<WantedBlocks>,
    time: Arc<dyn TimeSource>,
}

impl GossipHandler {
    pub fn new(
        node_id: impl Into<String>,
        graph: Arc<BlockGraph>,
        mempool: Arc<Mempool>,
        wanted: Arc<WantedBlocks>,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            inbox: Mutex::new(GossipInbox::new()),
            peers: Mutex::new(PeerBook::default()),
            graph,
            mempool,
            wanted,
            time,
        }
    }

    /// Admit, decode and apply one raw message.
    pub fn handle(&self, raw: &RawMessage) -> Result<GossipOutcome, GossipError> {
        let message = self.inbox.lock().accept(raw, self.time.now())?;

        let outcome = match message {
            GossipMessage::Heartbeat { node_id, best_height } => {
                if node_id == self.node_id {
                    return Ok(GossipOutcome::OwnMessage);
                }
                self.peers.lock().heights.insert(node_id.clone(), best_height);
                GossipOutcome::PeerHeight { node_id, best_height }
            }
            GossipMessage::NewBlock { hash, height } => {
                if self.wanted.want(self.graph.missing(&[hash])) > 0 {
                    debug!(hash = %short_hex(&hash), height, "Announced block wanted");
                    GossipOutcome::BlockWanted(hash)
                } else {
                    GossipOutcome::BlockKnown(hash)
                }
            }
            GossipMessage::NewTransaction(tx) => {
                let hash = tx.hash();
                if self.mempool.add(tx) {
                    GossipOutcome::TransactionQueued(hash)
                } else {
                    GossipOutcome::TransactionIgnored(hash)
                }
            }
            GossipMessage::PeerList(addresses) => {
                let mut peers = self.peers.lock();
                let learned = addresses
                    .into_iter()
                    .filter(|a| peers.addresses.insert(a.clone()))
                    .count();
                GossipOutcome::PeersLearned(learned)
            }
        };
        Ok(outcome)
    }

    /// Handle and log; used by the inbound listener.
    pub fn process(&self, raw: &RawMessage) {
        match self.handle(raw) {
            Ok(outcome) => debug!(id = %raw.id, ?outcome, "Gossip applied"),
            Err(e) if e.is_duplicate() => debug!(id = %raw.id, "Duplicate gossip dropped"),
            Err(e) => warn!(id = %raw.id, topic = %raw.topic, error = %e, "Gossip dropped"),
        }
    }

    /// Highest height reported by any peer.
    pub fn best_peer_height(&self) -> Option<u64> {
        self.peers.lock().heights.values().copied().max()
    }

    pub fn known_peers(&self) -> Vec<String> {
        self.peers.lock().addresses.iter().cloned().collect()
    }

    pub fn wanted(&self) -> &Arc<WantedBlocks> {
        &self.wanted
    }
}

/// Outbound side: encodes messages and queues them for the peer layer.
#[derive(Clone)]
pub struct GossipAnnouncer {
    outbound: mpsc::Sender<RawMessage>,
    time: Arc<dyn TimeSource>,
}

impl GossipAnnouncer {
    pub fn new(outbound: mpsc::Sender<RawMessage>, time: Arc<dyn TimeSource>) -> Self {
        Self { outbound, time }
    }

    /// Queue `message`; returns false when it was dropped.
    pub fn announce(&self, message: &GossipMessage) -> bool {
        let raw = match message.encode(Uuid::new_v4(), self.time.now()) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to encode gossip");
                return false;
            }
        };
        match self.outbound.try_send(raw) {
            Ok(()) => true,
            Err(TrySendError::Full(raw)) => {
                debug!(topic = %raw.topic, "Outbound gossip queue full");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}
