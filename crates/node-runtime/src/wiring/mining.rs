//! # Mining Wiring
//!
//! Workers run on dedicated OS threads and hand blocks to an async
//! consumer, which signs them with the node key and runs the ingestion
//! pipeline before announcing them to peers.

use crate::adapters::GraphTips;
use crate::container::{NodeContainer, NodeError};
use crate::handlers::{BlockIngestion, GossipAnnouncer};
use shared_bus::GossipMessage;
use shared_crypto::{sign_block, Ed25519KeyPair};
use shared_types::short_hex;
use std::sync::Arc;
use tc_02_pow_miner::{CandidateBuilder, MinedBlock, MiningWorker};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Start the configured number of mining threads.
pub fn start_mining(
    container: &NodeContainer,
    output: mpsc::Sender<MinedBlock>,
) -> Result<MiningWorker, NodeError> {
    let tips = Arc::new(GraphTips::new(container.graph.clone()));
    let builder = Arc::new(CandidateBuilder::new(tips, container.config.mining.max_parents));
    let worker = MiningWorker::spawn(
        &container.config.mining,
        container.miner.clone(),
        builder,
        container.mempool.clone(),
        container.keypair.identity(),
        output,
    )?;
    Ok(worker)
}

/// Sign, ingest and announce mined blocks.
pub fn spawn_block_consumer(
    ingestion: Arc<BlockIngestion>,
    keypair: Arc<Ed25519KeyPair>,
    announcer: GossipAnnouncer,
    mut mined: mpsc::Receiver<MinedBlock>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let MinedBlock { mut block, worker } = tokio::select! {
                next = mined.recv() => match next {
                    Some(mined) => mined,
                    None => break,
                },
                _ = shutdown.changed() => break,
            };

            if let Err(e) = sign_block(&mut block, &keypair) {
                warn!(worker, error = %e, "Failed to sign mined block");
                continue;
            }
            let hash = block.hash;
            let height = block.height();
            match ingestion.ingest(block) {
                Ok(report) if report.inserted => {
                    info!(worker, hash = %short_hex(&hash), height, finalized = report.finalized, "Mined block ingested");
                    announcer.announce(&GossipMessage::NewBlock { hash, height });
                }
                Ok(_) => debug!(worker, hash = %short_hex(&hash), "Mined block already known"),
                Err(e) => warn!(worker, hash = %short_hex(&hash), error = %e, "Failed to ingest mined block"),
            }
        }
        debug!("Block consumer stopped");
    })
}
