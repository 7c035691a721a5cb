//! # Fork Resolver
//!
//! Owns every [`ForkInfo`] and the per-height index of forks still accepting
//! chains. Reads blocks only through [`BlockLookup`].

use crate::config::ForkChoiceConfig;
use crate::domain::{elect, Chain, ChainScore, ForkInfo, ForkStats, ForkStatus};
use crate::errors::{ForkError, ForkResult};
use parking_lot::Mutex;
use shared_types::{short_hex, Block, BlockLookup, Hash, SystemTimeSource, TimeSource};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Default)]
struct ResolverState {
    forks: HashMap<Uuid, ForkInfo>,
    /// Height -> fork still in `Detected`.
    open_by_height: HashMap<u64, Uuid>,
}

pub struct ForkResolver {
    lookup: Arc<dyn BlockLookup>,
    time: Arc<dyn TimeSource>,
    config: ForkChoiceConfig,
    state: Mutex<ResolverState>,
}

impl ForkResolver {
    pub fn new(lookup: Arc<dyn BlockLookup>, config: ForkChoiceConfig) -> Self {
        Self::with_time_source(lookup, config, Arc::new(SystemTimeSource))
    }

    pub fn with_time_source(
        lookup: Arc<dyn BlockLookup>,
        config: ForkChoiceConfig,
        time: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            lookup,
            time,
            config,
            state: Mutex::new(ResolverState::default()),
        }
    }

    pub fn config(&self) -> &ForkChoiceConfig {
        &self.config
    }

    /// Record a height collision between `new_block` and `blocks_at_same_height`.
    ///
    /// Returns `None` when no other block claims the height. While a fork at
    /// this height is still `Detected`, further colliding blocks join it;
    /// otherwise a new fork is opened.
    pub fn detect_fork(&self, new_block: &Block, blocks_at_same_height: &[Block]) -> Option<ForkInfo> {
        let height = new_block.height();
        let mut heads: Vec<Block> = vec![new_block.clone()];
        for block in blocks_at_same_height {
            if block.height() == height && !heads.iter().any(|h| h.hash == block.hash) {
                heads.push(block.clone());
            }
        }
        if heads.len() < 2 {
            return None;
        }

        // Heads of an open fork take part in the rebuild so trimming is
        // computed against every branch.
        let open = {
            let state = self.state.lock();
            state
                .open_by_height
                .get(&height)
                .and_then(|id| state.forks.get(id))
                .map(|fork| fork.chains.iter().filter_map(|c| c.head().copied()).collect::<Vec<Hash>>())
        };
        if let Some(open_heads) = &open {
            for hash in open_heads {
                if heads.iter().any(|h| h.hash == *hash) {
                    continue;
                }
                if let Some(block) = self.lookup.get_block(hash) {
                    heads.push(block);
                }
            }
        }

        let chains = self.build_chains(&heads);
        let now = self.time.now();

        let mut state = self.state.lock();
        // The lock was released for the rebuild; another caller may have
        // opened a fork at this height meanwhile.
        let current = state.open_by_height.get(&height).copied();
        if let Some(id) = current {
            if let Some(fork) = state.forks.get_mut(&id).filter(|f| f.accepts_chains()) {
                let before = fork.chains.len();
                for chain in chains {
                    match fork.chains.iter_mut().find(|c| c.id == chain.id) {
                        Some(existing) => *existing = chain,
                        None => fork.chains.push(chain),
                    }
                }
                if fork.chains.len() > before {
                    info!(fork = %id, height, chains = fork.chains.len(), "Fork extended");
                }
                return Some(fork.clone());
            }
        }

        let fork = ForkInfo::new(height, chains, now);
        info!(
            fork = %fork.id,
            height,
            chains = fork.chains.len(),
            block = %short_hex(&new_block.hash),
            "Fork detected"
        );
        state.open_by_height.insert(height, fork.id);
        state.forks.insert(fork.id, fork.clone());
        Some(fork)
    }

    /// Elect the winning chain of a fork. A fork resolves exactly once.
    pub fn resolve_fork(&self, fork_id: Uuid) -> ForkResult<Chain> {
        let (height, chains) = {
            let mut state = self.state.lock();
            let fork = state
                .forks
                .get_mut(&fork_id)
                .ok_or(ForkError::UnknownFork(fork_id))?;
            match fork.status {
                ForkStatus::Resolved => return Err(ForkError::AlreadyResolved(fork_id)),
                ForkStatus::Resolving => return Err(ForkError::ResolutionInProgress(fork_id)),
                ForkStatus::Detected => {}
            }
            if fork.chains.is_empty() {
                return Err(ForkError::NoChains(fork_id));
            }
            fork.status = ForkStatus::Resolving;
            let snapshot = (fork.height, fork.chains.clone());
            if state.open_by_height.get(&snapshot.0) == Some(&fork_id) {
                state.open_by_height.remove(&snapshot.0);
            }
            snapshot
        };

        let now = self.time.now();
        let election = elect(&chains, &self.config, now).ok_or(ForkError::NoChains(fork_id))?;
        let rule = election.score.dominant();

        let mut state = self.state.lock();
        if let Some(fork) = state.forks.get_mut(&fork_id) {
            fork.status = ForkStatus::Resolved;
            fork.winning_chain = Some(election.winner.id.clone());
            fork.resolution_rule = Some(rule);
            fork.tie_broken = election.tie_broken;
            fork.resolved_at = Some(now);
        }
        info!(
            fork = %fork_id,
            height,
            winner = %election.winner.id,
            score = election.score.total(),
            rule = %rule,
            tie_broken = election.tie_broken,
            "Fork resolved"
        );
        Ok(election.winner)
    }

    /// Resolve every `Detected` fork older than the configured grace period.
    pub fn resolve_expired(&self) -> Vec<ForkInfo> {
        let mut resolved = Vec::new();
        for id in self.unresolved_older_than(self.config.resolution_grace_secs) {
            match self.resolve_fork(id) {
                Ok(_) => {
                    if let Some(fork) = self.fork(id) {
                        resolved.push(fork);
                    }
                }
                // Another caller got there first.
                Err(e) => debug!(fork = %id, error = %e, "Sweep skipped fork"),
            }
        }
        resolved
    }

    /// Score a chain as of now.
    pub fn score(&self, chain: &Chain) -> ChainScore {
        ChainScore::compute(chain, &self.config, self.time.now())
    }

    pub fn fork(&self, fork_id: Uuid) -> Option<ForkInfo> {
        self.state.lock().forks.get(&fork_id).cloned()
    }

    /// The fork at `height` still accepting chains.
    pub fn open_fork_at(&self, height: u64) -> Option<ForkInfo> {
        let state = self.state.lock();
        state
            .open_by_height
            .get(&height)
            .and_then(|id| state.forks.get(id))
            .cloned()
    }

    /// Forks in `status`, oldest first.
    pub fn forks_by_status(&self, status: ForkStatus) -> Vec<ForkInfo> {
        let mut forks: Vec<ForkInfo> = self
            .state
            .lock()
            .forks
            .values()
            .filter(|f| f.status == status)
            .cloned()
            .collect();
        forks.sort_by(|a, b| a.detected_at.cmp(&b.detected_at).then(a.height.cmp(&b.height)));
        forks
    }

    /// Ids of `Detected` forks at least `age_secs` old.
    pub fn unresolved_older_than(&self, age_secs: u64) -> Vec<Uuid> {
        let now = self.time.now();
        self.forks_by_status(ForkStatus::Detected)
            .into_iter()
            .filter(|f| now.saturating_sub(f.detected_at) >= age_secs)
            .map(|f| f.id)
            .collect()
    }

    /// Drop resolved forks older than `max_age_secs`. Returns how many went.
    pub fn prune_resolved(&self, max_age_secs: u64) -> usize {
        let now = self.time.now();
        let mut state = self.state.lock();
        let before = state.forks.len();
        state.forks.retain(|_, f| match f.resolved_at {
            Some(at) => now.saturating_sub(at) < max_age_secs,
            None => true,
        });
        before - state.forks.len()
    }

    pub fn stats(&self) -> ForkStats {
        let state = self.state.lock();
        let mut stats = ForkStats::default();
        for fork in state.forks.values() {
            match fork.status {
                ForkStatus::Detected => stats.detected += 1,
                ForkStatus::Resolving => stats.resolving += 1,
                ForkStatus::Resolved => stats.resolved += 1,
            }
            if fork.tie_broken {
                stats.tie_breaks += 1;
            }
        }
        stats
    }

    /// One chain per head, each trimmed to start after the common ancestry.
    fn build_chains(&self, heads: &[Block]) -> Vec<Chain> {
        let paths: Vec<Vec<Block>> = heads.iter().map(|h| self.walk_back(h)).collect();

        let mut common: Option<HashSet<Hash>> = None;
        for path in &paths {
            let hashes: HashSet<Hash> = path.iter().map(|b| b.hash).collect();
            common = Some(match common {
                None => hashes,
                Some(acc) => acc.intersection(&hashes).copied().collect(),
            });
        }
        let common = common.unwrap_or_default();

        paths
            .into_iter()
            .filter_map(|path| {
                let mut branch: Vec<Block> = path
                    .into_iter()
                    .filter(|b| !common.contains(&b.hash))
                    .collect();
                branch.reverse();
                Chain::from_blocks(&branch)
            })
            .collect()
    }

    /// Head first, following first parents until genesis, an unknown
    /// ancestor, or the depth limit.
    fn walk_back(&self, head: &Block) -> Vec<Block> {
        let limit = self.config.max_walk_depth.max(1);
        let mut path = vec![head.clone()];
        while path.len() < limit {
            let Some(parent) = path.last().and_then(|b| b.parents().first().copied()) else {
                break;
            };
            let Some(block) = self.lookup.get_block(&parent) else {
                break;
            };
            path.push(block);
        }
        path
    }
}
