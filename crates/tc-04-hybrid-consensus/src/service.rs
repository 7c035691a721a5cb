//! # Hybrid Consensus Service
//!
//! Validator registry, vote ledger and stake ledger behind one mutex. Vote
//! signatures and block structure are checked outside the lock; the store is
//! written after it is released.

use crate::config::ConsensusConfig;
use crate::domain::{
    has_quorum, BlockStatus, BlockVotes, ConsensusError, ConsensusResult, Equivocation,
    LedgerEffect, Recorded, StakeLedger, Validator, ValidatorId, Vote,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shared_crypto::{verify_vote, Ed25519PublicKey};
use shared_types::{
    hash_hex, short_hex, Address, Block, Hash, KeyValueStore, MinerId, PublicKey, Signature,
    SystemTimeSource, TimeSource,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// `finalized:<hex hash>` -> JSON [`Finalization`]
pub const FINALIZED_KEY_PREFIX: &str = "finalized:";
/// `effect:<zero-padded sequence>` -> JSON [`LedgerEffect`]
pub const EFFECT_KEY_PREFIX: &str = "effect:";

/// Tally after a vote was recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteReceipt {
    pub block: Hash,
    pub vote: Vote,
    pub yes_power: u128,
    pub active_power: u128,
    pub has_consensus: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finalization {
    pub block: Hash,
    pub height: u64,
    pub miner: MinerId,
    /// Yes-voters whose power counted, in id order.
    pub yes_voters: Vec<ValidatorId>,
    pub yes_power: u128,
    pub active_power: u128,
    pub finalized_at: u64,
    pub effects: Vec<LedgerEffect>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FinalizeOutcome {
    Finalized(Finalization),
    /// Quorum not reached; the block stays pending.
    Pending { yes_power: u128, active_power: u128 },
    AlreadyFinalized,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashOutcome {
    pub validator: ValidatorId,
    pub penalty: u128,
    pub remaining_stake: u128,
    pub deactivated: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConsensusStats {
    pub validators: usize,
    pub active_validators: usize,
    pub active_power: u128,
    pub pending_blocks: usize,
    pub finalized_blocks: usize,
}

#[derive(Debug, Default)]
struct ConsensusState {
    validators: BTreeMap<ValidatorId, Validator>,
    blocks: HashMap<Hash, BlockVotes>,
    ledger: StakeLedger,
    evidence: Vec<Equivocation>,
    /// (validator, block) pairs already reported; one slash per equivocation.
    equivocated: HashSet<(ValidatorId, Hash)>,
    /// Finalized blocks whose votes were pruned.
    settled: HashSet<Hash>,
}

impl ConsensusState {
    fn active_power(&self) -> u128 {
        self.validators.values().map(Validator::active_power).sum()
    }

    /// Yes power of currently active validators only.
    fn yes_power(&self, votes: &BlockVotes) -> u128 {
        votes
            .yes_voters()
            .filter_map(|id| self.validators.get(id))
            .map(Validator::active_power)
            .sum()
    }

    fn active(&self, id: &str) -> ConsensusResult<&Validator> {
        let validator = self
            .validators
            .get(id)
            .ok_or_else(|| ConsensusError::NotRegistered(id.to_string()))?;
        if !validator.is_active {
            return Err(ConsensusError::Inactive(id.to_string()));
        }
        Ok(validator)
    }
}

pub struct HybridConsensus {
    config: ConsensusConfig,
    time: Arc<dyn TimeSource>,
    store: Option<Arc<dyn KeyValueStore>>,
    state: Mutex<ConsensusState>,
}

impl HybridConsensus {
    pub fn new(config: ConsensusConfig) -> Self {
        Self {
            config,
            time: Arc::new(SystemTimeSource),
            store: None,
            state: Mutex::new(ConsensusState::default()),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time: Arc<dyn TimeSource>) -> Self {
        self.time = time;
        self
    }

    /// Write finalizations and ledger effects through to `store`.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    // === VALIDATOR SET ===

    pub fn register_validator(
        &self,
        id: &str,
        public_key: PublicKey,
        stake: u128,
    ) -> ConsensusResult<Validator> {
        if stake < self.config.min_stake {
            return Err(ConsensusError::InsufficientStake {
                stake,
                min_stake: self.config.min_stake,
            });
        }
        Ed25519PublicKey::from_bytes(public_key)
            .map_err(|_| ConsensusError::InvalidPublicKey(id.to_string()))?;

        let mut state = self.state.lock();
        if state.validators.contains_key(id) {
            return Err(ConsensusError::AlreadyRegistered(id.to_string()));
        }
        let validator = Validator::new(
            id.to_string(),
            public_key,
            stake,
            self.config.vote_power(stake),
        );
        state.validators.insert(id.to_string(), validator.clone());
        info!(validator = id, stake, vote_power = validator.vote_power, "Validator registered");
        Ok(validator)
    }

    /// Top up a validator's stake. Re-activates it once both thresholds hold.
    pub fn add_stake(&self, id: &str, amount: u128) -> ConsensusResult<Validator> {
        let mut state = self.state.lock();
        let validator = state
            .validators
            .get_mut(id)
            .ok_or_else(|| ConsensusError::NotRegistered(id.to_string()))?;

        validator.stake = validator.stake.saturating_add(amount);
        validator.vote_power = self.config.vote_power(validator.stake);
        if !validator.is_active
            && validator.stake >= self.config.min_stake
            && validator.reputation.value() >= self.config.min_reputation
        {
            validator.is_active = true;
            info!(validator = id, stake = validator.stake, "Validator re-activated");
        }
        Ok(validator.clone())
    }

    /// Voluntary exit: the whole stake returns to the validator's account.
    pub fn exit_validator(&self, id: &str) -> ConsensusResult<u128> {
        let (amount, effect, seq) = {
            let mut state = self.state.lock();
            let validator = state
                .validators
                .get_mut(id)
                .ok_or_else(|| ConsensusError::NotRegistered(id.to_string()))?;
            if validator.stake == 0 && !validator.is_active {
                return Err(ConsensusError::Inactive(id.to_string()));
            }
            let amount = validator.stake;
            let account = validator.public_key;
            validator.stake = 0;
            validator.vote_power = 0;
            validator.is_active = false;

            let seq = state.ledger.next_seq();
            (amount, state.ledger.exit(id, account, amount), seq)
        };

        info!(validator = id, amount, "Validator exited");
        self.persist_effects(seq, std::slice::from_ref(&effect))?;
        Ok(amount)
    }

    /// Deduct the slash penalty, halve reputation, and deactivate when the
    /// validator falls below either threshold.
    pub fn slash_validator(&self, id: &str, reason: &str) -> ConsensusResult<SlashOutcome> {
        let (outcome, effect, seq) = {
            let mut state = self.state.lock();
            let validator = state
                .validators
                .get_mut(id)
                .ok_or_else(|| ConsensusError::NotRegistered(id.to_string()))?;

            let penalty = self.config.slash_penalty.min(validator.stake);
            validator.stake -= penalty;
            validator.vote_power = self.config.vote_power(validator.stake);
            validator.reputation = validator.reputation.halve();
            validator.slash_count += 1;

            let below = validator.stake < self.config.min_stake
                || validator.reputation.value() < self.config.min_reputation;
            let deactivated = validator.is_active && below;
            if deactivated {
                validator.is_active = false;
            }
            let outcome = SlashOutcome {
                validator: id.to_string(),
                penalty,
                remaining_stake: validator.stake,
                deactivated,
            };

            let seq = state.ledger.next_seq();
            let effect = state.ledger.slash(id, penalty, reason);
            (outcome, effect, seq)
        };

        warn!(
            validator = id,
            reason,
            penalty = outcome.penalty,
            remaining = outcome.remaining_stake,
            deactivated = outcome.deactivated,
            "Validator slashed"
        );
        self.persist_effects(seq, std::slice::from_ref(&effect))?;
        Ok(outcome)
    }

    // === VOTING ===

    /// Check `block` on behalf of `validator_id` and record its yes-vote.
    ///
    /// `signature` is the validator's vote signature over the block hash.
    /// Nothing is recorded unless every check passes.
    pub fn validate_block(
        &self,
        block: &Block,
        signature: &Signature,
        validator_id: &str,
    ) -> ConsensusResult<VoteReceipt> {
        let public_key = self.state.lock().active(validator_id)?.public_key;

        if let Err(e) = check_block(block, &public_key, signature, validator_id) {
            warn!(block = %short_hex(&block.hash), validator = validator_id, error = %e, "Block failed validation");
            return Err(e);
        }

        self.record_vote(block, validator_id, Vote::Yes)
    }

    /// Record an explicit no-vote.
    pub fn reject_block(&self, block: &Block, validator_id: &str) -> ConsensusResult<VoteReceipt> {
        self.state.lock().active(validator_id)?;
        self.record_vote(block, validator_id, Vote::No)
    }

    fn record_vote(&self, block: &Block, validator_id: &str, vote: Vote) -> ConsensusResult<VoteReceipt> {
        let now = self.time.now();
        let mut state = self.state.lock();
        // Deactivation may have happened since the caller's check.
        state.active(validator_id)?;
        if state.settled.contains(&block.hash) {
            return Err(ConsensusError::AlreadySettled(block.hash));
        }

        let votes = state
            .blocks
            .entry(block.hash)
            .or_insert_with(|| BlockVotes::new(block.hash, block.height(), block.header.miner_id, now));
        match votes.record(validator_id, vote) {
            Recorded::Conflict(evidence) => {
                warn!(
                    validator = validator_id,
                    block = %short_hex(&block.hash),
                    first = ?evidence.first,
                    second = ?evidence.second,
                    "Conflicting vote"
                );
                let err = ConsensusError::ConflictingVote {
                    validator: evidence.validator.clone(),
                    block: evidence.block,
                    first: evidence.first,
                    second: evidence.second,
                };
                if state
                    .equivocated
                    .insert((evidence.validator.clone(), evidence.block))
                {
                    state.evidence.push(evidence);
                }
                return Err(err);
            }
            Recorded::New => {
                if vote == Vote::Yes {
                    if let Some(validator) = state.validators.get_mut(validator_id) {
                        validator.validated_blocks += 1;
                    }
                }
            }
            Recorded::Repeated => {}
        }

        let Some(votes) = state.blocks.get(&block.hash) else {
            return Err(ConsensusError::UnknownBlock(block.hash));
        };
        let yes_power = state.yes_power(votes);
        let active_power = state.active_power();
        debug!(
            block = %short_hex(&block.hash),
            validator = validator_id,
            ?vote,
            yes_power,
            active_power,
            "Vote recorded"
        );
        Ok(VoteReceipt {
            block: block.hash,
            vote,
            yes_power,
            active_power,
            has_consensus: has_quorum(yes_power, active_power),
        })
    }

    /// Yes power ≥ 2/3 of the power active right now.
    pub fn has_consensus(&self, block: &Hash) -> bool {
        let state = self.state.lock();
        match state.blocks.get(block) {
            Some(votes) => has_quorum(state.yes_power(votes), state.active_power()),
            None => false,
        }
    }

    // === FINALIZATION ===

    /// Finalize on the first evaluation that reaches quorum.
    ///
    /// Pays the miner and every counted yes-voter, raises their reputation
    /// and lowers it for active validators that did not vote.
    pub fn finalize_block(&self, block: &Hash) -> ConsensusResult<FinalizeOutcome> {
        let now = self.time.now();
        let (finalization, seq) = {
            let mut state = self.state.lock();
            if state.settled.contains(block) {
                return Ok(FinalizeOutcome::AlreadyFinalized);
            }
            let votes = state
                .blocks
                .get(block)
                .ok_or(ConsensusError::UnknownBlock(*block))?;
            if votes.is_finalized() {
                return Ok(FinalizeOutcome::AlreadyFinalized);
            }

            let yes_power = state.yes_power(votes);
            let active_power = state.active_power();
            if !has_quorum(yes_power, active_power) {
                return Ok(FinalizeOutcome::Pending {
                    yes_power,
                    active_power,
                });
            }

            let height = votes.height;
            let miner = votes.miner;
            let voted: HashMap<ValidatorId, Vote> = votes.votes.clone();
            let mut yes_voters: Vec<ValidatorId> = Vec::new();
            let mut accounts: Vec<Address> = Vec::new();
            for validator in state.validators.values_mut().filter(|v| v.is_active) {
                match voted.get(&validator.id) {
                    Some(Vote::Yes) => {
                        validator.reputation = validator.reputation.raise(1);
                        yes_voters.push(validator.id.clone());
                        accounts.push(validator.public_key);
                    }
                    Some(Vote::No) => {}
                    None => validator.reputation = validator.reputation.lower(2),
                }
            }

            let seq = state.ledger.next_seq();
            let mut effects = vec![state.ledger.reward(miner, self.config.miner_reward, *block)];
            for account in accounts {
                effects.push(state.ledger.reward(account, self.config.vote_reward, *block));
            }

            if let Some(votes) = state.blocks.get_mut(block) {
                votes.status = BlockStatus::Finalized;
                votes.finalized_at = Some(now);
            }

            let finalization = Finalization {
                block: *block,
                height,
                miner,
                yes_voters,
                yes_power,
                active_power,
                finalized_at: now,
                effects,
            };
            (finalization, seq)
        };

        info!(
            block = %short_hex(block),
            height = finalization.height,
            yes_votes = finalization.yes_voters.len(),
            yes_power = finalization.yes_power,
            active_power = finalization.active_power,
            "Block finalized"
        );

        self.persist_finalization(&finalization, seq)?;
        Ok(FinalizeOutcome::Finalized(finalization))
    }

    /// Try every pending block; returns the ones finalized now.
    pub fn finalize_pending(&self) -> Vec<Finalization> {
        let mut finalized = Vec::new();
        for block in self.pending_blocks() {
            match self.finalize_block(&block) {
                Ok(FinalizeOutcome::Finalized(f)) => finalized.push(f),
                Ok(_) => {}
                Err(e) => warn!(block = %short_hex(&block), error = %e, "Finalization failed"),
            }
        }
        finalized
    }

    /// Drop vote records of blocks finalized at least `max_age_secs` ago and
    /// trim the in-memory effect log to `retained_effects`. Pruned blocks
    /// stay finalized: later votes on them are refused.
    pub fn prune_finalized(&self, max_age_secs: u64) -> usize {
        let now = self.time.now();
        let mut state = self.state.lock();
        let expired: HashSet<Hash> = state
            .blocks
            .values()
            .filter(|v| {
                v.finalized_at
                    .is_some_and(|at| now.saturating_sub(at) >= max_age_secs)
            })
            .map(|v| v.block)
            .collect();
        for hash in &expired {
            state.blocks.remove(hash);
            state.settled.insert(*hash);
        }
        state.equivocated.retain(|(_, block)| !expired.contains(block));
        let trimmed = state.ledger.trim(self.config.retained_effects);
        if !expired.is_empty() || trimmed > 0 {
            debug!(blocks = expired.len(), effects = trimmed, "Pruned finalized state");
        }
        expired.len()
    }

    // === QUERIES ===

    pub fn validator(&self, id: &str) -> Option<Validator> {
        self.state.lock().validators.get(id).cloned()
    }

    /// All validators in id order, active or not.
    pub fn validators(&self) -> Vec<Validator> {
        self.state.lock().validators.values().cloned().collect()
    }

    pub fn active_power(&self) -> u128 {
        self.state.lock().active_power()
    }

    pub fn block_status(&self, block: &Hash) -> Option<BlockStatus> {
        let state = self.state.lock();
        if state.settled.contains(block) {
            return Some(BlockStatus::Finalized);
        }
        state.blocks.get(block).map(|v| v.status)
    }

    pub fn block_votes(&self, block: &Hash) -> Option<BlockVotes> {
        self.state.lock().blocks.get(block).cloned()
    }

    /// Blocks with votes but no finalization, oldest first.
    pub fn pending_blocks(&self) -> Vec<Hash> {
        let state = self.state.lock();
        let mut pending: Vec<&BlockVotes> = state
            .blocks
            .values()
            .filter(|v| v.status == BlockStatus::Pending)
            .collect();
        pending.sort_by_key(|v| (v.first_seen, v.height, v.block));
        pending.into_iter().map(|v| v.block).collect()
    }

    pub fn balance(&self, account: &Address) -> u128 {
        self.state.lock().ledger.balance(account)
    }

    pub fn effects(&self) -> Vec<LedgerEffect> {
        self.state.lock().ledger.effects()
    }

    /// Take the equivocation evidence gathered so far.
    pub fn drain_evidence(&self) -> Vec<Equivocation> {
        std::mem::take(&mut self.state.lock().evidence)
    }

    pub fn stats(&self) -> ConsensusStats {
        let state = self.state.lock();
        let finalized_blocks = state.blocks.values().filter(|v| v.is_finalized()).count();
        ConsensusStats {
            validators: state.validators.len(),
            active_validators: state.validators.values().filter(|v| v.is_active).count(),
            active_power: state.active_power(),
            pending_blocks: state.blocks.len() - finalized_blocks,
            finalized_blocks: finalized_blocks + state.settled.len(),
        }
    }

    // === PERSISTENCE ===

    fn persist_finalization(&self, finalization: &Finalization, seq: usize) -> ConsensusResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        let key = format!("{FINALIZED_KEY_PREFIX}{}", hash_hex(&finalization.block));
        store.set(key.as_bytes(), &encode(finalization)?)?;
        self.persist_effects(seq, &finalization.effects)
    }

    fn persist_effects(&self, first_seq: usize, effects: &[LedgerEffect]) -> ConsensusResult<()> {
        let Some(store) = &self.store else {
            return Ok(());
        };
        for (offset, effect) in effects.iter().enumerate() {
            let key = format!("{EFFECT_KEY_PREFIX}{:020}", first_seq + offset);
            store.set(key.as_bytes(), &encode(effect)?)?;
        }
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> ConsensusResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ConsensusError::Encoding(e.to_string()))
}

/// Stateless checks: hash, vote signature, proof of work, transactions.
fn check_block(
    block: &Block,
    public_key: &PublicKey,
    signature: &Signature,
    validator_id: &str,
) -> ConsensusResult<()> {
    if !block.verify_hash() {
        return Err(ConsensusError::BadHash(block.hash));
    }
    verify_vote(public_key, &block.hash, signature).map_err(|_| ConsensusError::BadSignature {
        validator: validator_id.to_string(),
        block: block.hash,
    })?;
    if !block.verify_pow() {
        return Err(ConsensusError::BadPoW {
            block: block.hash,
            difficulty: block.header.difficulty,
        });
    }
    if !block.verify_merkle_root() {
        return Err(ConsensusError::BadTransaction {
            block: block.hash,
            reason: "merkle root does not match transactions".into(),
        });
    }
    if let Some(index) = block
        .transactions
        .iter()
        .position(|tx| !tx.is_structurally_sound())
    {
        return Err(ConsensusError::BadTransaction {
            block: block.hash,
            reason: format!("transaction {index} is not structurally sound"),
        });
    }
    Ok(())
}
