//! Consensus configuration

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConsensusConfig {
    /// Minimum stake to register and to stay active after a slash
    pub min_stake: u128,

    /// `vote_power = stake / vote_power_divisor`
    pub vote_power_divisor: u128,

    /// Paid to the block's miner on finalization
    pub miner_reward: u128,

    /// Paid to each yes-voter on finalization
    pub vote_reward: u128,

    /// Stake deducted per slash, capped at the current stake
    pub slash_penalty: u128,

    /// Reputation below which a slashed validator is deactivated
    pub min_reputation: u8,

    /// Ledger effects kept in memory after a prune; older ones live only in
    /// the store
    pub retained_effects: usize,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            min_stake: 1_000,
            vote_power_divisor: 100,
            miner_reward: 50,
            vote_reward: 5,
            slash_penalty: 100,
            min_reputation: 10,
            retained_effects: 10_000,
        }
    }
}

impl ConsensusConfig {
    pub fn vote_power(&self, stake: u128) -> u128 {
        stake.checked_div(self.vote_power_divisor).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vote_power() {
        let config = ConsensusConfig::default();
        assert_eq!(config.vote_power(1_000), 10);
        assert_eq!(config.vote_power(199), 1);

        let broken = ConsensusConfig {
            vote_power_divisor: 0,
            ..config
        };
        assert_eq!(broken.vote_power(1_000), 0);
    }
}
