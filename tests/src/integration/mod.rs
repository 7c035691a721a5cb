//! # Integration Flows

pub mod fixtures;

#[cfg(test)]
mod consensus_flow;
#[cfg(test)]
mod fork_flow;
#[cfg(test)]
mod gossip_flow;
#[cfg(test)]
mod mining_flow;
#[cfg(test)]
mod sync_flow;
