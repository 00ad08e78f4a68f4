//! Circuit selection
//!
//! A circuit is an ordered sequence of exactly three distinct relay ids,
//! chosen fresh for every outgoing message and never reused. Selection
//! must be an unbiased shuffle: circuit secrecy depends on every ordered
//! triple being equally likely.

use crate::error::{Error, Result};
use crate::types::{NodeId, CIRCUIT_LEN};
use rand::seq::SliceRandom;
use rand::Rng;

/// An ordered three-hop relay path for one message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Circuit {
    hops: [NodeId; CIRCUIT_LEN],
}

impl Circuit {
    pub fn hops(&self) -> &[NodeId] {
        &self.hops
    }

    /// Relay id at hop index `i` (0 = entry hop)
    pub fn hop(&self, i: usize) -> NodeId {
        self.hops[i]
    }

    /// Entry relay: the hop the sender dispatches the envelope to
    pub fn first(&self) -> NodeId {
        self.hops[0]
    }
}

/// Build a circuit from the directory's node ids.
pub fn build_circuit(nodes: &[NodeId]) -> Result<Circuit> {
    build_circuit_with(nodes, &mut rand::thread_rng())
}

/// Build a circuit with a caller-supplied RNG (seeded in tests).
///
/// Duplicate ids in the input are collapsed first; the shuffle is then a
/// Fisher-Yates permutation of the distinct set, truncated to three hops.
pub fn build_circuit_with<R: Rng + ?Sized>(nodes: &[NodeId], rng: &mut R) -> Result<Circuit> {
    let mut pool = nodes.to_vec();
    pool.sort_unstable();
    pool.dedup();

    if pool.len() < CIRCUIT_LEN {
        return Err(Error::InsufficientNodes {
            available: pool.len(),
        });
    }

    pool.shuffle(rng);
    Ok(Circuit {
        hops: [pool[0], pool[1], pool[2]],
    })
}
