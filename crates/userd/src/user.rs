//! Sender pipeline and recipient delivery slot
//!
//! A user node both originates messages (build a circuit, onion-encode,
//! dispatch to hop 0) and receives final deliveries. Circuit memory and
//! the last sent/received messages are debug snapshots, last-write-wins.

use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use veil_core::types::{HopAddr, NodeId};
use veil_core::{Circuit, Envelope};
use veil_net::api::NodeEntry;

/// Debug snapshots of a user node
#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub last_received_message: Option<String>,
    pub last_sent_message: Option<String>,
    pub last_circuit: Option<Vec<NodeId>>,
}

/// One user node's context
pub struct UserNode {
    user_id: NodeId,
    addr: HopAddr,
    state: RwLock<UserState>,
}

impl UserNode {
    /// Fails when the id does not fit the user address range.
    pub fn new(user_id: NodeId) -> veil_core::Result<Self> {
        Ok(Self {
            user_id,
            addr: HopAddr::user(user_id)?,
            state: RwLock::new(UserState::default()),
        })
    }

    pub fn user_id(&self) -> NodeId {
        self.user_id
    }

    pub fn addr(&self) -> HopAddr {
        self.addr
    }

    /// Final delivery: the last relay already reversed the text encoding,
    /// so the payload arrives as plain text and is stored as-is.
    pub fn record_received(&self, message: String) {
        debug!(user_id = self.user_id, "message delivered");
        self.state.write().last_received_message = Some(message);
    }

    pub fn record_circuit(&self, circuit: &Circuit) {
        self.state.write().last_circuit = Some(circuit.hops().to_vec());
    }

    pub fn record_sent(&self, message: String) {
        self.state.write().last_sent_message = Some(message);
    }

    pub fn state(&self) -> UserState {
        self.state.read().clone()
    }
}

/// Build a circuit from the directory listing and onion-encode one message.
///
/// The circuit exists only for this one message; the envelope that comes
/// back is what goes to hop 0.
pub fn prepare_envelope(
    nodes: &[NodeEntry],
    message: &str,
    destination: NodeId,
) -> veil_core::Result<(Circuit, Envelope)> {
    let ids: Vec<NodeId> = nodes.iter().map(|n| n.node_id).collect();
    let circuit = veil_core::build_circuit(&ids)?;

    let mut pubkeys = HashMap::with_capacity(nodes.len());
    for entry in nodes {
        let key = veil_core::crypto::decode_public_key(&entry.pub_key)?;
        pubkeys.insert(entry.node_id, key);
    }

    let envelope = veil_core::encode(message, destination, &circuit, &pubkeys)?;
    Ok((circuit, envelope))
}
