//! Per-relay peeling context and runtime state
//!
//! The relay owns its keypair and its debug snapshots exclusively; there
//! is no process-wide state. Snapshots are last-write-wins and exist for
//! introspection only — the protocol never reads them back.

use parking_lot::RwLock;
use tracing::debug;
use veil_core::crypto::KeyPair;
use veil_core::types::{HopAddr, NodeId};
use veil_core::{Envelope, Peeled, Result};

/// Most recent (encrypted, decrypted, destination) triple, for the
/// debug endpoints
#[derive(Debug, Clone, Default)]
pub struct RelayState {
    pub last_received_encrypted: Option<String>,
    pub last_received_decrypted: Option<String>,
    pub last_destination: Option<u16>,
}

/// One relay node's context, constructed at startup and passed to every
/// request handler
pub struct RelayNode {
    node_id: NodeId,
    addr: HopAddr,
    keypair: KeyPair,
    state: RwLock<RelayState>,
}

impl RelayNode {
    /// Create a relay with a fresh process-lifetime keypair. Fails when
    /// the id does not fit the relay address range.
    pub fn new(node_id: NodeId) -> Result<Self> {
        Self::with_keypair(node_id, KeyPair::generate())
    }

    /// Create a relay around a known keypair (used in tests)
    pub fn with_keypair(node_id: NodeId, keypair: KeyPair) -> Result<Self> {
        Ok(Self {
            node_id,
            addr: HopAddr::relay(node_id)?,
            keypair,
            state: RwLock::new(RelayState::default()),
        })
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn addr(&self) -> HopAddr {
        self.addr
    }

    /// Public half, in the encoding the directory stores
    pub fn public_key_b64(&self) -> String {
        self.keypair.public_key_b64()
    }

    /// Peel one layer off an incoming envelope, recording the snapshot.
    ///
    /// On error the encrypted snapshot is still recorded but nothing is
    /// forwarded; the failure stays local to this hop.
    pub fn peel(&self, message: &str) -> Result<Peeled> {
        self.state.write().last_received_encrypted = Some(message.to_string());

        let envelope = Envelope::new(message);
        let peeled = veil_core::peel(&envelope, &self.keypair)?;

        let mut state = self.state.write();
        match &peeled {
            Peeled::Forward { next_hop, envelope } => {
                debug!(node_id = self.node_id, dest = %next_hop, "peeled: forwarding");
                state.last_received_decrypted = Some(envelope.as_str().to_string());
                state.last_destination = Some(next_hop.port());
            }
            Peeled::Deliver {
                recipient,
                plaintext,
            } => {
                debug!(node_id = self.node_id, dest = %recipient, "peeled: delivering");
                state.last_received_decrypted = Some(plaintext.clone());
                state.last_destination = Some(recipient.port());
            }
        }

        Ok(peeled)
    }

    /// Snapshot for the debug endpoints
    pub fn state(&self) -> RelayState {
        self.state.read().clone()
    }
}
