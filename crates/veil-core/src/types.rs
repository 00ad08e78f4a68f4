//! Node identifiers and the shared address space
//!
//! Every node is reachable at `role_base + id`, so a destination field
//! inside a layer plaintext is dispatchable by arithmetic alone: no
//! lookup table at any hop.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Port the directory daemon listens on
pub const REGISTRY_PORT: u16 = 8080;

/// Base of the relay address range: relay `n` listens on `RELAY_BASE + n`
pub const RELAY_BASE: u16 = 4000;

/// Base of the user address range: user `n` listens on `USER_BASE + n`.
/// Any destination at or above this base is a final delivery.
pub const USER_BASE: u16 = 8000;

/// Fixed circuit length: every message traverses exactly three relays
pub const CIRCUIT_LEN: usize = 3;

/// Node identifier, unique per role within the directory
pub type NodeId = u16;

/// A network address in the shared `role_base + id` space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HopAddr(u16);

impl HopAddr {
    /// Address of a relay node. Ids that would overflow the port space or
    /// cross into the user range are rejected, never wrapped.
    pub fn relay(id: NodeId) -> Result<Self> {
        match RELAY_BASE.checked_add(id) {
            Some(port) if port < USER_BASE => Ok(Self(port)),
            _ => Err(Error::AddressOutOfRange { role: "relay", id }),
        }
    }

    /// Address of a user node
    pub fn user(id: NodeId) -> Result<Self> {
        USER_BASE
            .checked_add(id)
            .map(Self)
            .ok_or(Error::AddressOutOfRange { role: "user", id })
    }

    /// Reconstruct from a raw port number already known to be in range
    pub fn from_port(port: u16) -> Self {
        Self(port)
    }

    pub fn port(&self) -> u16 {
        self.0
    }

    /// Is this address in the recipient (user) range?
    pub fn is_user(&self) -> bool {
        self.0 >= USER_BASE
    }

    /// The user id, when this address is in the user range
    pub fn user_id(&self) -> Option<NodeId> {
        self.0.checked_sub(USER_BASE)
    }

    /// The relay id, when this address is in the relay range
    pub fn relay_id(&self) -> Option<NodeId> {
        if self.is_user() {
            None
        } else {
            self.0.checked_sub(RELAY_BASE)
        }
    }
}

impl std::fmt::Display for HopAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
