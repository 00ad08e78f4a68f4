//! In-memory node directory
//!
//! Entries are immutable once registered and live for the daemon's
//! process lifetime. The registry is an explicit context object owned by
//! the server, not a process-wide map.

use parking_lot::RwLock;
use thiserror::Error;
use veil_core::crypto::decode_public_key;
use veil_core::types::{HopAddr, NodeId};
use veil_net::api::NodeEntry;

/// Registration errors
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("node {0} is already registered")]
    Duplicate(NodeId),
    #[error("node id {0} is outside the relay address range")]
    IdOutOfRange(NodeId),
    #[error("malformed public key: {0}")]
    MalformedKey(String),
}

/// The set of known relays
#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: RwLock<Vec<NodeEntry>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a relay; duplicate ids, ids outside the relay address
    /// range, and undecodable keys are rejected
    pub fn register(&self, entry: NodeEntry) -> Result<(), RegistryError> {
        HopAddr::relay(entry.node_id).map_err(|_| RegistryError::IdOutOfRange(entry.node_id))?;
        decode_public_key(&entry.pub_key)
            .map_err(|e| RegistryError::MalformedKey(e.to_string()))?;

        let mut nodes = self.nodes.write();
        if nodes.iter().any(|n| n.node_id == entry.node_id) {
            return Err(RegistryError::Duplicate(entry.node_id));
        }
        nodes.push(entry);
        Ok(())
    }

    /// Snapshot of the full listing
    pub fn snapshot(&self) -> Vec<NodeEntry> {
        self.nodes.read().clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veil_core::crypto::KeyPair;

    fn entry(id: NodeId) -> NodeEntry {
        NodeEntry {
            node_id: id,
            pub_key: KeyPair::generate().public_key_b64(),
        }
    }

    #[test]
    fn test_register_and_list() {
        let registry = NodeRegistry::new();
        registry.register(entry(1)).unwrap();
        registry.register(entry(2)).unwrap();

        let nodes = registry.snapshot();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].node_id, 1);
        assert_eq!(nodes[1].node_id, 2);
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = NodeRegistry::new();
        registry.register(entry(1)).unwrap();

        let err = registry.register(entry(1)).unwrap_err();
        assert!(matches!(err, RegistryError::Duplicate(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_out_of_range_id_rejected() {
        let registry = NodeRegistry::new();

        // An id this large would wrap the listen port into the user range.
        let err = registry.register(entry(62000)).unwrap_err();
        assert!(matches!(err, RegistryError::IdOutOfRange(62000)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_malformed_key_rejected() {
        let registry = NodeRegistry::new();

        let err = registry
            .register(NodeEntry {
                node_id: 1,
                pub_key: "not base64!!".into(),
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedKey(_)));

        // Valid base64 of the wrong length is still not a key.
        let err = registry
            .register(NodeEntry {
                node_id: 1,
                pub_key: "c2hvcnQ=".into(),
            })
            .unwrap_err();
        assert!(matches!(err, RegistryError::MalformedKey(_)));
        assert!(registry.is_empty());
    }
}
