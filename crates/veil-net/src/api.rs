//! Wire types for the VeilRoute HTTP surface

use serde::{Deserialize, Serialize};
use veil_core::types::NodeId;

/// A directory entry: relay id plus its base64 X25519 public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeEntry {
    pub node_id: NodeId,
    pub pub_key: String,
}

/// Response body of the directory listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeList {
    pub nodes: Vec<NodeEntry>,
}

/// One envelope (or final payload) pushed to a node's `/message` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub message: String,
}

/// A user node's request to originate a message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    pub destination_user_id: NodeId,
}

/// Debug snapshot wrapper: `{"result": ...}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugValue<T> {
    pub result: Option<T>,
}

impl<T> DebugValue<T> {
    pub fn of(result: Option<T>) -> Self {
        Self { result }
    }
}

/// Uniform error body for non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_entry_field_names() {
        let entry = NodeEntry {
            node_id: 3,
            pub_key: "abc".into(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["node_id"], 3);
        assert_eq!(json["pub_key"], "abc");
    }

    #[test]
    fn test_send_message_round_trip() {
        let req: SendMessageRequest =
            serde_json::from_str(r#"{"message":"hi","destination_user_id":7}"#).unwrap();
        assert_eq!(req.message, "hi");
        assert_eq!(req.destination_user_id, 7);
    }

    #[test]
    fn test_debug_value_null() {
        let json = serde_json::to_string(&DebugValue::<String>::of(None)).unwrap();
        assert_eq!(json, r#"{"result":null}"#);
    }
}
