//! HTTP clients: directory access and hop-to-hop forwarding
//!
//! All calls are single-shot. The protocol has no retries and no
//! timeouts: a failed forward is reported locally at the failing hop and
//! nowhere else.

use crate::api::{MessageRequest, NodeEntry, NodeList};
use thiserror::Error;
use tracing::debug;
use veil_core::types::HopAddr;

/// Single-host simulation: every node binds a port on loopback.
const HOST: &str = "127.0.0.1";

/// Networking errors
#[derive(Debug, Error)]
pub enum NetError {
    /// The HTTP exchange itself failed (connect, I/O, bad body)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The peer answered with a non-success status
    #[error("request rejected with status {status}: {detail}")]
    Rejected { status: u16, detail: String },
}

pub type Result<T> = std::result::Result<T, NetError>;

async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(NetError::Rejected {
            status: status.as_u16(),
            detail: resp.text().await.unwrap_or_default(),
        })
    }
}

/// Client for the directory daemon
#[derive(Debug, Clone)]
pub struct RegistryClient {
    base: String,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            http: reqwest::Client::new(),
        }
    }

    /// Publish a relay's public key to the directory
    pub async fn register(&self, entry: &NodeEntry) -> Result<()> {
        let url = format!("{}/nodes", self.base);
        debug!(node_id = entry.node_id, %url, "registering node");
        check(self.http.post(url).json(entry).send().await?).await?;
        Ok(())
    }

    /// Fetch the full directory listing
    pub async fn nodes(&self) -> Result<Vec<NodeEntry>> {
        let url = format!("{}/nodes", self.base);
        let resp = check(self.http.get(url).send().await?).await?;
        let list: NodeList = resp.json().await?;
        Ok(list.nodes)
    }
}

/// Client for pushing a message to the next hop's `/message` endpoint
#[derive(Debug, Clone, Default)]
pub struct ForwardClient {
    http: reqwest::Client,
}

impl ForwardClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Blocking hop semantics: this future resolves once the destination
    /// has accepted (or refused) the message, and that is the only
    /// acknowledgment the chain ever produces.
    pub async fn forward(&self, dest: HopAddr, message: &str) -> Result<()> {
        let url = format!("http://{HOST}:{}/message", dest.port());
        debug!(%dest, "forwarding message");
        let body = MessageRequest {
            message: message.to_string(),
        };
        check(self.http.post(url).json(&body).send().await?).await?;
        Ok(())
    }
}
