//! Configuration for relayd

use clap::Parser;
use veil_core::types::{NodeId, RELAY_BASE, USER_BASE};

/// relayd - VeilRoute onion router daemon
#[derive(Parser, Debug, Clone)]
#[command(name = "relayd")]
#[command(about = "VeilRoute onion router: peels one layer per envelope and forwards")]
pub struct Config {
    /// Relay id; the daemon binds RELAY_BASE + id on loopback
    #[arg(short, long, env = "VEIL_NODE_ID")]
    pub node_id: NodeId,

    /// Directory base URL
    #[arg(long, env = "VEIL_REGISTRY_URL", default_value = "http://127.0.0.1:8080")]
    pub registry_url: String,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log format
    #[arg(long, default_value = "pretty", value_parser = ["pretty", "json"])]
    pub log_format: String,
}

impl Config {
    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if RELAY_BASE as u32 + self.node_id as u32 >= USER_BASE as u32 {
            anyhow::bail!(
                "node id {} leaves the relay address range [{}, {})",
                self.node_id,
                RELAY_BASE,
                USER_BASE
            );
        }
        Ok(())
    }
}
