//! Configuration for userd

use clap::Parser;
use veil_core::types::{NodeId, USER_BASE};

/// userd - VeilRoute user node daemon
#[derive(Parser, Debug, Clone)]
#[command(name = "userd")]
#[command(about = "VeilRoute user node: originates onion messages and receives deliveries")]
pub struct Config {
    /// User id; the daemon binds USER_BASE + id on loopback
    #[arg(short, long, env = "VEIL_USER_ID")]
    pub user_id: NodeId,

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
        if USER_BASE.checked_add(self.user_id).is_none() {
            anyhow::bail!("user id {} overflows the user address range", self.user_id);
        }
        Ok(())
    }
}
