//! Configuration for registryd

use clap::Parser;
use std::net::SocketAddr;

/// registryd - VeilRoute node directory daemon
#[derive(Parser, Debug, Clone)]
#[command(name = "registryd")]
#[command(about = "VeilRoute node directory: tracks relay ids and public keys")]
pub struct Config {
    /// Listen address (default port matches veil_core::types::REGISTRY_PORT)
    #[arg(short, long, default_value = "127.0.0.1:8080")]
    pub listen: SocketAddr,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Log format
    #[arg(long, default_value = "pretty", value_parser = ["pretty", "json"])]
    pub log_format: String,
}
