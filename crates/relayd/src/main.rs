//! relayd - VeilRoute onion router daemon
//!
//! At startup the relay generates its keypair, publishes the public half
//! to the directory, and serves `/message` on RELAY_BASE + node_id. Each
//! envelope has exactly one layer peeled here before moving on.

use clap::Parser;
use relayd::config::Config;
use relayd::relay::RelayNode;
use relayd::server;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use veil_net::api::NodeEntry;
use veil_net::{ForwardClient, RegistryClient};

fn init_tracing(config: &Config) {
    let filter = EnvFilter::from_default_env().add_directive(
        if config.verbose {
            "relayd=debug"
        } else {
            "relayd=info"
        }
        .parse()
        .unwrap(),
    );
    let base = tracing_subscriber::registry().with(filter);
    if config.log_format == "json" {
        base.with(fmt::layer().json()).init();
    } else {
        base.with(fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();
    init_tracing(&config);

    if let Err(e) = config.validate() {
        error!("invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    info!(
        "relayd v{} - VeilRoute onion router (node {})",
        env!("CARGO_PKG_VERSION"),
        config.node_id
    );

    let node = match RelayNode::new(config.node_id) {
        Ok(node) => Arc::new(node),
        Err(e) => {
            error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    // A relay must be in the directory before it can appear in a circuit.
    let registry = RegistryClient::new(config.registry_url.clone());
    let entry = NodeEntry {
        node_id: node.node_id(),
        pub_key: node.public_key_b64(),
    };
    if let Err(e) = registry.register(&entry).await {
        error!("registration with {} failed: {e}", config.registry_url);
        return ExitCode::FAILURE;
    }
    info!("registered with directory at {}", config.registry_url);

    let addr = SocketAddr::from(([127, 0, 0, 1], node.addr().port()));
    let app = server::router(node, ForwardClient::new());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {addr}: {e}");
            return ExitCode::FAILURE;
        }
    };
    info!("listening on {addr}");

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
