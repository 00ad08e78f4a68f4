//! userd - VeilRoute user node daemon
//!
//! Originates onion-routed messages through a fresh three-relay circuit
//! and accepts final deliveries on USER_BASE + user_id.

use clap::Parser;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use userd::config::Config;
use userd::server;
use userd::user::UserNode;
use veil_net::{ForwardClient, RegistryClient};

fn init_tracing(config: &Config) {
    let filter = EnvFilter::from_default_env().add_directive(
        if config.verbose {
            "userd=debug"
        } else {
            "userd=info"
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
        "userd v{} - VeilRoute user node (user {})",
        env!("CARGO_PKG_VERSION"),
        config.user_id
    );

    let node = match UserNode::new(config.user_id) {
        Ok(node) => Arc::new(node),
        Err(e) => {
            error!("invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    let registry = RegistryClient::new(config.registry_url.clone());
    let app = server::router(node.clone(), registry, ForwardClient::new());

    let addr = SocketAddr::from(([127, 0, 0, 1], node.addr().port()));
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
