//! registryd - VeilRoute node directory daemon
//!
//! Tracks which relays exist and their public keys, and answers the
//! sender's "give me all known nodes" query. A circuit can only be built
//! once at least three relays have registered.

use clap::Parser;
use registryd::config::Config;
use registryd::registry::NodeRegistry;
use registryd::server;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(config: &Config) {
    let filter = EnvFilter::from_default_env().add_directive(
        if config.verbose {
            "registryd=debug"
        } else {
            "registryd=info"
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

    info!(
        "registryd v{} - VeilRoute node directory",
        env!("CARGO_PKG_VERSION")
    );

    let registry = Arc::new(NodeRegistry::new());
    let app = server::router(registry);

    let listener = match tokio::net::TcpListener::bind(config.listen).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {e}", config.listen);
            return ExitCode::FAILURE;
        }
    };
    info!("listening on {}", config.listen);

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
