//! registryd HTTP surface

use crate::registry::{NodeRegistry, RegistryError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};
use veil_net::api::{ErrorBody, NodeEntry, NodeList};

/// Build the directory router around its registry context
pub fn router(registry: Arc<NodeRegistry>) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/nodes", get(list_nodes).post(register_node))
        .with_state(registry)
}

async fn status() -> &'static str {
    "live"
}

async fn list_nodes(State(registry): State<Arc<NodeRegistry>>) -> Json<NodeList> {
    Json(NodeList {
        nodes: registry.snapshot(),
    })
}

async fn register_node(
    State(registry): State<Arc<NodeRegistry>>,
    Json(entry): Json<NodeEntry>,
) -> Response {
    let node_id = entry.node_id;
    match registry.register(entry) {
        Ok(()) => {
            info!(node_id, total = registry.len(), "registered relay");
            StatusCode::CREATED.into_response()
        }
        Err(e @ RegistryError::Duplicate(_)) => {
            warn!(node_id, "rejected registration: {e}");
            (StatusCode::CONFLICT, Json(ErrorBody::new(e.to_string()))).into_response()
        }
        Err(e @ (RegistryError::MalformedKey(_) | RegistryError::IdOutOfRange(_))) => {
            warn!(node_id, "rejected registration: {e}");
            (StatusCode::BAD_REQUEST, Json(ErrorBody::new(e.to_string()))).into_response()
        }
    }
}
