//! userd HTTP surface
//!
//! `/send-message` runs the sender pipeline; success means only that hop
//! 0 accepted the envelope — the sender never learns about later hops.
//! `/message` is the recipient slot for final deliveries.

use crate::user::{prepare_envelope, UserNode};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::{info, warn};
use veil_core::types::{HopAddr, NodeId};
use veil_core::Error;
use veil_net::api::{DebugValue, ErrorBody, MessageRequest, SendMessageRequest};
use veil_net::{ForwardClient, RegistryClient};

/// Shared handler context
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<UserNode>,
    pub registry: RegistryClient,
    pub forwarder: ForwardClient,
}

pub fn router(node: Arc<UserNode>, registry: RegistryClient, forwarder: ForwardClient) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/message", post(receive_message))
        .route("/send-message", post(send_message))
        .route("/last-received-message", get(last_received))
        .route("/last-sent-message", get(last_sent))
        .route("/last-circuit", get(last_circuit))
        .with_state(AppState {
            node,
            registry,
            forwarder,
        })
}

async fn status() -> &'static str {
    "live"
}

async fn receive_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> StatusCode {
    state.node.record_received(req.message);
    StatusCode::OK
}

async fn send_message(
    State(state): State<AppState>,
    Json(req): Json<SendMessageRequest>,
) -> Response {
    let nodes = match state.registry.nodes().await {
        Ok(nodes) => nodes,
        Err(e) => {
            warn!("directory unavailable: {e}");
            return (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody::new(format!("directory unavailable: {e}"))),
            )
                .into_response();
        }
    };

    let (circuit, envelope) = match prepare_envelope(&nodes, &req.message, req.destination_user_id)
    {
        Ok(prepared) => prepared,
        Err(e) => {
            warn!("cannot build envelope: {e}");
            return (send_error_status(&e), Json(ErrorBody::new(e.to_string()))).into_response();
        }
    };
    state.node.record_circuit(&circuit);

    let entry = match HopAddr::relay(circuit.first()) {
        Ok(entry) => entry,
        Err(e) => {
            warn!("directory returned an unroutable entry hop: {e}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody::new(e.to_string())),
            )
                .into_response();
        }
    };
    match state.forwarder.forward(entry, envelope.as_str()).await {
        Ok(()) => {
            info!(
                user_id = state.node.user_id(),
                destination = req.destination_user_id,
                entry_hop = circuit.first(),
                "message dispatched"
            );
            state.node.record_sent(req.message);
            StatusCode::OK.into_response()
        }
        Err(e) => {
            // The only forwarding failure a sender ever sees: hop 0.
            warn!(%entry, "dispatch failed: {e}");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody::new(format!("dispatch to {entry} failed: {e}"))),
            )
                .into_response()
        }
    }
}

fn send_error_status(error: &Error) -> StatusCode {
    match error {
        // The caller named a recipient outside the user address range.
        Error::AddressOutOfRange { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn last_received(State(state): State<AppState>) -> Json<DebugValue<String>> {
    Json(DebugValue::of(state.node.state().last_received_message))
}

async fn last_sent(State(state): State<AppState>) -> Json<DebugValue<String>> {
    Json(DebugValue::of(state.node.state().last_sent_message))
}

async fn last_circuit(State(state): State<AppState>) -> Json<DebugValue<Vec<NodeId>>> {
    Json(DebugValue::of(state.node.state().last_circuit))
}
