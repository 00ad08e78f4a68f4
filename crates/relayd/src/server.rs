//! relayd HTTP surface
//!
//! `/message` is the protocol endpoint: peel one layer, then forward the
//! remainder (or deliver the final plaintext) before responding. The
//! response acknowledges "accepted and attempted to forward" only; no
//! end-to-end signal exists.

use crate::relay::RelayNode;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tracing::warn;
use veil_core::{Error, Peeled};
use veil_net::api::{DebugValue, ErrorBody, MessageRequest};
use veil_net::ForwardClient;

/// Shared handler context
#[derive(Clone)]
pub struct AppState {
    pub node: Arc<RelayNode>,
    pub forwarder: ForwardClient,
}

pub fn router(node: Arc<RelayNode>, forwarder: ForwardClient) -> Router {
    Router::new()
        .route("/status", get(status))
        .route("/message", post(handle_message))
        .route(
            "/last-received-encrypted-message",
            get(last_received_encrypted),
        )
        .route(
            "/last-received-decrypted-message",
            get(last_received_decrypted),
        )
        .route("/last-message-destination", get(last_destination))
        .with_state(AppState { node, forwarder })
}

async fn status() -> &'static str {
    "live"
}

async fn handle_message(
    State(state): State<AppState>,
    Json(req): Json<MessageRequest>,
) -> Response {
    let peeled = match state.node.peel(&req.message) {
        Ok(peeled) => peeled,
        Err(e) => {
            warn!(node_id = state.node.node_id(), "peel failed: {e}");
            return (peel_error_status(&e), Json(ErrorBody::new(e.to_string()))).into_response();
        }
    };

    // Synchronous hop chain: the outbound call completes before we answer
    // the previous hop.
    let (dest, outbound) = match &peeled {
        Peeled::Forward { next_hop, envelope } => (*next_hop, envelope.as_str().to_string()),
        Peeled::Deliver {
            recipient,
            plaintext,
        } => (*recipient, plaintext.clone()),
    };

    match state.forwarder.forward(dest, &outbound).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            warn!(node_id = state.node.node_id(), %dest, "forwarding failed: {e}");
            (
                StatusCode::BAD_GATEWAY,
                Json(ErrorBody::new(format!("forwarding to {dest} failed: {e}"))),
            )
                .into_response()
        }
    }
}

fn peel_error_status(error: &Error) -> StatusCode {
    match error {
        Error::MalformedEnvelope { .. }
        | Error::InvalidDestinationFormat(_)
        | Error::Decryption => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn last_received_encrypted(State(state): State<AppState>) -> Json<DebugValue<String>> {
    Json(DebugValue::of(state.node.state().last_received_encrypted))
}

async fn last_received_decrypted(State(state): State<AppState>) -> Json<DebugValue<String>> {
    Json(DebugValue::of(state.node.state().last_received_decrypted))
}

async fn last_destination(State(state): State<AppState>) -> Json<DebugValue<u16>> {
    Json(DebugValue::of(state.node.state().last_destination))
}
