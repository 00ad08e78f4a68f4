//! VeilRoute Core Library
//!
//! This crate provides the protocol logic for the VeilRoute onion overlay:
//! circuit selection, the layered envelope codec, and the per-hop peeling
//! state machine.
//!
//! # Modules
//!
//! - [`types`]: Node identifiers and the shared `role_base + id` address space
//! - [`circuit`]: Unbiased three-hop circuit selection
//! - [`crypto`]: X25519 keypairs, sealed key blocks, per-layer AEAD
//! - [`envelope`]: Envelope layout, onion encoding, and peeling
//! - [`error`]: Error types

pub mod circuit;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod types;

pub use circuit::{build_circuit, Circuit};
pub use envelope::{encode, peel, Envelope, Peeled};
pub use error::{Error, Result};
