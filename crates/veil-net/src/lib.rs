//! VeilRoute Networking
//!
//! Wire types for the HTTP surface shared by all daemons, plus the two
//! clients the overlay needs: one for the directory, one for pushing
//! envelopes between hops.

pub mod api;
pub mod client;

pub use client::{ForwardClient, NetError, RegistryClient};
