//! userd library: sender pipeline, recipient slot, and HTTP surface

pub mod config;
pub mod server;
pub mod user;
