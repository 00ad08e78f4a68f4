//! relayd library: per-relay peeling context and HTTP surface

pub mod config;
pub mod relay;
pub mod server;
