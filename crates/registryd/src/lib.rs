//! registryd library: node directory and its HTTP surface

pub mod config;
pub mod registry;
pub mod server;
