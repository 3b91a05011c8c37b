//! Visitor-facing HTTP surface modules.

pub mod routes;
pub mod server;
