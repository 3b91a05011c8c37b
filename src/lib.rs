#![forbid(unsafe_code)]

//! Visit notification relay: an HTTP surface for visiting client pages,
//! a Slack operator channel with remote-control buttons, and a shared
//! TTL hand-off store connecting the two.

pub mod catalog;
pub mod config;
pub mod errors;
pub mod geo;
pub mod http;
pub mod models;
pub mod persistence;
pub mod slack;

pub use config::GlobalConfig;
pub use errors::{AppError, Result};
