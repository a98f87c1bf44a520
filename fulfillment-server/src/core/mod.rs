//! Core server infrastructure
//!
//! Configuration, shared state, router assembly, and background tasks.

pub mod config;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::Config;
pub use state::ServerState;
