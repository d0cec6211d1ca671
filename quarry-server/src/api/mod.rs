//! REST API server module.
//!
//! Provides the analysis endpoint plus health probes.

pub mod error;
pub mod models;
pub mod routes;
pub mod server;

pub use server::ApiServer;
