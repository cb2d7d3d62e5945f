//! HTTP clients for the remote generation backend.
//!
//! One [`BackendClient`] implements all three collaborator contracts from
//! `showrunner-core`. Responses are acknowledgements; generation progress is
//! observed through the store, never through these calls.

pub mod client;
pub mod config;

pub use client::BackendClient;
pub use config::RpcConfig;
