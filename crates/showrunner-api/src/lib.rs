//! HTTP API for the Showrunner generation engine.

pub mod error;
pub mod routes;
pub mod state;
pub mod telemetry;
