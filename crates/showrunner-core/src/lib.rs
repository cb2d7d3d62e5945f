//! Showrunner Core — shared domain model and store contracts.
//!
//! This crate defines the persisted record types, the scene-intent status
//! machine, the derived run phase, and the traits that the store and engine
//! crates depend on. It contains no infrastructure code.

pub mod error;
pub mod feed;
pub mod intent;
pub mod job;
pub mod narrative;
pub mod phase;
pub mod repair;
pub mod scene;
pub mod services;
pub mod store;
