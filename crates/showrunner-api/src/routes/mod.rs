//! Route modules.

pub mod generation;
pub mod health;
