//! Shared test mocks and utilities for the Showrunner backend.

mod fixtures;
mod services;
mod store;

pub use fixtures::{dispatch_job, narrative_state, scene_fixture, scene_intent, scene_repair};
pub use services::{ScriptedCompiler, ScriptedPlanner, ScriptedWriter, WriterBehavior};
pub use store::InMemoryStore;
