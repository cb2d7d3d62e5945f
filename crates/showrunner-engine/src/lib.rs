//! Showrunner Engine — the scene generation orchestrator.
//!
//! The [`controller::GenerationController`] drives the pipeline: it calls
//! the planner, dispatches intents to the scene writer, polls the persisted
//! store until each intent settles, and compiles the episode once every
//! intent lands. The [`observer::RealtimeObserver`] mirrors store changes
//! into local counters and, through the controller's watch, turns terminal
//! intent updates into completion checks for batch-dispatched runs.
//! [`integrity::cleanup_orphans`] removes dispatch jobs whose intents no
//! longer exist.

pub mod config;
pub mod controller;
pub mod error;
pub mod integrity;
pub mod observer;
pub mod optimistic;
pub mod progress;
pub mod repair;
pub mod session;
