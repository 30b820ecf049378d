//! NEO - voice/text desktop automation agent
//!
//! Compiles a natural-language command into a validated action plan and
//! runs it against the desktop.

pub mod actions;
pub mod agent;
pub mod command;
pub mod context;
pub mod control;
pub mod core;
pub mod llm;

pub use agent::{Agent, PlanSource, PlannedCommand, TurnError, TurnOutcome};
