//! Session context: the single source of truth for "what just happened"

pub mod shared;
pub mod store;

pub use shared::SharedContext;
pub use store::{ContextFact, ContextStore, TurnRecord};
