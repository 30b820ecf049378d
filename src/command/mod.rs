//! Command pipeline stages
//!
//! command -> ReferenceResolver -> ShortcutMatcher | (LLM -> PlanValidator) -> PlanExecutor

pub mod executor;
pub mod plan;
pub mod resolver;
pub mod shortcuts;
pub mod validator;

pub use executor::{DispatchError, DispatchFailure, ExecutionReport, ExecutionState, PlanExecutor};
pub use plan::{Action, Plan, Value};
pub use resolver::{Antecedent, ReferenceResolver, Resolution};
pub use shortcuts::{ShortcutMatcher, ShortcutRule};
pub use validator::{PlanValidator, ValidationError};
