//! Model integration: the LLM is an unreliable oracle
//!
//! Prompts go out through an `LlmBackend`; whatever comes back is
//! recovered by the parser and must still pass the plan validator.

pub mod client;
pub mod context;
pub mod generator;
pub mod lexer;
pub mod parser;

pub use client::{GenerationError, LlmBackend, OllamaProcess};
pub use context::{needs_visual_context, PromptContext};
pub use generator::PlanGenerator;
pub use parser::{extract, extract_plan_json, ExtractError, Extraction};
