//! The closed set of desktop actions and their handlers

pub mod args;
pub mod catalog;
pub mod handlers;

pub use args::ActionArgs;
pub use catalog::{ActionCatalog, ActionCategory, ActionId, Arity, CatalogEntry, Handler};
