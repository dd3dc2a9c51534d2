//! Quest Module
//!
//! TOML quest definitions, the registry that loads them, and the live
//! helper that turns a definition into a step tree.

pub mod definition;
pub mod helper;
pub mod registry;

pub use definition::{ConditionDefinition, QuestDefinition, StepDefinition};
pub use helper::{QuestHelper, QuestInfo};
pub use registry::QuestRegistry;
