//! Quest Helper
//!
//! Step and condition engine for in-game quest guidance. Quests are trees of
//! steps; the engine tracks which step is active from session state, follows
//! cutscenes, and picks registered dialog options when they appear.

pub mod condition;
pub mod config;
pub mod hint;
pub mod quest;
pub mod replay;
pub mod session;
pub mod step;

#[cfg(test)]
pub(crate) mod testing;

pub use condition::{Condition, ConditionRef};
pub use config::EngineConfig;
pub use quest::{QuestHelper, QuestInfo, QuestRegistry};
pub use step::QuestStep;
