//! Quest Definition Structures
//!
//! These structures are deserialized from TOML quest files.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::condition::{AllOf, AnyOf, Comparison, ConditionRef, Not, VariableCondition};
use crate::session::{ItemId, VariableId};

/// A quest definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Top-level steps in order
    #[serde(default)]
    pub steps: Vec<RawStep>,
}

/// Raw step as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawStep {
    pub id: String,
    pub text: String,
    /// Item id whose image decorates the step
    pub icon: Option<ItemId>,
    /// Dialog options to pick while this step is live
    #[serde(default)]
    pub dialog: Vec<String>,
    #[serde(default = "default_true")]
    pub show_in_sidebar: bool,
    #[serde(default)]
    pub lockable: bool,
    pub locked_when: Option<RawCondition>,
    pub done_when: Option<RawCondition>,
    #[serde(default)]
    pub substeps: Vec<RawStep>,
}

fn default_true() -> bool {
    true
}

/// Raw condition as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawCondition {
    Variable {
        id: VariableId,
        #[serde(default = "default_op")]
        op: String,
        value: i32,
    },
    All {
        of: Vec<RawCondition>,
    },
    Any {
        of: Vec<RawCondition>,
    },
    Not {
        condition: Box<RawCondition>,
    },
}

fn default_op() -> String {
    "eq".to_string()
}

// ============================================================================
// Resolved Quest Structures (after parsing)
// ============================================================================

/// A validated condition tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ConditionDefinition {
    Variable {
        id: VariableId,
        comparison: Comparison,
        value: i32,
    },
    All(Vec<ConditionDefinition>),
    Any(Vec<ConditionDefinition>),
    Not(Box<ConditionDefinition>),
}

impl ConditionDefinition {
    pub fn from_raw(raw: &RawCondition) -> Result<Self, String> {
        match raw {
            RawCondition::Variable { id, op, value } => {
                let comparison = Comparison::from_str(op)
                    .ok_or_else(|| format!("Invalid comparison '{}' for variable {}", op, id))?;
                Ok(ConditionDefinition::Variable {
                    id: *id,
                    comparison,
                    value: *value,
                })
            }
            RawCondition::All { of } => Ok(ConditionDefinition::All(Self::all_from_raw(of)?)),
            RawCondition::Any { of } => Ok(ConditionDefinition::Any(Self::all_from_raw(of)?)),
            RawCondition::Not { condition } => {
                Ok(ConditionDefinition::Not(Box::new(Self::from_raw(condition)?)))
            }
        }
    }

    fn all_from_raw(raw: &[RawCondition]) -> Result<Vec<Self>, String> {
        raw.iter().map(Self::from_raw).collect()
    }

    /// Build the runtime condition
    pub fn to_condition(&self) -> ConditionRef {
        match self {
            ConditionDefinition::Variable { id, comparison, value } => {
                Arc::new(VariableCondition::new(*id, *comparison, *value))
            }
            ConditionDefinition::All(inner) => {
                Arc::new(AllOf(inner.iter().map(Self::to_condition).collect()))
            }
            ConditionDefinition::Any(inner) => {
                Arc::new(AnyOf(inner.iter().map(Self::to_condition).collect()))
            }
            ConditionDefinition::Not(inner) => Arc::new(Not(inner.to_condition())),
        }
    }
}

/// A resolved step definition
#[derive(Debug, Clone, Serialize)]
pub struct StepDefinition {
    pub id: String,
    pub text: String,
    pub icon: Option<ItemId>,
    pub dialog: Vec<String>,
    pub show_in_sidebar: bool,
    pub lockable: bool,
    pub locked_when: Option<ConditionDefinition>,
    /// Marks the step finished inside its parent
    pub done_when: Option<ConditionDefinition>,
    pub substeps: Vec<StepDefinition>,
}

impl StepDefinition {
    pub fn from_raw(raw: &RawStep) -> Result<Self, String> {
        if raw.text.trim().is_empty() {
            return Err(format!("Step '{}' has no text", raw.id));
        }

        let locked_when = raw
            .locked_when
            .as_ref()
            .map(ConditionDefinition::from_raw)
            .transpose()
            .map_err(|e| format!("Step '{}' locked_when: {}", raw.id, e))?;
        let done_when = raw
            .done_when
            .as_ref()
            .map(ConditionDefinition::from_raw)
            .transpose()
            .map_err(|e| format!("Step '{}' done_when: {}", raw.id, e))?;

        let substeps = raw
            .substeps
            .iter()
            .map(StepDefinition::from_raw)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: raw.id.clone(),
            text: raw.text.clone(),
            icon: raw.icon,
            dialog: raw.dialog.clone(),
            show_in_sidebar: raw.show_in_sidebar,
            lockable: raw.lockable,
            locked_when,
            done_when,
            substeps,
        })
    }

    /// Depth-first walk over this step and its substeps
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a StepDefinition)) {
        visit(self);
        for substep in &self.substeps {
            substep.walk(visit);
        }
    }
}

/// A fully resolved quest definition
#[derive(Debug, Clone, Serialize)]
pub struct QuestDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<StepDefinition>,
}

impl QuestDefinition {
    /// Create a QuestDefinition from raw TOML data
    pub fn from_raw(raw: &RawQuest) -> Result<Self, String> {
        let steps = raw
            .steps
            .iter()
            .map(StepDefinition::from_raw)
            .collect::<Result<Vec<_>, _>>()?;

        if steps.is_empty() {
            return Err(format!("Quest '{}' has no steps", raw.id));
        }

        let definition = Self {
            id: raw.id.clone(),
            name: raw.name.clone(),
            description: raw.description.clone(),
            steps,
        };

        let mut seen = HashSet::new();
        let mut duplicate = None;
        for step in &definition.steps {
            step.walk(&mut |s| {
                if !seen.insert(s.id.as_str()) && duplicate.is_none() {
                    duplicate = Some(s.id.clone());
                }
            });
        }
        if let Some(id) = duplicate {
            return Err(format!("Quest '{}' has duplicate step id '{}'", raw.id, id));
        }

        Ok(definition)
    }

    /// Get step by ID, searching substeps too
    pub fn get_step(&self, id: &str) -> Option<&StepDefinition> {
        let mut found = None;
        for step in &self.steps {
            step.walk(&mut |s| {
                if found.is_none() && s.id == id {
                    found = Some(s);
                }
            });
        }
        found
    }

    /// Total number of steps including substeps
    pub fn step_count(&self) -> usize {
        let mut count = 0;
        for step in &self.steps {
            step.walk(&mut |_| count += 1);
        }
        count
    }
}
