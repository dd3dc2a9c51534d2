//! Conditions
//!
//! Boolean predicates over session state. Steps use them to lock themselves
//! and containers use them to tell when a substep is done.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::session::{SessionError, SessionState, VariableId};

/// A predicate evaluated on demand against the live session
///
/// Implementations must be side-effect free.
pub trait Condition: Send + Sync + fmt::Debug {
    fn evaluate(&self, session: &dyn SessionState) -> Result<bool, SessionError>;
}

/// Shared handle to a condition; one condition may gate several steps
pub type ConditionRef = Arc<dyn Condition>;

/// How a variable is compared against a fixed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Comparison {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "eq" | "==" | "equal" => Some(Comparison::Equal),
            "ne" | "!=" | "not_equal" => Some(Comparison::NotEqual),
            "lt" | "<" => Some(Comparison::Less),
            "le" | "<=" => Some(Comparison::LessOrEqual),
            "gt" | ">" => Some(Comparison::Greater),
            "ge" | ">=" => Some(Comparison::GreaterOrEqual),
            _ => None,
        }
    }

    pub fn apply(self, lhs: i32, rhs: i32) -> bool {
        match self {
            Comparison::Equal => lhs == rhs,
            Comparison::NotEqual => lhs != rhs,
            Comparison::Less => lhs < rhs,
            Comparison::LessOrEqual => lhs <= rhs,
            Comparison::Greater => lhs > rhs,
            Comparison::GreaterOrEqual => lhs >= rhs,
        }
    }
}

/// Compares one session variable against a constant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableCondition {
    pub variable: VariableId,
    pub comparison: Comparison,
    pub value: i32,
}

impl VariableCondition {
    pub fn new(variable: VariableId, comparison: Comparison, value: i32) -> Self {
        Self {
            variable,
            comparison,
            value,
        }
    }

    pub fn equals(variable: VariableId, value: i32) -> Self {
        Self::new(variable, Comparison::Equal, value)
    }

    pub fn at_least(variable: VariableId, value: i32) -> Self {
        Self::new(variable, Comparison::GreaterOrEqual, value)
    }
}

impl Condition for VariableCondition {
    fn evaluate(&self, session: &dyn SessionState) -> Result<bool, SessionError> {
        let current = session.variable_value(self.variable)?;
        Ok(self.comparison.apply(current, self.value))
    }
}

/// True when every inner condition is true (empty = true)
#[derive(Debug, Clone)]
pub struct AllOf(pub Vec<ConditionRef>);

impl Condition for AllOf {
    fn evaluate(&self, session: &dyn SessionState) -> Result<bool, SessionError> {
        for condition in &self.0 {
            if !condition.evaluate(session)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// True when any inner condition is true (empty = false)
#[derive(Debug, Clone)]
pub struct AnyOf(pub Vec<ConditionRef>);

impl Condition for AnyOf {
    fn evaluate(&self, session: &dyn SessionState) -> Result<bool, SessionError> {
        for condition in &self.0 {
            if condition.evaluate(session)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[derive(Debug, Clone)]
pub struct Not(pub ConditionRef);

impl Condition for Not {
    fn evaluate(&self, session: &dyn SessionState) -> Result<bool, SessionError> {
        Ok(!self.0.evaluate(session)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScriptedSession;

    #[test]
    fn test_comparison_parsing() {
        assert_eq!(Comparison::from_str("ge"), Some(Comparison::GreaterOrEqual));
        assert_eq!(Comparison::from_str("=="), Some(Comparison::Equal));
        assert_eq!(Comparison::from_str("LT"), Some(Comparison::Less));
        assert_eq!(Comparison::from_str("between"), None);
    }

    #[test]
    fn test_variable_condition() {
        let session = ScriptedSession::with_variable_limit(100);
        session.set_variable(29, 2);

        assert!(VariableCondition::at_least(29, 2).evaluate(&session).unwrap());
        assert!(!VariableCondition::equals(29, 3).evaluate(&session).unwrap());
        assert!(VariableCondition::equals(30, 0).evaluate(&session).unwrap());
        assert_eq!(
            VariableCondition::equals(130, 0).evaluate(&session),
            Err(SessionError::UnknownVariable(130))
        );
    }

    #[test]
    fn test_combinators() {
        let session = ScriptedSession::new();
        session.set_variable(1, 5);
        session.set_variable(2, 0);

        let high: ConditionRef = Arc::new(VariableCondition::at_least(1, 5));
        let started: ConditionRef = Arc::new(VariableCondition::new(2, Comparison::Greater, 0));

        assert!(!AllOf(vec![high.clone(), started.clone()]).evaluate(&session).unwrap());
        assert!(AnyOf(vec![high.clone(), started.clone()]).evaluate(&session).unwrap());
        assert!(Not(started).evaluate(&session).unwrap());
        assert!(AllOf(Vec::new()).evaluate(&session).unwrap());
        assert!(!AnyOf(Vec::new()).evaluate(&session).unwrap());
    }

    #[test]
    fn test_errors_propagate_through_combinators() {
        let session = ScriptedSession::new();
        session.set_logged_in(false);
        let inner: ConditionRef = Arc::new(VariableCondition::equals(1, 1));
        assert_eq!(Not(inner).evaluate(&session), Err(SessionError::NotReady));
    }
}
