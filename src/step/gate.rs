//! Condition gate
//!
//! Wraps a condition at the step boundary so evaluation failures never
//! escape: transient failures read as false, and a condition that points at
//! state the session does not have is reported once and then switched off.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};

use crate::condition::ConditionRef;
use crate::session::SessionState;

pub struct ConditionGate {
    condition: ConditionRef,
    misconfigured: AtomicBool,
}

impl ConditionGate {
    pub fn new(condition: ConditionRef) -> Self {
        Self {
            condition,
            misconfigured: AtomicBool::new(false),
        }
    }

    pub fn condition(&self) -> &ConditionRef {
        &self.condition
    }

    /// Whether the condition was disabled after a configuration error
    pub fn is_misconfigured(&self) -> bool {
        self.misconfigured.load(Ordering::Relaxed)
    }

    /// Evaluate, failing open. `owner` names the step in log output.
    pub fn holds(&self, session: &dyn SessionState, owner: &str) -> bool {
        if self.is_misconfigured() {
            return false;
        }

        match self.condition.evaluate(session) {
            Ok(value) => value,
            Err(e) if e.is_transient() => {
                debug!("Condition on '{}' not evaluable yet: {}", owner, e);
                false
            }
            Err(e) => {
                if !self.misconfigured.swap(true, Ordering::Relaxed) {
                    warn!(
                        "Condition on '{}' is misconfigured ({}), ignoring it from now on",
                        owner, e
                    );
                }
                false
            }
        }
    }
}

impl fmt::Debug for ConditionGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConditionGate")
            .field("condition", &self.condition)
            .field("misconfigured", &self.is_misconfigured())
            .finish()
    }
}
