//! Session Event Types
//!
//! Notifications pushed by the host session that steps react to.

use serde::{Deserialize, Serialize};

use super::VariableId;

/// Widget group id of the dialog options interface.
///
/// Must match the host's UI layout exactly.
pub const DIALOG_OPTIONS_GROUP_ID: i32 = 219;

/// A session variable changed value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableChanged {
    pub variable_id: VariableId,
    pub new_value: i32,
}

/// A UI widget group finished loading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetLoaded {
    pub group_id: i32,
}

impl WidgetLoaded {
    /// Whether this load is the dialog options interface
    pub fn is_dialog_options(&self) -> bool {
        self.group_id == DIALOG_OPTIONS_GROUP_ID
    }
}

/// Events that the router fans out to subscribed steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    VariableChanged(VariableChanged),
    WidgetLoaded(WidgetLoaded),
}

impl SessionEvent {
    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::VariableChanged(_) => "variable_changed",
            SessionEvent::WidgetLoaded(_) => "widget_loaded",
        }
    }

    /// Events with ids outside the host's id space carry no meaning and
    /// are dropped before delivery.
    pub fn is_well_formed(&self) -> bool {
        match self {
            SessionEvent::VariableChanged(e) => e.variable_id >= 0,
            SessionEvent::WidgetLoaded(e) => e.group_id >= 0,
        }
    }
}

impl From<VariableChanged> for SessionEvent {
    fn from(event: VariableChanged) -> Self {
        SessionEvent::VariableChanged(event)
    }
}

impl From<WidgetLoaded> for SessionEvent {
    fn from(event: WidgetLoaded) -> Self {
        SessionEvent::WidgetLoaded(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_group_detection() {
        assert!(WidgetLoaded { group_id: 219 }.is_dialog_options());
        assert!(!WidgetLoaded { group_id: 218 }.is_dialog_options());
    }

    #[test]
    fn test_malformed_events() {
        let bad_var: SessionEvent = VariableChanged { variable_id: -1, new_value: 1 }.into();
        let bad_widget: SessionEvent = WidgetLoaded { group_id: -5 }.into();
        assert!(!bad_var.is_well_formed());
        assert!(!bad_widget.is_well_formed());
        assert!(SessionEvent::from(WidgetLoaded { group_id: 219 }).is_well_formed());
        assert_eq!(bad_widget.event_type(), "widget_loaded");
    }
}
