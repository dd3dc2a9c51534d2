//! Scripted Session
//!
//! In-memory host used by the replay binary and by tests. State is set
//! explicitly and every selection request is recorded.
//!
//! Like a real client, variables that were never set read as 0. Only ids
//! outside the session's variable table are unknown.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::{
    DialogOption, Icon, IconResolver, ItemId, OptionHandle, SessionError, SessionState,
    VariableChanged, VariableId, WidgetLoaded, DIALOG_OPTIONS_GROUP_ID,
};

#[derive(Default)]
struct ScriptedState {
    logged_in: bool,
    /// Exclusive upper bound on variable ids, if the table has one
    variable_limit: Option<VariableId>,
    variables: HashMap<VariableId, i32>,
    dialog: Vec<DialogOption>,
    selections: Vec<DialogOption>,
    icons: HashMap<ItemId, Icon>,
    quest_tab: Option<Icon>,
    icon_lookups: usize,
}

/// A session whose state is driven by hand
pub struct ScriptedSession {
    state: Mutex<ScriptedState>,
}

impl ScriptedSession {
    /// A logged-in session where every non-negative variable id exists
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScriptedState {
                logged_in: true,
                ..ScriptedState::default()
            }),
        }
    }

    /// A logged-in session whose variable table holds ids `0..limit`
    pub fn with_variable_limit(limit: VariableId) -> Self {
        let session = Self::new();
        session.state().variable_limit = Some(limit);
        session
    }

    fn state(&self) -> MutexGuard<'_, ScriptedState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// While logged out every read reports the state as not ready
    pub fn set_logged_in(&self, logged_in: bool) {
        self.state().logged_in = logged_in;
    }

    /// Set a variable, returning the event the host would push
    pub fn set_variable(&self, id: VariableId, value: i32) -> VariableChanged {
        self.state().variables.insert(id, value);
        VariableChanged {
            variable_id: id,
            new_value: value,
        }
    }

    /// Show a dialog with the given option texts, returning the widget load
    /// event the host would push
    pub fn show_dialog<S: AsRef<str>>(&self, options: &[S]) -> WidgetLoaded {
        let mut state = self.state();
        state.dialog = options
            .iter()
            .enumerate()
            .map(|(i, text)| DialogOption::new(text.as_ref(), OptionHandle(i as u32)))
            .collect();
        WidgetLoaded {
            group_id: DIALOG_OPTIONS_GROUP_ID,
        }
    }

    pub fn close_dialog(&self) {
        self.state().dialog.clear();
    }

    /// Options selected so far, in request order
    pub fn selections(&self) -> Vec<DialogOption> {
        self.state().selections.clone()
    }

    /// Texts of the options selected so far
    pub fn selected_texts(&self) -> Vec<String> {
        self.state().selections.iter().map(|o| o.text.clone()).collect()
    }

    pub fn clear_selections(&self) {
        self.state().selections.clear();
    }

    pub fn add_icon(&self, item_id: ItemId, icon: Icon) {
        self.state().icons.insert(item_id, icon);
    }

    pub fn set_quest_tab_sprite(&self, icon: Icon) {
        self.state().quest_tab = Some(icon);
    }

    /// How many item icon lookups have been made
    pub fn icon_lookups(&self) -> usize {
        self.state().icon_lookups
    }
}

impl Default for ScriptedSession {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState for ScriptedSession {
    fn variable_value(&self, id: VariableId) -> Result<i32, SessionError> {
        let state = self.state();
        if !state.logged_in {
            return Err(SessionError::NotReady);
        }
        if id < 0 || state.variable_limit.is_some_and(|limit| id >= limit) {
            return Err(SessionError::UnknownVariable(id));
        }
        Ok(state.variables.get(&id).copied().unwrap_or(0))
    }

    fn dialog_options(&self) -> Result<Vec<DialogOption>, SessionError> {
        let state = self.state();
        if !state.logged_in {
            return Err(SessionError::DialogUnavailable);
        }
        Ok(state.dialog.clone())
    }

    fn select_dialog_option(&self, handle: OptionHandle) {
        let mut state = self.state();
        let option = state.dialog.iter().find(|o| o.handle == handle).cloned();
        match option {
            Some(option) => {
                debug!("Selecting dialog option '{}'", option.text);
                state.selections.push(option);
            }
            None => debug!("Dialog option {:?} is no longer shown", handle),
        }
    }
}

impl IconResolver for ScriptedSession {
    fn resolve_icon(&self, item_id: ItemId) -> Option<Icon> {
        let mut state = self.state();
        state.icon_lookups += 1;
        state.icons.get(&item_id).cloned()
    }

    fn quest_tab_sprite(&self) -> Option<Icon> {
        self.state().quest_tab.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_reads() {
        let session = ScriptedSession::new();
        assert_eq!(session.variable_value(29), Ok(0));
        assert_eq!(session.variable_value(-1), Err(SessionError::UnknownVariable(-1)));

        let event = session.set_variable(29, 3);
        assert_eq!(event.new_value, 3);
        assert_eq!(session.variable_value(29), Ok(3));

        session.set_logged_in(false);
        assert_eq!(session.variable_value(29), Err(SessionError::NotReady));
    }

    #[test]
    fn test_variable_limit() {
        let session = ScriptedSession::with_variable_limit(100);
        assert_eq!(session.variable_value(99), Ok(0));
        assert_eq!(session.variable_value(100), Err(SessionError::UnknownVariable(100)));
    }

    #[test]
    fn test_selection_recorded() {
        let session = ScriptedSession::new();
        let event = session.show_dialog(&["Yes", "No"]);
        assert!(event.is_dialog_options());

        session.select_dialog_option(OptionHandle(1));
        session.select_dialog_option(OptionHandle(7));
        assert_eq!(session.selected_texts(), vec!["No".to_string()]);
    }
}
