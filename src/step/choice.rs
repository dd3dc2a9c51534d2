//! Dialog Choice Matching
//!
//! Each step can register dialog option texts. Whenever the dialog options
//! interface reloads, the matcher looks for a registered text among the
//! rendered options and asks the session to select it.

use tracing::debug;

use crate::session::{OptionHandle, SessionState};

/// Per-pass match state of a registered choice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceState {
    Unmatched,
    Matched,
}

/// A dialog option text the step wants picked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogChoice {
    pattern: String,
    state: ChoiceState,
}

impl DialogChoice {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            state: ChoiceState::Unmatched,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn state(&self) -> ChoiceState {
        self.state
    }

    pub fn is_matched(&self) -> bool {
        self.state == ChoiceState::Matched
    }

    /// Case-sensitive exact match
    pub fn matches(&self, option_text: &str) -> bool {
        option_text == self.pattern
    }
}

/// Registered choices of one step, in registration order
#[derive(Debug, Clone, Default)]
pub struct DialogChoices {
    choices: Vec<DialogChoice>,
}

impl DialogChoices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_choice(&mut self, choice: DialogChoice) {
        self.choices.push(choice);
    }

    pub fn iter(&self) -> impl Iterator<Item = &DialogChoice> {
        self.choices.iter()
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Clear match bookkeeping; registrations stay
    pub fn reset_pass(&mut self) {
        for choice in &mut self.choices {
            choice.state = ChoiceState::Unmatched;
        }
    }

    /// Run one matching pass against the rendered options.
    ///
    /// The earliest registered choice that is on screen wins and is the only
    /// one selected. Returns the handle that was selected, if any.
    pub fn check_choices(&mut self, session: &dyn SessionState) -> Option<OptionHandle> {
        self.reset_pass();
        if self.choices.is_empty() {
            return None;
        }

        let options = match session.dialog_options() {
            Ok(options) => options,
            Err(e) => {
                debug!("Skipping dialog match: {}", e);
                return None;
            }
        };

        for choice in &mut self.choices {
            if let Some(option) = options.iter().find(|o| choice.matches(&o.text)) {
                choice.state = ChoiceState::Matched;
                session.select_dialog_option(option.handle);
                return Some(option.handle);
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ScriptedSession;

    fn choices(texts: &[&str]) -> DialogChoices {
        let mut choices = DialogChoices::new();
        for text in texts {
            choices.add_choice(DialogChoice::new(*text));
        }
        choices
    }

    #[test]
    fn test_matching_option_selected() {
        let session = ScriptedSession::new();
        session.show_dialog(&["No", "Yes"]);

        let mut registered = choices(&["Yes"]);
        assert_eq!(registered.check_choices(&session), Some(OptionHandle(1)));
        assert_eq!(session.selected_texts(), vec!["Yes".to_string()]);
        assert!(registered.iter().all(DialogChoice::is_matched));
    }

    #[test]
    fn test_match_is_case_sensitive() {
        let session = ScriptedSession::new();
        session.show_dialog(&["yes", "No"]);

        let mut registered = choices(&["Yes"]);
        assert_eq!(registered.check_choices(&session), None);
        assert!(session.selections().is_empty());
    }

    #[test]
    fn test_earliest_registration_wins() {
        let session = ScriptedSession::new();
        session.show_dialog(&["Tell me about the castle.", "I'm looking for a quest!"]);

        let mut registered = choices(&["I'm looking for a quest!", "Tell me about the castle."]);
        registered.check_choices(&session);

        assert_eq!(session.selected_texts(), vec!["I'm looking for a quest!".to_string()]);
        let states: Vec<ChoiceState> = registered.iter().map(DialogChoice::state).collect();
        assert_eq!(states, vec![ChoiceState::Matched, ChoiceState::Unmatched]);
    }

    #[test]
    fn test_new_pass_resets_matches() {
        let session = ScriptedSession::new();
        session.show_dialog(&["Yes"]);
        let mut registered = choices(&["Yes"]);
        registered.check_choices(&session);

        session.show_dialog(&["Goodbye"]);
        assert_eq!(registered.check_choices(&session), None);
        assert_eq!(registered.len(), 1);
        assert!(!registered.iter().any(DialogChoice::is_matched));
    }

    #[test]
    fn test_unreadable_dialog_skips_pass() {
        let session = ScriptedSession::new();
        session.show_dialog(&["Yes"]);
        session.set_logged_in(false);

        let mut registered = choices(&["Yes"]);
        assert_eq!(registered.check_choices(&session), None);
        assert!(session.selections().is_empty());
    }
}
