//! Session Replay
//!
//! Drives a quest helper from a TOML script of session events instead of a
//! live client. Used by the `quest-helper` binary to check quest files.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::hint::HintLine;
use crate::quest::QuestHelper;
use crate::session::{ScriptedSession, SessionEventRouter, UiQueue, VariableId, WidgetLoaded};

/// A replay script as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct SessionScript {
    /// Quest to build from the registry
    pub quest: String,
    /// Values present before the helper starts
    #[serde(default)]
    pub variables: Vec<ScriptVariable>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ScriptVariable {
    pub id: VariableId,
    pub value: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    /// Change a variable and publish the change
    SetVariable { id: VariableId, value: i32 },
    /// Put dialog options on screen and publish the widget load
    ShowDialog { options: Vec<String> },
    /// Publish a widget load without changing what is on screen
    LoadWidget { group: i32 },
    /// Capture the overlay panel
    Render,
}

impl SessionScript {
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("Failed to parse replay script: {}", e))
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {:?}: {}", path, e))?;
        Self::from_toml(&content).map_err(|e| format!("{:?}: {}", path, e))
    }

    /// Set the initial variables without publishing them
    pub fn seed(&self, session: &ScriptedSession) {
        for variable in &self.variables {
            session.set_variable(variable.id, variable.value);
        }
    }
}

impl ScriptEvent {
    /// Apply the event to the session and route it to listeners
    pub fn apply(&self, session: &ScriptedSession, router: &SessionEventRouter) {
        match self {
            ScriptEvent::SetVariable { id, value } => {
                router.publish_variable_changed(session.set_variable(*id, *value));
            }
            ScriptEvent::ShowDialog { options } => {
                router.publish_widget_loaded(session.show_dialog(options));
            }
            ScriptEvent::LoadWidget { group } => {
                router.publish_widget_loaded(WidgetLoaded { group_id: *group });
            }
            ScriptEvent::Render => {}
        }
    }
}

/// Snapshot of what the helper would draw after an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedFrame {
    /// Index of the `render` event in the script
    pub event: usize,
    pub quest: String,
    pub active_step: String,
    pub lines: Vec<HintLine>,
    pub in_cutscene: bool,
    /// Dialog options picked so far
    pub selections: Vec<String>,
}

impl RenderedFrame {
    pub fn capture(event: usize, helper: &QuestHelper, session: &ScriptedSession) -> Self {
        let active = helper.active_step();
        Self {
            event,
            quest: helper.info().id.clone(),
            active_step: active.text().to_string(),
            lines: helper.render_panel().lines().to_vec(),
            in_cutscene: active.in_cutscene(),
            selections: session.selected_texts(),
        }
    }
}

/// Run every event in order against a started helper.
///
/// Waits for the UI context to drain after each event, so the context must
/// be running on another task.
pub async fn run_script(
    script: &SessionScript,
    helper: &QuestHelper,
    session: &ScriptedSession,
    router: &SessionEventRouter,
    queue: &UiQueue,
) -> Result<Vec<RenderedFrame>, String> {
    let mut frames = Vec::new();

    for (index, event) in script.events.iter().enumerate() {
        debug!("Replaying event {}: {:?}", index, event);
        event.apply(session, router);

        queue
            .barrier()
            .await
            .map_err(|_| format!("UI context stopped before event {}", index))?;

        if matches!(event, ScriptEvent::Render) {
            frames.push(RenderedFrame::capture(index, helper, session));
        }
    }

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quest::definition::{QuestDefinition, RawQuestFile};
    use crate::session::StepContext;
    use std::sync::Arc;

    const QUEST: &str = r#"
[quest]
id = "imp_catcher"
name = "Imp Catcher"

[[quest.steps]]
id = "wizard"
text = "Talk to Wizard Mizgog."
dialog = ["Give me a quest please."]
done_when = { type = "variable", id = 160, op = "ge", value = 1 }

[[quest.steps]]
id = "beads"
text = "Collect the four beads."
"#;

    const SCRIPT: &str = r#"
quest = "imp_catcher"

[[variables]]
id = 160
value = 0

[[events]]
type = "render"

[[events]]
type = "show_dialog"
options = ["Nothing, thanks.", "Give me a quest please."]

[[events]]
type = "set_variable"
id = 160
value = 1

[[events]]
type = "render"
"#;

    #[test]
    fn test_script_parsing() {
        let script = SessionScript::from_toml(SCRIPT).unwrap();
        assert_eq!(script.quest, "imp_catcher");
        assert_eq!(script.variables.len(), 1);
        assert_eq!(script.events.len(), 4);
        assert!(matches!(script.events[1], ScriptEvent::ShowDialog { .. }));
    }

    #[test]
    fn test_unknown_event_rejected() {
        let err = SessionScript::from_toml("quest = \"q\"\n[[events]]\ntype = \"teleport\"\n")
            .unwrap_err();
        assert!(err.contains("replay script"));
    }

    #[tokio::test]
    async fn test_replay_produces_frames() {
        let session = Arc::new(ScriptedSession::new());
        let router = Arc::new(SessionEventRouter::new());
        let (queue, context) = UiQueue::new();
        tokio::spawn(context.run());

        let ctx = StepContext {
            session: session.clone(),
            ui: Arc::new(queue.clone()),
            icons: session.clone(),
            router: router.clone(),
            cutscene_variable: 542,
        };

        let raw: RawQuestFile = toml::from_str(QUEST).unwrap();
        let definition = QuestDefinition::from_raw(&raw.quest).unwrap();
        let mut helper = QuestHelper::from_definition(&definition, &ctx);

        let script = SessionScript::from_toml(SCRIPT).unwrap();
        script.seed(&session);
        helper.start_up();

        let frames = run_script(&script, &helper, &session, &router, &queue)
            .await
            .unwrap();

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, 0);
        assert_eq!(frames[0].active_step, "Talk to Wizard Mizgog.");
        assert!(frames[0].selections.is_empty());

        assert_eq!(frames[1].event, 3);
        assert_eq!(frames[1].active_step, "Collect the four beads.");
        assert_eq!(frames[1].lines[0].text, "Imp Catcher");
        assert_eq!(frames[1].selections, vec!["Give me a quest please.".to_string()]);
        assert!(!frames[1].in_cutscene);

        helper.shut_down();
    }
}
