//! Quest Helper
//!
//! The overarching task a player is being guided through. Owns the step
//! tree and switches it on and off as a unit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::hint::HintPanel;
use crate::session::{Icon, StepContext};
use crate::step::QuestStep;

use super::definition::{QuestDefinition, StepDefinition};

/// Identity of a quest, shared by all of its steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestInfo {
    pub id: String,
    pub name: String,
}

impl QuestInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug)]
pub struct QuestHelper {
    info: Arc<QuestInfo>,
    /// Composite step holding the quest's top-level steps
    root: QuestStep,
    /// When the helper was last started
    started_at: Option<DateTime<Utc>>,
}

impl QuestHelper {
    /// `root` must have been built with the same `info`
    pub fn new(info: Arc<QuestInfo>, root: QuestStep) -> Self {
        Self {
            info,
            root,
            started_at: None,
        }
    }

    /// Build the live step tree for a definition
    pub fn from_definition(definition: &QuestDefinition, ctx: &StepContext) -> Self {
        let info = Arc::new(QuestInfo::new(&definition.id, &definition.name));

        let overview = if definition.description.is_empty() {
            definition.name.as_str()
        } else {
            definition.description.as_str()
        };
        let mut root = QuestStep::new(&info, ctx, overview);
        for step in &definition.steps {
            attach_step(&mut root, step, &info, ctx);
        }

        Self::new(info, root)
    }

    pub fn info(&self) -> &QuestInfo {
        &self.info
    }

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn root(&self) -> &QuestStep {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut QuestStep {
        &mut self.root
    }

    pub fn start_up(&mut self) {
        if self.root.is_started() {
            return;
        }
        self.root.start_up();
        self.started_at = Some(Utc::now());
        info!("Started quest helper: {} ({})", self.info.name, self.info.id);
    }

    pub fn shut_down(&mut self) {
        if !self.root.is_started() {
            return;
        }
        self.root.shut_down();
        info!("Stopped quest helper: {} ({})", self.info.name, self.info.id);
    }

    pub fn is_started(&self) -> bool {
        self.root.is_started()
    }

    pub fn active_step(&self) -> &QuestStep {
        self.root.active_step()
    }

    /// Overlay panel lines for the active step
    pub fn make_overlay_hint(&self, panel: &mut HintPanel) {
        self.active_step().make_overlay_hint(panel);
    }

    pub fn render_panel(&self) -> HintPanel {
        let mut panel = HintPanel::new();
        self.make_overlay_hint(&mut panel);
        panel
    }

    /// Re-derive lock state for every step in the tree
    pub fn refresh_locks(&mut self) {
        self.root.refresh_locks();
    }

    /// Seconds since the helper was last started
    pub fn duration_secs(&self) -> Option<i64> {
        self.started_at
            .map(|start| (Utc::now() - start).num_seconds())
    }

    pub fn quest_image(&self) -> Option<Icon> {
        self.root.quest_image()
    }
}

fn build_step(definition: &StepDefinition, info: &Arc<QuestInfo>, ctx: &StepContext) -> QuestStep {
    let mut step = QuestStep::new(info, ctx, definition.text.as_str());
    step.set_show_in_sidebar(definition.show_in_sidebar);
    step.set_lockable(definition.lockable);
    step.set_locking_condition(definition.locked_when.as_ref().map(|c| c.to_condition()));
    step.add_dialog_steps(definition.dialog.iter().cloned());
    if let Some(item_id) = definition.icon {
        step.add_icon(item_id);
    }

    for substep in &definition.substeps {
        attach_step(&mut step, substep, info, ctx);
    }
    step
}

fn attach_step(
    parent: &mut QuestStep,
    definition: &StepDefinition,
    info: &Arc<QuestInfo>,
    ctx: &StepContext,
) {
    let step = build_step(definition, info, ctx);
    match &definition.done_when {
        Some(done_when) => parent.add_sub_step_done_when(step, done_when.to_condition()),
        None => parent.add_sub_steps([step]),
    }
}
