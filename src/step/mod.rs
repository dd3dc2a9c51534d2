//! Quest Steps
//!
//! A step is one instruction shown to the player ("Talk to the Cook"). Steps
//! nest: a composite step delegates to whichever substep is currently
//! active. Each live step listens to session events to track cutscenes and
//! to pick registered dialog options when the dialog interface loads.
//!
//! Lock checks, event handling and queued dialog checks assume events are
//! delivered one at a time. `is_locked` updates `unlockable` as a side
//! effect, so a host that delivers events to a step from several threads
//! must serialise access to it.

pub mod choice;
pub mod container;
pub mod cutscene;
pub mod gate;
pub mod hooks;
mod runtime;

use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::debug;

use crate::condition::ConditionRef;
use crate::hint::{HintLine, HintPanel, OverlayCanvas};
use crate::quest::QuestInfo;
use crate::session::{
    Icon, ItemId, OptionHandle, StepContext, SubscriptionId, VariableChanged, WidgetLoaded,
};

pub use choice::{ChoiceState, DialogChoice, DialogChoices};
pub use container::{StepShape, Substep, SubstepContainer};
pub use cutscene::{CutsceneTracker, CutsceneTransition};
pub use gate::ConditionGate;
pub use hooks::{NoHooks, StepHooks};

use runtime::{StepListener, StepRuntime};

/// Result of evaluating a step's lock without touching its state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockEvaluation {
    /// The locking condition currently holds
    pub auto_locked: bool,
    /// The step counts as locked
    pub locked: bool,
}

pub struct QuestStep {
    quest: Arc<QuestInfo>,
    text: String,
    /// Whether the task flow is allowed to lock this step
    lockable: bool,
    unlockable: bool,
    show_in_sidebar: bool,
    icon_item: Option<ItemId>,
    icon: OnceLock<Option<Icon>>,
    shape: StepShape,
    runtime: Arc<StepRuntime>,
    subscription: Option<SubscriptionId>,
    ctx: StepContext,
}

impl QuestStep {
    pub fn new(quest: &Arc<QuestInfo>, ctx: &StepContext, text: impl Into<String>) -> Self {
        Self::with_hooks(quest, ctx, text, hooks::no_hooks())
    }

    pub fn with_hooks(
        quest: &Arc<QuestInfo>,
        ctx: &StepContext,
        text: impl Into<String>,
        hooks: Arc<dyn StepHooks>,
    ) -> Self {
        let text = text.into();
        let runtime = StepRuntime::new(
            &quest.name,
            &text,
            ctx.cutscene_variable,
            hooks,
            Arc::clone(&ctx.session),
            Arc::clone(&ctx.ui),
        );

        Self {
            quest: Arc::clone(quest),
            text,
            lockable: false,
            unlockable: true,
            show_in_sidebar: true,
            icon_item: None,
            icon: OnceLock::new(),
            shape: StepShape::Leaf,
            runtime: Arc::new(runtime),
            subscription: None,
            ctx: ctx.clone(),
        }
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Go live: subscribe to session events and start substeps.
    ///
    /// Calling it on a live step does nothing.
    pub fn start_up(&mut self) {
        if self.runtime.start() {
            let listener = Arc::new(StepListener::new(Arc::clone(&self.runtime)));
            self.subscription = Some(self.ctx.router.subscribe(listener));
            self.runtime.hooks.start_up();
            debug!("[{}] started step '{}'", self.quest.name, self.text);
        }

        for child in self.substeps_mut() {
            child.start_up();
        }
    }

    /// Stop reacting to events. Dialog checks still queued on the UI
    /// context are dropped when they run.
    pub fn shut_down(&mut self) {
        for child in self.substeps_mut() {
            child.shut_down();
        }

        if self.runtime.stop() {
            if let Some(id) = self.subscription.take() {
                self.ctx.router.unsubscribe(id);
            }
            self.runtime.hooks.shut_down();
            debug!("[{}] stopped step '{}'", self.quest.name, self.text);
        }
    }

    pub fn is_started(&self) -> bool {
        self.runtime.is_alive()
    }

    // ------------------------------------------------------------------
    // Substeps
    // ------------------------------------------------------------------

    /// Append substeps in order
    pub fn add_sub_steps(&mut self, steps: impl IntoIterator<Item = QuestStep>) {
        for step in steps {
            self.attach(step, None);
        }
    }

    /// Append a substep that counts as finished once `done_when` holds
    pub fn add_sub_step_done_when(&mut self, step: QuestStep, done_when: ConditionRef) {
        self.attach(step, Some(done_when));
    }

    fn attach(&mut self, step: QuestStep, done_when: Option<ConditionRef>) {
        self.runtime.attach_child(&step.runtime, done_when);
        self.shape.push(Substep::new(step));
    }

    pub fn shape(&self) -> &StepShape {
        &self.shape
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.shape, StepShape::Leaf)
    }

    pub fn substeps(&self) -> impl Iterator<Item = &QuestStep> {
        self.shape
            .container()
            .into_iter()
            .flat_map(|c| c.iter().map(Substep::step))
    }

    pub fn substeps_mut(&mut self) -> impl Iterator<Item = &mut QuestStep> {
        self.shape
            .container_mut()
            .into_iter()
            .flat_map(|c| c.iter_mut().map(Substep::step_mut))
    }

    pub fn substep_count(&self) -> usize {
        self.shape.container().map_or(0, SubstepContainer::len)
    }

    /// The step the player should be working on.
    ///
    /// Leaves answer themselves. Composites recurse into their earliest
    /// unlocked, unfinished substep and fall back to themselves when there is
    /// none. Reads state only.
    pub fn active_step(&self) -> &QuestStep {
        let Some(container) = self.shape.container() else {
            return self;
        };

        match container.current() {
            Some(child) => child.active_step(),
            None => self,
        }
    }

    // ------------------------------------------------------------------
    // Session events
    // ------------------------------------------------------------------

    pub fn on_variable_changed(&self, event: &VariableChanged) {
        self.runtime.handle_variable_changed(event);
    }

    /// Dialog option loads queue a dialog check on the UI context. The check
    /// only runs while this step is on the active path.
    pub fn on_widget_loaded(&self, event: &WidgetLoaded) {
        self.runtime.handle_widget_loaded(event);
    }

    pub fn in_cutscene(&self) -> bool {
        self.runtime.in_cutscene()
    }

    // ------------------------------------------------------------------
    // Dialog choices
    // ------------------------------------------------------------------

    /// Match registered choices against the options on screen now.
    /// Must run on the UI context.
    pub fn highlight_choice(&self) -> Option<OptionHandle> {
        self.runtime.highlight_choice()
    }

    pub fn add_dialog_step(&mut self, choice: impl Into<String>) {
        self.runtime.add_choice(DialogChoice::new(choice));
    }

    pub fn add_dialog_steps<I, S>(&mut self, choices: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for choice in choices {
            self.add_dialog_step(choice);
        }
    }

    /// Registered choices and their state from the last pass
    pub fn choices(&self) -> Vec<DialogChoice> {
        self.runtime.choices()
    }

    // ------------------------------------------------------------------
    // Hints
    // ------------------------------------------------------------------

    /// Quest name, then the step text
    pub fn make_overlay_hint(&self, panel: &mut HintPanel) {
        panel.push(HintLine::plain(self.quest.name.as_str()));
        panel.push(HintLine::titled_content(self.text.as_str()));
    }

    pub fn make_world_overlay_hint(&self, canvas: &mut dyn OverlayCanvas) {
        self.runtime.hooks.world_overlay_hint(self, canvas);
    }

    pub fn make_widget_overlay_hint(&self, canvas: &mut dyn OverlayCanvas) {
        self.runtime.hooks.widget_overlay_hint(self, canvas);
    }

    /// Record the item whose image decorates this step. The image is looked
    /// up on first use. The icon is set once; later calls are ignored.
    pub fn add_icon(&mut self, item_id: ItemId) {
        if let Some(existing) = self.icon_item {
            debug!(
                "[{}] step '{}' already has icon {}, ignoring {}",
                self.quest.name, self.text, existing, item_id
            );
            return;
        }
        self.icon_item = Some(item_id);
    }

    pub fn icon_item(&self) -> Option<ItemId> {
        self.icon_item
    }

    pub fn icon(&self) -> Option<Icon> {
        let item_id = self.icon_item?;
        self.icon
            .get_or_init(|| self.ctx.icons.resolve_icon(item_id))
            .clone()
    }

    pub fn quest_image(&self) -> Option<Icon> {
        self.ctx.icons.quest_tab_sprite()
    }

    // ------------------------------------------------------------------
    // Locking
    // ------------------------------------------------------------------

    pub fn set_locking_condition(&mut self, condition: Option<ConditionRef>) {
        self.runtime.set_locking_condition(condition);
    }

    pub fn locking_condition(&self) -> Option<ConditionRef> {
        self.runtime.locking_condition()
    }

    /// Pure lock check: the manual flag or the locking condition
    pub fn evaluate_lock(&self) -> LockEvaluation {
        self.runtime.evaluate_lock()
    }

    /// Re-derive lock state: a holding condition forces the manual lock on
    /// and makes the step not unlockable.
    pub fn refresh_lock_state(&mut self) -> LockEvaluation {
        let evaluation = self.evaluate_lock();
        self.unlockable = !evaluation.auto_locked;
        if evaluation.auto_locked {
            self.runtime.set_locked(true);
        }
        evaluation
    }

    /// Lock check with side effects, see [`QuestStep::refresh_lock_state`].
    ///
    /// The manual lock stays on after the condition stops holding, until
    /// [`QuestStep::set_locked_manually`] clears it.
    pub fn is_locked(&mut self) -> bool {
        self.refresh_lock_state().locked
    }

    pub fn set_locked_manually(&mut self, locked: bool) {
        self.runtime.set_locked(locked);
    }

    /// Refresh lock state across the whole subtree
    pub fn refresh_locks(&mut self) {
        self.refresh_lock_state();
        for child in self.substeps_mut() {
            child.refresh_locks();
        }
    }

    pub fn is_unlockable(&self) -> bool {
        self.unlockable
    }

    pub fn is_lockable(&self) -> bool {
        self.lockable
    }

    pub fn set_lockable(&mut self, lockable: bool) {
        self.lockable = lockable;
    }

    // ------------------------------------------------------------------
    // Plain attributes
    // ------------------------------------------------------------------

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.runtime.set_text(&self.text);
    }

    pub fn quest(&self) -> &QuestInfo {
        &self.quest
    }

    pub fn show_in_sidebar(&self) -> bool {
        self.show_in_sidebar
    }

    pub fn set_show_in_sidebar(&mut self, show: bool) {
        self.show_in_sidebar = show;
    }
}

impl Drop for QuestStep {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.ctx.router.unsubscribe(id);
        }
        self.runtime.stop();
    }
}

impl fmt::Debug for QuestStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuestStep")
            .field("quest", &self.quest.id)
            .field("text", &self.text)
            .field("locked", &self.runtime.is_locked_manually())
            .field("unlockable", &self.unlockable)
            .field("substeps", &self.substep_count())
            .field("started", &self.is_started())
            .finish()
    }
}
