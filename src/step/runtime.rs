//! Step runtime
//!
//! The part of a step that session events touch. It is shared between the
//! step, the router subscription and any dialog checks queued on the UI
//! context.
//!
//! Every start opens a new generation. Work queued on the UI context carries
//! the generation it was queued under and is dropped if the step has since
//! shut down, even if it was started again afterwards.
//!
//! Runtimes also mirror the step tree (parent link, ordered children, lock
//! and completion gates), so a queued dialog check can tell whether its step
//! is still on the active path when it finally runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};

use tracing::debug;

use crate::condition::ConditionRef;
use crate::session::{
    OptionHandle, SessionListener, SessionState, UiExecutor, VariableChanged, VariableId,
    WidgetLoaded,
};

use super::LockEvaluation;
use super::choice::{DialogChoice, DialogChoices};
use super::cutscene::{CutsceneTracker, CutsceneTransition};
use super::gate::ConditionGate;
use super::hooks::StepHooks;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) struct StepRuntime {
    /// Quest name, for log output
    quest: String,
    /// Step text, for log output
    text: Mutex<String>,
    cutscene_variable: VariableId,
    cutscene: Mutex<CutsceneTracker>,
    choices: Mutex<DialogChoices>,
    pub(crate) hooks: Arc<dyn StepHooks>,
    session: Arc<dyn SessionState>,
    ui: Arc<dyn UiExecutor>,
    alive: AtomicBool,
    generation: AtomicU64,
    /// Manual lock; forced on while the locking condition holds
    locked: AtomicBool,
    locking_condition: Mutex<Option<Arc<ConditionGate>>>,
    /// Marks the step finished inside its parent; set when attached
    done_when: OnceLock<ConditionGate>,
    parent: OnceLock<Weak<StepRuntime>>,
    children: Mutex<Vec<Arc<StepRuntime>>>,
}

impl StepRuntime {
    pub(crate) fn new(
        quest: &str,
        text: &str,
        cutscene_variable: VariableId,
        hooks: Arc<dyn StepHooks>,
        session: Arc<dyn SessionState>,
        ui: Arc<dyn UiExecutor>,
    ) -> Self {
        Self {
            quest: quest.to_string(),
            text: Mutex::new(text.to_string()),
            cutscene_variable,
            cutscene: Mutex::new(CutsceneTracker::new()),
            choices: Mutex::new(DialogChoices::new()),
            hooks,
            session,
            ui,
            alive: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            locked: AtomicBool::new(false),
            locking_condition: Mutex::new(None),
            done_when: OnceLock::new(),
            parent: OnceLock::new(),
            children: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn set_text(&self, text: &str) {
        *lock(&self.text) = text.to_string();
    }

    fn text(&self) -> String {
        lock(&self.text).clone()
    }

    // ------------------------------------------------------------------
    // Locking and progression
    // ------------------------------------------------------------------

    pub(crate) fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::SeqCst);
    }

    pub(crate) fn is_locked_manually(&self) -> bool {
        self.locked.load(Ordering::SeqCst)
    }

    pub(crate) fn set_locking_condition(&self, condition: Option<ConditionRef>) {
        *lock(&self.locking_condition) = condition.map(|c| Arc::new(ConditionGate::new(c)));
    }

    pub(crate) fn locking_condition(&self) -> Option<ConditionRef> {
        lock(&self.locking_condition)
            .as_ref()
            .map(|gate| Arc::clone(gate.condition()))
    }

    /// Pure lock check: the manual flag or the locking condition
    pub(crate) fn evaluate_lock(&self) -> LockEvaluation {
        // Release the mutex before touching the session
        let gate = lock(&self.locking_condition).clone();
        let auto_locked = gate.is_some_and(|gate| gate.holds(self.session.as_ref(), &self.text()));

        LockEvaluation {
            auto_locked,
            locked: self.locked.load(Ordering::SeqCst) || auto_locked,
        }
    }

    /// Link `child` under this runtime. A runtime is attached at most once.
    pub(crate) fn attach_child(
        self: &Arc<Self>,
        child: &Arc<StepRuntime>,
        done_when: Option<ConditionRef>,
    ) {
        if child.parent.set(Arc::downgrade(self)).is_err() {
            debug!("[{}] step '{}' is already attached", self.quest, child.text());
            return;
        }
        if let Some(condition) = done_when {
            let _ = child.done_when.set(ConditionGate::new(condition));
        }
        lock(&self.children).push(Arc::clone(child));
    }

    pub(crate) fn done_when(&self) -> Option<&ConditionRef> {
        self.done_when.get().map(ConditionGate::condition)
    }

    /// Whether the completion condition currently holds. No condition means
    /// never done.
    pub(crate) fn is_done(&self) -> bool {
        self.done_when
            .get()
            .is_some_and(|gate| gate.holds(self.session.as_ref(), &self.text()))
    }

    /// Candidate for being current inside its parent
    pub(crate) fn is_candidate(&self) -> bool {
        !self.evaluate_lock().locked && !self.is_done()
    }

    /// The step is the active step or one of its ancestors
    pub(crate) fn is_on_active_path(self: &Arc<Self>) -> bool {
        let Some(parent) = self.parent.get().and_then(Weak::upgrade) else {
            return true;
        };
        if !parent.is_on_active_path() {
            return false;
        }

        let children = lock(&parent.children).clone();
        children
            .iter()
            .find(|child| child.is_candidate())
            .is_some_and(|current| Arc::ptr_eq(current, self))
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.is_alive() && self.generation.load(Ordering::SeqCst) == generation
    }

    /// Go live. Returns false if already live.
    pub(crate) fn start(&self) -> bool {
        if self.alive.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);

        let mut tracker = lock(&self.cutscene);
        tracker.reset();
        if let Ok(value) = self.session.variable_value(self.cutscene_variable) {
            tracker.seed(value);
        }
        drop(tracker);

        lock(&self.choices).reset_pass();
        true
    }

    /// Stop reacting. Returns false if already stopped.
    pub(crate) fn stop(&self) -> bool {
        if !self.alive.swap(false, Ordering::SeqCst) {
            return false;
        }
        self.generation.fetch_add(1, Ordering::SeqCst);
        true
    }

    pub(crate) fn in_cutscene(&self) -> bool {
        lock(&self.cutscene).in_cutscene()
    }

    pub(crate) fn add_choice(&self, choice: DialogChoice) {
        lock(&self.choices).add_choice(choice);
    }

    pub(crate) fn choices(&self) -> Vec<DialogChoice> {
        lock(&self.choices).iter().cloned().collect()
    }

    pub(crate) fn highlight_choice(&self) -> Option<OptionHandle> {
        lock(&self.choices).check_choices(self.session.as_ref())
    }

    pub(crate) fn handle_variable_changed(&self, event: &VariableChanged) {
        if !self.is_alive() {
            return;
        }

        let value = if event.variable_id == self.cutscene_variable {
            event.new_value
        } else {
            match self.session.variable_value(self.cutscene_variable) {
                Ok(value) => value,
                Err(e) => {
                    debug!("[{}] cutscene state unreadable: {}", self.quest, e);
                    return;
                }
            }
        };

        if !CutsceneTracker::accepts(value) {
            debug!("[{}] ignoring cutscene value {}", self.quest, value);
            return;
        }

        // Release the tracker before running hooks
        let transition = lock(&self.cutscene).observe(value);
        match transition {
            Some(CutsceneTransition::Entered) => self.hooks.entered_cutscene(),
            Some(CutsceneTransition::Left) => self.hooks.left_cutscene(),
            None => {}
        }
    }

    pub(crate) fn handle_widget_loaded(self: &Arc<Self>, event: &WidgetLoaded) {
        if !self.is_alive() || !event.is_dialog_options() {
            return;
        }
        if !self.is_on_active_path() {
            return;
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let runtime = Arc::clone(self);
        self.ui.run_on_ui(Box::new(move || {
            if !runtime.is_current(generation) {
                debug!("[{}] dropping dialog check for a stopped step", runtime.quest);
                return;
            }
            // Progress may have moved on since the widget loaded
            if !runtime.is_on_active_path() {
                debug!("[{}] dropping dialog check for an inactive step", runtime.quest);
                return;
            }
            runtime.highlight_choice();
        }));
    }
}

/// Router-facing handle of a live step
pub(crate) struct StepListener {
    runtime: Arc<StepRuntime>,
}

impl StepListener {
    pub(crate) fn new(runtime: Arc<StepRuntime>) -> Self {
        Self { runtime }
    }
}

impl SessionListener for StepListener {
    fn on_variable_changed(&self, event: &VariableChanged) {
        self.runtime.handle_variable_changed(event);
    }

    fn on_widget_loaded(&self, event: &WidgetLoaded) {
        self.runtime.handle_widget_loaded(event);
    }
}
