//! Test fixtures shared by the unit tests

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::hint::{OverlayCanvas, WorldPoint};
use crate::quest::QuestInfo;
use crate::session::{
    ScriptedSession, SessionEventRouter, StepContext, UiContext, UiQueue, VariableId,
};
use crate::step::{QuestStep, StepHooks};

pub(crate) const CUTSCENE_VARIABLE: VariableId = 542;

/// A scripted session wired to a router and a manually drained UI queue
pub(crate) struct TestHost {
    pub session: Arc<ScriptedSession>,
    pub router: Arc<SessionEventRouter>,
    pub ui: UiContext,
    pub ctx: StepContext,
    pub quest: Arc<QuestInfo>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::with_quest("test_quest", "Test Quest")
    }

    pub fn with_quest(id: &str, name: &str) -> Self {
        let session = Arc::new(ScriptedSession::new());
        let router = Arc::new(SessionEventRouter::new());
        let (queue, ui) = UiQueue::new();
        let ctx = StepContext {
            session: session.clone(),
            ui: Arc::new(queue),
            icons: session.clone(),
            router: router.clone(),
            cutscene_variable: CUTSCENE_VARIABLE,
        };

        Self {
            session,
            router,
            ui,
            ctx,
            quest: Arc::new(QuestInfo::new(id, name)),
        }
    }

    pub fn step(&self, text: &str) -> QuestStep {
        QuestStep::new(&self.quest, &self.ctx, text)
    }

    pub fn step_with_hooks(&self, text: &str, hooks: Arc<RecordingHooks>) -> QuestStep {
        QuestStep::with_hooks(&self.quest, &self.ctx, text, hooks)
    }

    /// Set a variable and push the change through the router
    pub fn publish_variable(&self, id: VariableId, value: i32) {
        let event = self.session.set_variable(id, value);
        self.router.publish_variable_changed(event);
    }

    pub fn drain_ui(&mut self) -> usize {
        self.ui.run_pending()
    }
}

/// Hooks that count their calls
#[derive(Default)]
pub(crate) struct RecordingHooks {
    entered: AtomicUsize,
    left: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
    marker: Option<WorldPoint>,
    widget: Option<(i32, i32)>,
}

impl RecordingHooks {
    /// Hooks that also mark a tile when asked for world hints
    pub fn marking(point: WorldPoint) -> Self {
        Self {
            marker: Some(point),
            ..Self::default()
        }
    }

    /// Hooks that also highlight a widget when asked for widget hints
    pub fn highlighting(group_id: i32, child_id: i32) -> Self {
        Self {
            widget: Some((group_id, child_id)),
            ..Self::default()
        }
    }

    pub fn entered(&self) -> usize {
        self.entered.load(Ordering::SeqCst)
    }

    pub fn left(&self) -> usize {
        self.left.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stops(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl StepHooks for RecordingHooks {
    fn start_up(&self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn shut_down(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }

    fn entered_cutscene(&self) {
        self.entered.fetch_add(1, Ordering::SeqCst);
    }

    fn left_cutscene(&self) {
        self.left.fetch_add(1, Ordering::SeqCst);
    }

    fn world_overlay_hint(&self, step: &QuestStep, canvas: &mut dyn OverlayCanvas) {
        if let Some(point) = self.marker {
            canvas.mark_tile(point, step.text());
        }
    }

    fn widget_overlay_hint(&self, _step: &QuestStep, canvas: &mut dyn OverlayCanvas) {
        if let Some((group_id, child_id)) = self.widget {
            canvas.highlight_widget(group_id, child_id);
        }
    }
}
