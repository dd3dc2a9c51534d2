//! Step hooks
//!
//! Per-step behaviour that quest content can plug in. Every method defaults
//! to doing nothing.

use std::sync::Arc;

use crate::hint::OverlayCanvas;

use super::QuestStep;

pub trait StepHooks: Send + Sync {
    /// The step became live; acquire scoped resources here
    fn start_up(&self) {}

    /// The step stopped; release what `start_up` acquired
    fn shut_down(&self) {}

    fn entered_cutscene(&self) {}

    fn left_cutscene(&self) {}

    /// Draw in-world markers for the step
    fn world_overlay_hint(&self, _step: &QuestStep, _canvas: &mut dyn OverlayCanvas) {}

    /// Highlight interface widgets for the step
    fn widget_overlay_hint(&self, _step: &QuestStep, _canvas: &mut dyn OverlayCanvas) {}
}

/// Hooks for plain steps
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl StepHooks for NoHooks {}

pub(crate) fn no_hooks() -> Arc<dyn StepHooks> {
    Arc::new(NoHooks)
}
