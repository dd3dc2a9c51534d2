//! Substep containers
//!
//! A step is either a leaf or a composite of ordered substeps. The active
//! substep of a composite is the earliest one that is neither locked nor
//! done; a composite with no such substep (or no substeps) stands for itself.

use crate::condition::ConditionRef;

use super::QuestStep;

/// A child step; its completion condition lives in the step's runtime
pub struct Substep {
    step: QuestStep,
}

impl Substep {
    pub(crate) fn new(step: QuestStep) -> Self {
        Self { step }
    }

    pub fn step(&self) -> &QuestStep {
        &self.step
    }

    pub fn step_mut(&mut self) -> &mut QuestStep {
        &mut self.step
    }

    pub fn done_when(&self) -> Option<&ConditionRef> {
        self.step.runtime.done_when()
    }

    /// Whether the completion condition currently holds. No condition means
    /// never done.
    pub fn is_done(&self) -> bool {
        self.step.runtime.is_done()
    }
}

#[derive(Default)]
pub struct SubstepContainer {
    substeps: Vec<Substep>,
}

impl SubstepContainer {
    pub fn iter(&self) -> impl Iterator<Item = &Substep> {
        self.substeps.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Substep> {
        self.substeps.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.substeps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.substeps.is_empty()
    }

    /// Earliest substep that is unlocked and not done
    pub fn current(&self) -> Option<&QuestStep> {
        self.substeps
            .iter()
            .find(|substep| substep.step.runtime.is_candidate())
            .map(Substep::step)
    }
}

/// Leaf or composite
pub enum StepShape {
    Leaf,
    Composite(SubstepContainer),
}

impl StepShape {
    pub fn container(&self) -> Option<&SubstepContainer> {
        match self {
            StepShape::Leaf => None,
            StepShape::Composite(container) => Some(container),
        }
    }

    pub fn container_mut(&mut self) -> Option<&mut SubstepContainer> {
        match self {
            StepShape::Leaf => None,
            StepShape::Composite(container) => Some(container),
        }
    }

    /// Append a substep, turning a leaf into a composite
    pub(crate) fn push(&mut self, substep: Substep) {
        let mut container = match std::mem::replace(self, StepShape::Leaf) {
            StepShape::Leaf => SubstepContainer::default(),
            StepShape::Composite(container) => container,
        };
        container.substeps.push(substep);
        *self = StepShape::Composite(container);
    }
}
