//! Cutscene edge detection
//!
//! Two-state machine over the cutscene variable. Only the 0→1 and 1→0 edges
//! produce a transition.

/// Edge reported by [`CutsceneTracker::observe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutsceneTransition {
    Entered,
    Left,
}

#[derive(Debug, Clone, Default)]
pub struct CutsceneTracker {
    /// Last observed value; None until the first observation
    status: Option<i32>,
    in_cutscene: bool,
}

impl CutsceneTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only 0 and 1 are meaningful cutscene values
    pub fn accepts(value: i32) -> bool {
        value == 0 || value == 1
    }

    /// Record a starting value without reporting an edge
    pub fn seed(&mut self, value: i32) {
        if Self::accepts(value) {
            self.status = Some(value);
            self.in_cutscene = value == 1;
        }
    }

    /// Feed the latest value. The first value only seeds the tracker, since
    /// there is nothing to compare it against.
    pub fn observe(&mut self, value: i32) -> Option<CutsceneTransition> {
        if !Self::accepts(value) {
            return None;
        }

        let Some(previous) = self.status.replace(value) else {
            self.in_cutscene = value == 1;
            return None;
        };

        match (previous, value) {
            (0, 1) => {
                self.in_cutscene = true;
                Some(CutsceneTransition::Entered)
            }
            (1, 0) => {
                self.in_cutscene = false;
                Some(CutsceneTransition::Left)
            }
            _ => None,
        }
    }

    pub fn in_cutscene(&self) -> bool {
        self.in_cutscene
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(tracker: &mut CutsceneTracker, values: &[i32]) -> Vec<CutsceneTransition> {
        values.iter().filter_map(|v| tracker.observe(*v)).collect()
    }

    #[test]
    fn test_single_enter_and_leave() {
        let mut tracker = CutsceneTracker::new();
        let edges = feed(&mut tracker, &[0, 0, 1, 1, 0]);
        assert_eq!(edges, vec![CutsceneTransition::Entered, CutsceneTransition::Left]);
        assert!(!tracker.in_cutscene());
    }

    #[test]
    fn test_steady_state_reports_nothing() {
        let mut tracker = CutsceneTracker::new();
        assert!(feed(&mut tracker, &[1, 1, 1]).is_empty());
        assert!(tracker.in_cutscene());

        // The first real change is still reported
        assert_eq!(tracker.observe(0), Some(CutsceneTransition::Left));
    }

    #[test]
    fn test_out_of_range_values_ignored() {
        let mut tracker = CutsceneTracker::new();
        tracker.seed(0);
        assert_eq!(tracker.observe(7), None);
        assert_eq!(tracker.observe(-1), None);
        assert_eq!(tracker.observe(1), Some(CutsceneTransition::Entered));
    }

    #[test]
    fn test_reset() {
        let mut tracker = CutsceneTracker::new();
        tracker.seed(1);
        tracker.reset();
        assert!(!tracker.in_cutscene());
        assert_eq!(tracker.observe(1), None);
    }
}
