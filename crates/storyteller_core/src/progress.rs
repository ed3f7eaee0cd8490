//! Heuristic completion estimate.
//!
//! The backend only reports `running` or a terminal status, so the displayed
//! percentage is synthesized: it advances by a fixed step on every timer tick
//! and stops short of 100 until the backend confirms completion.

/// Value shown as soon as a job is submitted.
pub const PROGRESS_SEED: u8 = 5;
/// Increment applied per timer tick.
pub const PROGRESS_STEP: u8 = 1;
/// Highest value reachable by ticking alone.
pub const PROGRESS_CEILING: u8 = 95;
pub const PROGRESS_COMPLETE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum EstimatorState {
    #[default]
    Idle,
    Advancing,
    Completed,
    Frozen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced(u8),
    /// The ceiling is reached; further ticks are pointless.
    ReachedCeiling,
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressEstimator {
    value: u8,
    state: EstimatorState,
}

impl ProgressEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self) {
        self.value = PROGRESS_SEED;
        self.state = EstimatorState::Advancing;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.state != EstimatorState::Advancing {
            return TickOutcome::Ignored;
        }
        if self.value >= PROGRESS_CEILING {
            return TickOutcome::ReachedCeiling;
        }
        self.value = self.value.saturating_add(PROGRESS_STEP).min(PROGRESS_CEILING);
        if self.value == PROGRESS_CEILING {
            TickOutcome::ReachedCeiling
        } else {
            TickOutcome::Advanced(self.value)
        }
    }

    pub fn complete(&mut self) {
        self.value = PROGRESS_COMPLETE;
        self.state = EstimatorState::Completed;
    }

    /// Stop advancing and keep the last value so the stall point stays visible.
    pub fn freeze(&mut self) {
        if self.state == EstimatorState::Advancing {
            self.state = EstimatorState::Frozen;
        }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_advancing(&self) -> bool {
        self.state == EstimatorState::Advancing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_estimator_ignores_ticks() {
        let mut estimator = ProgressEstimator::new();
        assert_eq!(estimator.tick(), TickOutcome::Ignored);
        assert_eq!(estimator.value(), 0);
    }

    #[test]
    fn ticks_stop_at_ceiling() {
        let mut estimator = ProgressEstimator::new();
        estimator.start();
        assert_eq!(estimator.tick(), TickOutcome::Advanced(PROGRESS_SEED + 1));

        let mut last = TickOutcome::Ignored;
        for _ in 0..200 {
            last = estimator.tick();
        }
        assert_eq!(last, TickOutcome::ReachedCeiling);
        assert_eq!(estimator.value(), PROGRESS_CEILING);
    }

    #[test]
    fn freeze_keeps_value_and_complete_snaps() {
        let mut estimator = ProgressEstimator::new();
        estimator.start();
        estimator.tick();
        estimator.freeze();
        assert_eq!(estimator.value(), PROGRESS_SEED + 1);
        assert_eq!(estimator.tick(), TickOutcome::Ignored);

        let mut estimator = ProgressEstimator::new();
        estimator.start();
        estimator.complete();
        assert_eq!(estimator.value(), PROGRESS_COMPLETE);
        estimator.freeze();
        assert_eq!(estimator.value(), PROGRESS_COMPLETE);
    }
}
