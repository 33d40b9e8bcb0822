//! The four lockstep tasks.
//!
//! Every round is three barrier waits:
//!
//! 1. [`Phase::Computed`]: all reads of the previous round are done.
//! 2. [`Phase::Committed`]: all next values are published.
//! 3. [`Phase::Observed`]: the watcher has emitted the month and advanced the
//!    clock and climate.

mod deer;
mod grain;
mod watcher;
mod wolf;

pub use deer::{next_deer, DeerAgent};
pub use grain::{next_grain_height, GrainAgent};
pub use watcher::{Watcher, WatcherReport};
pub use wolf::{next_wolves, WolfAgent};

use tracing::{debug, info_span, trace};

use crate::barrier::{BarrierWaitResult, SpinBarrier};
use crate::state::{StateView, Word, Writer};

/// Number of tasks sharing the round barrier.
pub const TASKS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Computed,
    Committed,
    Observed,
}

/// What every task is handed at start-up.
#[derive(Debug, Clone, Copy)]
pub struct RoundContext<'a> {
    pub view: StateView<'a>,
    barrier: &'a SpinBarrier,
    end_year: i32,
}

impl<'a> RoundContext<'a> {
    pub fn new(view: StateView<'a>, barrier: &'a SpinBarrier, end_year: i32) -> Self {
        Self {
            view,
            barrier,
            end_year,
        }
    }

    /// Shared termination check; every task evaluates it at the top of a round.
    pub fn running(&self) -> bool {
        self.view.year() < self.end_year
    }

    pub fn wait(&self, phase: Phase) -> BarrierWaitResult {
        let result = self.barrier.wait();
        trace!(?phase, generation = result.generation(), "barrier released");
        result
    }
}

/// A population or height task: computes its next value from the previous
/// round, then commits it to the one cell it owns.
pub trait Agent: Send + Sync {
    type Value: Word + Send;

    fn name(&self) -> &'static str;

    fn compute(&self, view: &StateView<'_>) -> Self::Value;
}

/// Runs `agent` until the clock reaches the end year and returns the number
/// of rounds it took part in.
pub fn run_agent<A: Agent>(
    agent: &A,
    ctx: &RoundContext<'_>,
    mut cell: Writer<'_, A::Value>,
) -> u64 {
    let span = info_span!("task", name = agent.name());
    let _entered = span.enter();

    let mut rounds = 0;
    while ctx.running() {
        let next = agent.compute(&ctx.view);
        ctx.wait(Phase::Computed);

        cell.commit(next);
        ctx.wait(Phase::Committed);

        ctx.wait(Phase::Observed);
        rounds += 1;
    }

    debug!(rounds, "task finished");
    rounds
}

/// Moves `value` one unit toward `capacity`.
pub(crate) fn nudge_toward(value: i64, capacity: i64) -> i64 {
    match value.cmp(&capacity) {
        std::cmp::Ordering::Less => value.saturating_add(1),
        std::cmp::Ordering::Greater => value.saturating_sub(1),
        std::cmp::Ordering::Equal => value,
    }
}

pub(crate) fn clamp_count(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nudge_moves_one_unit_at_most() {
        assert_eq!(nudge_toward(10, 100), 11);
        assert_eq!(nudge_toward(10, 0), 9);
        assert_eq!(nudge_toward(10, 10), 10);
        assert_eq!(nudge_toward(-3, 0), -2);
        assert_eq!(nudge_toward(i64::MAX, i64::MAX), i64::MAX);
        assert_eq!(nudge_toward(i64::MIN, i64::MAX), i64::MIN + 1);
        assert_eq!(nudge_toward(i64::MIN + 1, i64::MIN), i64::MIN);
    }

    #[test]
    fn counts_are_clamped_into_u32() {
        assert_eq!(clamp_count(-5), 0);
        assert_eq!(clamp_count(42), 42);
        assert_eq!(clamp_count(i64::MAX), u32::MAX);
    }
}
