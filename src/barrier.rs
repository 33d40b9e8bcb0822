//! Reusable spin barrier for a fixed set of participants.
//!
//! # Protocol
//!
//! The barrier is a three-state machine guarded by a mutex and backed by two
//! atomic counters:
//!
//! ```text
//! Arriving --(Nth arrival, under lock)--> Releasing --(arrived := 0)--> Draining
//! Draining --(departed == N - 1, releaser)--> Arriving
//! ```
//!
//! - `arrived` is incremented under the lock. Non-releasing callers spin on it
//!   without the lock and treat the reset to zero as the release signal.
//! - `departed` is incremented atomically by every non-releasing caller on its
//!   way out. The releaser spins on it, without the lock, until all N - 1 have
//!   left.
//! - A caller that reaches the lock while the phase is not `Arriving` belongs
//!   to the next round and waits for the drain to finish before counting
//!   itself. This keeps a fast caller from re-incrementing `arrived` before a
//!   slow caller of the previous round has seen it reach zero.
//!
//! # Waiting
//!
//! Waiters never park. They spin with exponential backoff and, once the
//! backoff saturates, yield their time slice between polls so an
//! oversubscribed machine still schedules the participant everyone is
//! waiting for.
//!
//! # Ordering
//!
//! Every arrival releases the mutex after incrementing `arrived`; the releaser
//! acquires the mutex last, then Release-stores `arrived = 0`, which each
//! waiter Acquire-loads. Everything written by any participant before `wait`
//! therefore happens-before everything any participant does after `wait`.

use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crossbeam_utils::{Backoff, CachePadded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BarrierPhase {
    /// Collecting arrivals for the current round.
    Arriving = 0,
    /// The last participant is resetting the counters.
    Releasing = 1,
    /// Arrivals are reset; the releaser is waiting for departures.
    Draining = 2,
}

impl BarrierPhase {
    fn from_raw(raw: u8) -> Self {
        match raw {
            0 => BarrierPhase::Arriving,
            1 => BarrierPhase::Releasing,
            _ => BarrierPhase::Draining,
        }
    }
}

/// Outcome of a single [`SpinBarrier::wait`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarrierWaitResult {
    generation: u64,
    is_releaser: bool,
    arrived_at_release: usize,
}

impl BarrierWaitResult {
    /// Zero-based index of the round this wait belonged to.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True for exactly one caller per round: the one whose arrival completed it.
    pub fn is_releaser(&self) -> bool {
        self.is_releaser
    }

    /// Arrival count the releaser observed once every waiter had departed.
    /// Always zero for a correct round; zero for non-releasers too.
    pub fn arrived_at_release(&self) -> usize {
        self.arrived_at_release
    }
}

pub struct SpinBarrier {
    participants: usize,
    lock: Mutex<()>,
    phase: AtomicU8,
    arrived: CachePadded<AtomicUsize>,
    departed: CachePadded<AtomicUsize>,
    generation: AtomicU64,
}

impl SpinBarrier {
    /// Creates a barrier for exactly `participants` callers per round.
    ///
    /// # Panics
    ///
    /// Panics if `participants` is zero.
    pub fn new(participants: usize) -> Self {
        assert!(participants > 0, "barrier needs at least one participant");
        Self {
            participants,
            lock: Mutex::new(()),
            phase: AtomicU8::new(BarrierPhase::Arriving as u8),
            arrived: CachePadded::new(AtomicUsize::new(0)),
            departed: CachePadded::new(AtomicUsize::new(0)),
            generation: AtomicU64::new(0),
        }
    }

    pub fn participants(&self) -> usize {
        self.participants
    }

    /// Instantaneous arrival count; always within `[0, participants]`.
    pub fn arrived(&self) -> usize {
        self.arrived.load(Ordering::Acquire)
    }

    /// Number of completed rounds.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn phase(&self) -> BarrierPhase {
        BarrierPhase::from_raw(self.phase.load(Ordering::Acquire))
    }

    /// Blocks until all participants of the current round have called `wait`.
    ///
    /// A participant that never arrives deadlocks the others; there is no
    /// timeout.
    pub fn wait(&self) -> BarrierWaitResult {
        let guard = self.enter();

        let arrived = self.arrived.load(Ordering::Relaxed) + 1;
        debug_assert!(arrived <= self.participants);
        self.arrived.store(arrived, Ordering::Relaxed);

        if arrived == self.participants {
            return self.release(guard);
        }

        let generation = self.generation.load(Ordering::Relaxed);
        drop(guard);

        let backoff = Backoff::new();
        while self.arrived.load(Ordering::Acquire) != 0 {
            backoff.snooze();
        }
        self.departed.fetch_add(1, Ordering::AcqRel);

        BarrierWaitResult {
            generation,
            is_releaser: false,
            arrived_at_release: 0,
        }
    }

    /// Takes the lock once the barrier is accepting arrivals again.
    fn enter(&self) -> MutexGuard<'_, ()> {
        let backoff = Backoff::new();
        loop {
            let guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
            if self.phase() == BarrierPhase::Arriving {
                return guard;
            }
            drop(guard);
            while self.phase() != BarrierPhase::Arriving {
                backoff.snooze();
            }
        }
    }

    fn release(&self, guard: MutexGuard<'_, ()>) -> BarrierWaitResult {
        self.phase
            .store(BarrierPhase::Releasing as u8, Ordering::Release);
        self.departed.store(0, Ordering::Relaxed);
        let generation = self.generation.fetch_add(1, Ordering::AcqRel);
        self.arrived.store(0, Ordering::Release);
        self.phase
            .store(BarrierPhase::Draining as u8, Ordering::Release);
        drop(guard);

        let backoff = Backoff::new();
        while self.departed.load(Ordering::Acquire) != self.participants - 1 {
            backoff.snooze();
        }

        // Nobody may arrive while draining.
        let arrived_at_release = self.arrived.load(Ordering::Acquire);
        debug_assert_eq!(arrived_at_release, 0);
        self.phase
            .store(BarrierPhase::Arriving as u8, Ordering::Release);

        BarrierWaitResult {
            generation,
            is_releaser: true,
            arrived_at_release,
        }
    }
}

impl std::fmt::Debug for SpinBarrier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpinBarrier")
            .field("participants", &self.participants)
            .field("phase", &self.phase())
            .field("arrived", &self.arrived())
            .field("generation", &self.generation())
            .finish()
    }
}
