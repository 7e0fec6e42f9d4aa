/*!
 * Flush scheduler.
 *
 * A small state machine deciding when queued requests are dispatched:
 *
 * - `Idle` -> `Scheduled` on the first flush request, with the initial delay
 *   when a single group is waiting and the follow-up delay otherwise.
 * - `Scheduled` -> `Scheduled` on every further request (debounce), unless the
 *   oldest queued item has waited `max_wait_time`, in which case it fires now.
 * - `Scheduled` -> `Flushing` when the armed timer fires.
 * - `Flushing` -> `Idle`, or straight back to `Scheduled` when requests
 *   arrived while the flush was running.
 *
 * The scheduler owns no timers. Every armed timer carries a generation and a
 * timer whose generation is no longer current must do nothing when it fires.
 */

use log::debug;
use std::time::{Duration, Instant};

use crate::app_config::BatchingConfig;

/// Identifies one running flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Scheduled { generation: u64, deadline: Instant },
    Flushing { ticket: FlushTicket },
}

/// What the caller must do with its timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    /// Replace any armed timer with one firing `generation` after `delay`
    Arm { generation: u64, delay: Duration },
    /// Replace any armed timer and fire `generation` right away
    FireNow { generation: u64 },
    /// A flush is running; it reschedules itself when it completes
    Deferred,
}

#[derive(Debug)]
pub struct FlushScheduler {
    state: SchedulerState,
    generation: u64,
    initial_delay: Duration,
    followup_delay: Duration,
    max_wait: Duration,
}

impl FlushScheduler {
    pub fn new(config: &BatchingConfig) -> Self {
        Self {
            state: SchedulerState::Idle,
            generation: 0,
            initial_delay: config.initial_batch_delay(),
            followup_delay: config.followup_batch_delay(),
            max_wait: config.max_wait_time(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Request a flush after a request was queued
    pub fn request_flush(
        &mut self,
        group_count: usize,
        first_queued_at: Option<Instant>,
        now: Instant,
    ) -> ScheduleDecision {
        if let SchedulerState::Flushing { .. } = self.state {
            return ScheduleDecision::Deferred;
        }

        self.generation += 1;
        let generation = self.generation;

        let waited = first_queued_at
            .map(|at| now.saturating_duration_since(at))
            .unwrap_or_default();
        if waited >= self.max_wait {
            debug!("Queued work waited {:?}, flushing now", waited);
            self.state = SchedulerState::Scheduled { generation, deadline: now };
            return ScheduleDecision::FireNow { generation };
        }

        let delay = if group_count <= 1 {
            self.initial_delay
        } else {
            self.followup_delay
        };
        self.state = SchedulerState::Scheduled {
            generation,
            deadline: now + delay,
        };

        ScheduleDecision::Arm { generation, delay }
    }

    /// A timer armed for `generation` fired
    ///
    /// Returns `None` when the timer was superseded.
    pub fn begin_flush(&mut self, generation: u64) -> Option<FlushTicket> {
        match self.state {
            SchedulerState::Scheduled { generation: current, .. } if current == generation => {
                Some(self.enter_flushing())
            }
            _ => None,
        }
    }

    /// Start a flush outside the timer, invalidating any armed timer
    ///
    /// Returns `None` when another flush is already running.
    pub fn begin_immediate(&mut self) -> Option<FlushTicket> {
        if let SchedulerState::Flushing { .. } = self.state {
            return None;
        }
        Some(self.enter_flushing())
    }

    /// The flush holding `ticket` completed
    ///
    /// Re-arms with the follow-up delay when work was queued meanwhile.
    pub fn finish_flush(&mut self, ticket: FlushTicket, has_queued: bool, now: Instant) -> Option<ScheduleDecision> {
        match self.state {
            SchedulerState::Flushing { ticket: current } if current == ticket => {}
            _ => return None,
        }

        if !has_queued {
            self.state = SchedulerState::Idle;
            return None;
        }

        self.generation += 1;
        let generation = self.generation;
        self.state = SchedulerState::Scheduled {
            generation,
            deadline: now + self.followup_delay,
        };

        Some(ScheduleDecision::Arm {
            generation,
            delay: self.followup_delay,
        })
    }

    /// Back to `Idle`, invalidating any armed timer and running flush
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = SchedulerState::Idle;
    }

    fn enter_flushing(&mut self) -> FlushTicket {
        self.generation += 1;
        let ticket = FlushTicket(self.generation);
        self.state = SchedulerState::Flushing { ticket };
        ticket
    }
}
