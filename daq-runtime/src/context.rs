// SPDX-License-Identifier: Apache-2.0

//! The Run Controller's scheduling loop: bounded waits capped
//! to the supervisor's ping interval, deadline/step-count/signal
//! checks, and the supervisor handshake.

use std::time::{Duration, Instant};

use daq_core::{DaqError, TerminationReason};

use crate::signals::{self};
use crate::supervisor::{PingOutcome, PingPolicy, Supervisor};

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub deadline: Option<Duration>,
    pub step_limit: Option<u64>,
    pub sampling_interval: Duration,
    pub ping_policy: PingPolicy,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            deadline: None,
            step_limit: None,
            sampling_interval: Duration::from_secs(1),
            ping_policy: PingPolicy::default(),
        }
    }
}

/// Breaks a wait of `total` into at most `ping_interval`-sized naps,
/// so a caller looping `pend_event(nap)` over the returned sequence
/// never goes longer than `ping_interval` without a chance to ping
/// the supervisor.
pub fn cap_wait(total: Duration, ping_interval: Duration) -> Vec<Duration> {
    if total.is_zero() {
        return Vec::new();
    }
    let ping_interval = if ping_interval.is_zero() {
        total
    } else {
        ping_interval
    };
    let mut naps = Vec::new();
    let mut remaining = total;
    while !remaining.is_zero() {
        let nap = remaining.min(ping_interval);
        naps.push(nap);
        remaining -= nap;
    }
    naps
}

pub struct RunController<S: Supervisor> {
    options: RunOptions,
    supervisor: S,
    started_at: Instant,
    last_ping: Instant,
    tick: u64,
}

impl<S: Supervisor> RunController<S> {
    pub fn new(options: RunOptions, mut supervisor: S) -> Result<Self, DaqError> {
        supervisor.init()?;
        let now = Instant::now();
        Ok(Self {
            options,
            supervisor,
            started_at: now,
            last_ping: now,
            tick: 0,
        })
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn advance_tick(&mut self) {
        self.tick += 1;
    }

    pub fn sampling_interval(&self) -> Duration {
        self.options.sampling_interval
    }

    /// Checks the deadline, step limit, and any recorded signal. Call
    /// once per sampling tick, after the tick's acquisition work.
    pub fn check_termination(&self) -> Option<TerminationReason> {
        if let Some((sig, _class)) = signals::take_signal() {
            return Some(TerminationReason::FatalSignal(sig));
        }
        if let Some(deadline) = self.options.deadline {
            if self.started_at.elapsed() >= deadline {
                return Some(TerminationReason::DeadlineReached);
            }
        }
        if let Some(limit) = self.options.step_limit {
            if self.tick >= limit {
                return Some(TerminationReason::StepCountReached);
            }
        }
        None
    }

    /// Pings the supervisor if the configured interval has elapsed
    /// since the last ping; a no-op otherwise.
    pub fn maybe_ping(&mut self) -> Result<Option<TerminationReason>, DaqError> {
        if self.last_ping.elapsed() < self.options.ping_policy.interval {
            return Ok(None);
        }
        self.last_ping = Instant::now();
        Ok(match self.supervisor.ping()? {
            PingOutcome::Ok => None,
            PingOutcome::Abort => Some(TerminationReason::SupervisorAbort),
            PingOutcome::Timeout => Some(TerminationReason::SupervisorTimeout),
        })
    }

    pub fn finish(mut self, _reason: TerminationReason) {
        self.supervisor.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervisor::NullSupervisor;

    #[test]
    fn cap_wait_splits_into_ping_interval_sized_naps() {
        let naps = cap_wait(Duration::from_secs(5), Duration::from_secs(2));
        assert_eq!(naps.len(), 3);
        assert_eq!(naps.iter().sum::<Duration>(), Duration::from_secs(5));
        assert!(naps.iter().all(|n| *n <= Duration::from_secs(2)));
    }

    #[test]
    fn cap_wait_of_zero_yields_no_naps() {
        assert!(cap_wait(Duration::ZERO, Duration::from_secs(2)).is_empty());
    }

    #[test]
    fn step_limit_triggers_termination() {
        let options = RunOptions {
            step_limit: Some(3),
            ..Default::default()
        };
        let mut controller = RunController::new(options, NullSupervisor).unwrap();
        controller.advance_tick();
        controller.advance_tick();
        controller.advance_tick();
        assert_eq!(
            controller.check_termination(),
            Some(TerminationReason::StepCountReached)
        );
    }
}
