// SPDX-License-Identifier: Apache-2.0

//! Rotation policy: when to close the current output file and
//! open a new one with the same schema.

use std::time::Duration;

/// Sentinel written into `PreviousRow` for a binding's first sample
/// after a rotation, since there is no prior row in the new file.
pub const PREVIOUS_ROW_SENTINEL: i64 = -1;

#[derive(Debug, Clone, Copy)]
pub enum RotationPolicy {
    None,
    Daily,
    Monthly,
    Generations {
        row_limit: Option<u64>,
        time_limit: Option<Duration>,
    },
}

#[derive(Debug)]
pub struct RotationState {
    last_hour: Option<u32>,
    last_day_of_month: Option<u32>,
    opened_at: Duration,
}

impl RotationState {
    /// `opened_at` is the run-relative time (e.g. controller uptime)
    /// at which the current file was opened.
    pub fn new(opened_at: Duration) -> Self {
        Self {
            last_hour: None,
            last_day_of_month: None,
            opened_at,
        }
    }

    /// Evaluates `policy` against the current tick's wall-clock
    /// coordinates, returning whether a rotation should happen now.
    /// Always call exactly once per tick: a `Daily`/`Monthly` policy
    /// tracks the previous tick's hour/day internally.
    pub fn should_rotate(
        &mut self,
        policy: &RotationPolicy,
        hour_of_day: u32,
        day_of_month: u32,
        current_rows: u64,
        now: Duration,
    ) -> bool {
        match policy {
            RotationPolicy::None => false,
            RotationPolicy::Daily => {
                let rotate = self.last_hour.is_some_and(|prev| hour_of_day < prev);
                self.last_hour = Some(hour_of_day);
                rotate
            }
            RotationPolicy::Monthly => {
                let rotate = self
                    .last_day_of_month
                    .is_some_and(|prev| day_of_month < prev);
                self.last_day_of_month = Some(day_of_month);
                rotate
            }
            RotationPolicy::Generations { row_limit, time_limit } => {
                let row_hit = row_limit.is_some_and(|limit| current_rows >= limit);
                let time_hit = time_limit.is_some_and(|limit| now.saturating_sub(self.opened_at) >= limit);
                row_hit || time_hit
            }
        }
    }

    pub fn mark_rotated(&mut self, now: Duration) {
        self.opened_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn daily_rotation_fires_on_midnight_crossing() {
        let mut state = RotationState::new(Duration::ZERO);
        assert!(!state.should_rotate(&RotationPolicy::Daily, 23, 1, 0, Duration::ZERO));
        assert!(state.should_rotate(&RotationPolicy::Daily, 0, 2, 0, Duration::from_secs(3600)));
    }

    #[test]
    fn monthly_rotation_fires_when_day_decreases() {
        let mut state = RotationState::new(Duration::ZERO);
        assert!(!state.should_rotate(&RotationPolicy::Monthly, 0, 31, 0, Duration::ZERO));
        assert!(state.should_rotate(&RotationPolicy::Monthly, 0, 1, 0, Duration::from_secs(86_400)));
    }

    #[test]
    fn generations_rotation_fires_on_row_limit() {
        let mut state = RotationState::new(Duration::ZERO);
        let policy = RotationPolicy::Generations {
            row_limit: Some(100),
            time_limit: None,
        };
        assert!(!state.should_rotate(&policy, 0, 1, 99, Duration::ZERO));
        assert!(state.should_rotate(&policy, 0, 1, 100, Duration::ZERO));
    }

    #[test]
    fn generations_rotation_fires_on_time_limit() {
        let mut state = RotationState::new(Duration::ZERO);
        let policy = RotationPolicy::Generations {
            row_limit: None,
            time_limit: Some(Duration::from_secs(60)),
        };
        assert!(!state.should_rotate(&policy, 0, 1, 0, Duration::from_secs(30)));
        assert!(state.should_rotate(&policy, 0, 1, 0, Duration::from_secs(60)));
    }
}
