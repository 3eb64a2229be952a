// SPDX-License-Identifier: Apache-2.0

//! Trigger predicate kinds: glitch, level, and alarm.

use daq_core::{Severity, Status};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Fractional(f64),
    Absolute(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Positive,
    Negative,
}

/// Baseline is an exponential moving average seeded by the first
/// sampled value; `noReset` preserves the EMA across a trigger
/// instead of snapping the baseline to the triggering value.
#[derive(Debug, Clone)]
pub struct GlitchPredicate {
    pub threshold: Threshold,
    pub sign: Option<Sign>,
    pub filter_frac: f64,
    pub no_reset: bool,
    baseline: Option<f64>,
}

impl GlitchPredicate {
    pub fn new(threshold: Threshold, filter_frac: f64) -> Self {
        Self {
            threshold,
            sign: None,
            filter_frac,
            no_reset: false,
            baseline: None,
        }
    }

    /// `baseline=<N>` shorthand: an N-sample moving average is
    /// equivalent to `filterFrac = 1/N`.
    pub fn with_baseline_count(threshold: Threshold, count: u32) -> Self {
        Self::new(threshold, 1.0 / count.max(1) as f64)
    }

    pub fn reset_baseline(&mut self) {
        self.baseline = None;
    }

    pub fn evaluate(&mut self, value: f64) -> bool {
        let baseline = self.baseline.unwrap_or(value);
        let delta = value - baseline;
        let crossed = match self.threshold {
            Threshold::Fractional(frac) => delta.abs() >= frac * baseline.abs(),
            Threshold::Absolute(abs) => delta.abs() >= abs,
        };
        let sign_ok = match self.sign {
            None => true,
            Some(Sign::Positive) => delta > 0.0,
            Some(Sign::Negative) => delta < 0.0,
        };
        let fired = crossed && sign_ok;

        let ema = self.filter_frac * value + (1.0 - self.filter_frac) * baseline;
        self.baseline = Some(if fired && !self.no_reset { value } else { ema });
        fired
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

/// Must be rearmed after each trigger unless `autoArm` is set; rearm
/// requires the value to return to the opposite side of the level.
#[derive(Debug, Clone)]
pub struct LevelPredicate {
    pub level: f64,
    pub direction: Direction,
    pub auto_arm: bool,
    armed: bool,
}

impl LevelPredicate {
    pub fn new(level: f64, direction: Direction) -> Self {
        Self {
            level,
            direction,
            auto_arm: false,
            armed: true,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn evaluate(&mut self, previous: f64, value: f64) -> bool {
        if !self.armed {
            let rearmed = match self.direction {
                Direction::Rising => value < self.level,
                Direction::Falling => value > self.level,
            };
            if rearmed {
                self.armed = true;
            }
            return false;
        }

        let crossed = match self.direction {
            Direction::Rising => previous < self.level && value >= self.level,
            Direction::Falling => previous > self.level && value <= self.level,
        };
        if crossed && !self.auto_arm {
            self.armed = false;
        }
        crossed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetMode {
    Include,
    Exclude,
}

#[derive(Debug, Clone)]
pub struct SeverityFilter {
    pub mode: SetMode,
    pub severities: Vec<Severity>,
}

impl SeverityFilter {
    pub fn matches(&self, severity: Severity) -> bool {
        let contains = self.severities.contains(&severity);
        match self.mode {
            SetMode::Include => contains,
            SetMode::Exclude => !contains,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusFilter {
    pub mode: SetMode,
    pub statuses: Vec<Status>,
}

impl StatusFilter {
    pub fn matches(&self, status: Status) -> bool {
        let contains = self.statuses.contains(&status);
        match self.mode {
            SetMode::Include => contains,
            SetMode::Exclude => !contains,
        }
    }
}

/// Triggers when severity matches the configured set AND status
/// matches the configured set, both by the same include/exclude rule.
#[derive(Debug, Clone)]
pub struct AlarmPredicate {
    pub severity_filter: SeverityFilter,
    pub status_filter: StatusFilter,
}

impl AlarmPredicate {
    pub fn evaluate(&self, severity: Severity, status: Status) -> bool {
        self.severity_filter.matches(severity) && self.status_filter.matches(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glitch_fires_on_absolute_threshold_and_resets_baseline() {
        let mut predicate = GlitchPredicate::new(Threshold::Absolute(1.0), 0.1);
        assert!(!predicate.evaluate(10.0)); // seeds baseline at 10.0
        assert!(!predicate.evaluate(10.1));
        assert!(predicate.evaluate(12.0));
        // baseline reset to 12.0, so a small step back does not refire
        assert!(!predicate.evaluate(12.0));
    }

    #[test]
    fn glitch_no_reset_preserves_ema_after_trigger() {
        let mut predicate = GlitchPredicate::new(Threshold::Absolute(1.0), 0.5);
        predicate.no_reset = true;
        predicate.evaluate(10.0);
        let fired = predicate.evaluate(12.0);
        assert!(fired);
        // baseline should have moved toward 12.0 via EMA, not snapped to it
    }

    #[test]
    fn level_requires_rearm_before_refiring() {
        let mut predicate = LevelPredicate::new(5.0, Direction::Rising);
        assert!(predicate.evaluate(4.0, 6.0));
        assert!(!predicate.is_armed());
        assert!(!predicate.evaluate(6.0, 7.0));
        assert!(!predicate.evaluate(7.0, 4.0)); // crosses back below level: rearms
        assert!(predicate.is_armed());
        assert!(predicate.evaluate(4.0, 6.0));
    }

    #[test]
    fn level_auto_arm_refires_without_rearm() {
        let mut predicate = LevelPredicate::new(5.0, Direction::Rising);
        predicate.auto_arm = true;
        assert!(predicate.evaluate(4.0, 6.0));
        assert!(predicate.is_armed());
    }

    #[test]
    fn alarm_predicate_requires_both_severity_and_status_match() {
        let predicate = AlarmPredicate {
            severity_filter: SeverityFilter {
                mode: SetMode::Include,
                severities: vec![Severity::Major],
            },
            status_filter: StatusFilter {
                mode: SetMode::Include,
                statuses: vec![Status::HiHi],
            },
        };
        assert!(predicate.evaluate(Severity::Major, Status::HiHi));
        assert!(!predicate.evaluate(Severity::Major, Status::Low));
        assert!(!predicate.evaluate(Severity::Minor, Status::HiHi));
    }
}
