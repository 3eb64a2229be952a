// SPDX-License-Identifier: Apache-2.0

//! Holdoff policy: `holdoff=<T>` suppresses new triggers for T
//! seconds after a fire; `autoHoldoff` converts T into "however long
//! it takes to flush the after-buffer". The larger of the two wins
//! when multiple predicates configure holdoff.
//!
//! Expressed in sampling ticks rather than wall-clock time, since the
//! Run Controller's tick rate is the only clock the engine needs.

#[derive(Debug, Clone, Copy)]
pub enum HoldoffConfig {
    Fixed { ticks: u64 },
    Auto,
}

#[derive(Debug, Default)]
pub struct HoldoffTracker {
    suppress_until_tick: u64,
}

impl HoldoffTracker {
    pub fn is_suppressed(&self, tick: u64) -> bool {
        tick < self.suppress_until_tick
    }

    /// Begins a holdoff window starting at `tick`, sized to the
    /// largest of the given configs (`Auto` resolves to
    /// `after_ticks`, the number of post-trigger samples).
    pub fn begin(&mut self, tick: u64, configs: &[HoldoffConfig], after_ticks: u64) {
        let ticks = configs
            .iter()
            .map(|c| match c {
                HoldoffConfig::Fixed { ticks } => *ticks,
                HoldoffConfig::Auto => after_ticks,
            })
            .max()
            .unwrap_or(0);
        self.suppress_until_tick = tick + ticks;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn larger_of_fixed_and_auto_holdoff_wins() {
        let mut tracker = HoldoffTracker::default();
        tracker.begin(
            10,
            &[HoldoffConfig::Fixed { ticks: 2 }, HoldoffConfig::Auto],
            5,
        );
        assert!(tracker.is_suppressed(14));
        assert!(!tracker.is_suppressed(15));
    }
}
