// SPDX-License-Identifier: Apache-2.0

//! The capture sequence: freeze the buffer, emit pre-trigger
//! rows with `PostTrigger = 0`, emit `after` post-trigger rows with
//! `PostTrigger = 1`, then begin holdoff.

use daq_core::Severity;

use crate::buffer::{CircularBuffer, Sample};
use crate::holdoff::{HoldoffConfig, HoldoffTracker};

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRow {
    pub sample: Sample,
    pub post_trigger: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaptureResult {
    pub rows: Vec<CaptureRow>,
    pub triggered_predicates: Vec<String>,
    pub alarm_severity: Option<Severity>,
}

/// What fired on this tick, named so the output page's per-predicate
/// "Triggered" parameters can be set.
#[derive(Debug, Clone)]
pub struct FiredPredicate {
    pub name: String,
    pub holdoff: HoldoffConfig,
    pub alarm_severity: Option<Severity>,
}

#[derive(Debug)]
struct CaptureState {
    remaining_after: usize,
    rows: Vec<CaptureRow>,
    triggered_predicates: Vec<String>,
    alarm_severity: Option<Severity>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Buffering,
    Capturing,
    PageReady,
}

/// Drives the circular buffer and the capture state machine across
/// ticks. A single sampling tick can match multiple predicates; the
/// caller passes every predicate that fired this tick.
#[derive(Debug)]
pub struct TriggerEngine {
    buffer: CircularBuffer,
    after: usize,
    holdoff: HoldoffTracker,
    capturing: Option<CaptureState>,
    last_result: Option<CaptureResult>,
}

impl TriggerEngine {
    pub fn new(before: usize, after: usize) -> Self {
        Self {
            buffer: CircularBuffer::new(before),
            after,
            holdoff: HoldoffTracker::default(),
            capturing: None,
            last_result: None,
        }
    }

    pub fn buffer(&self) -> &CircularBuffer {
        &self.buffer
    }

    /// Resets the buffer, per the inhibit-entry reset policy,
    /// so a later resumption does not fire spuriously.
    pub fn reset_on_inhibit(&mut self) {
        self.buffer.clear();
        self.capturing = None;
    }

    pub fn take_page(&mut self) -> Option<CaptureResult> {
        self.last_result.take()
    }

    pub fn on_tick(&mut self, tick: u64, sample: Sample, fired: Vec<FiredPredicate>) -> TickOutcome {
        if let Some(state) = &mut self.capturing {
            state.rows.push(CaptureRow {
                sample,
                post_trigger: true,
            });
            state.remaining_after -= 1;
            if state.remaining_after == 0 {
                let state = self.capturing.take().unwrap();
                self.last_result = Some(CaptureResult {
                    rows: state.rows,
                    triggered_predicates: state.triggered_predicates,
                    alarm_severity: state.alarm_severity,
                });
                return TickOutcome::PageReady;
            }
            return TickOutcome::Capturing;
        }

        self.buffer.push(sample);

        if fired.is_empty() || self.holdoff.is_suppressed(tick) {
            return TickOutcome::Buffering;
        }

        let rows: Vec<CaptureRow> = self
            .buffer
            .iter()
            .cloned()
            .map(|sample| CaptureRow {
                sample,
                post_trigger: false,
            })
            .collect();
        let triggered_predicates = fired.iter().map(|f| f.name.clone()).collect();
        let alarm_severity = fired.iter().find_map(|f| f.alarm_severity);
        let holdoff_configs: Vec<HoldoffConfig> = fired.iter().map(|f| f.holdoff).collect();
        self.holdoff.begin(tick, &holdoff_configs, self.after as u64);

        if self.after == 0 {
            self.last_result = Some(CaptureResult {
                rows,
                triggered_predicates,
                alarm_severity,
            });
            return TickOutcome::PageReady;
        }

        self.capturing = Some(CaptureState {
            remaining_after: self.after,
            rows,
            triggered_predicates,
            alarm_severity,
        });
        TickOutcome::Capturing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_core::SourceTimestamp;

    fn sample(tick: u64, value: f64) -> Sample {
        Sample {
            tick,
            time: SourceTimestamp::default(),
            values: vec![value],
        }
    }

    fn fired(name: &str) -> Vec<FiredPredicate> {
        vec![FiredPredicate {
            name: name.to_string(),
            holdoff: HoldoffConfig::Fixed { ticks: 0 },
            alarm_severity: None,
        }]
    }

    // S2 (glitch): before=3, after=2; values
    // 10.0, 10.1, 10.0, 12.0, 11.9, 11.8, 11.7; trigger at tick 3 (value 12.0).
    #[test]
    fn pre_post_buffer_completeness_matches_s2_shape() {
        let mut engine = TriggerEngine::new(3, 2);
        let values = [10.0, 10.1, 10.0, 12.0, 11.9, 11.8, 11.7];
        let mut page = None;
        for (tick, value) in values.iter().enumerate() {
            let tick = tick as u64;
            let firing = if tick == 3 { fired("glitch") } else { Vec::new() };
            let outcome = engine.on_tick(tick, sample(tick, *value), firing);
            if outcome == TickOutcome::PageReady {
                page = engine.take_page();
                break;
            }
        }
        let page = page.expect("trigger should have produced a page");
        assert_eq!(page.rows.len(), 6);
        assert!(page.rows[..4].iter().all(|r| !r.post_trigger));
        assert!(page.rows[4..].iter().all(|r| r.post_trigger));
        assert_eq!(page.rows[3].sample.values, vec![12.0]);
    }

    #[test]
    fn empty_before_buffer_still_includes_trigger_sample() {
        let mut engine = TriggerEngine::new(0, 0);
        let outcome = engine.on_tick(0, sample(0, 99.0), fired("level"));
        assert_eq!(outcome, TickOutcome::PageReady);
        let page = engine.take_page().unwrap();
        assert_eq!(page.rows.len(), 1);
        assert!(!page.rows[0].post_trigger);
    }

    #[test]
    fn holdoff_suppresses_immediate_retrigger() {
        let mut engine = TriggerEngine::new(0, 0);
        engine.on_tick(
            0,
            sample(0, 1.0),
            vec![FiredPredicate {
                name: "level".to_string(),
                holdoff: HoldoffConfig::Fixed { ticks: 3 },
                alarm_severity: None,
            }],
        );
        engine.take_page();
        let outcome = engine.on_tick(1, sample(1, 1.0), fired("level"));
        assert_eq!(outcome, TickOutcome::Buffering);
    }
}
