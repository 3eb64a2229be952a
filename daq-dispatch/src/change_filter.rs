// SPDX-License-Identifier: Apache-2.0

//! The per-binding change filter, used by the change-triggered
//! logger. Alarm and periodic logging use different acceptance rules
//! (severity-transition and unconditional-sample respectively) and do
//! not go through this filter.

use daq_channel::Binding;
use daq_core::Severity;

use crate::event::{Event, Payload};

/// Which fields must change (in addition to the value/tolerance
/// check) for a subsequent callback to be logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredChange {
    pub severity: bool,
    pub status: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct ChangeFilterConfig {
    pub log_initial_values: bool,
    pub required_change: RequiredChange,
}

impl Default for ChangeFilterConfig {
    fn default() -> Self {
        Self {
            log_initial_values: false,
            required_change: RequiredChange::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Emit,
    Suppress,
}

/// Decides whether `event` should become an output row for `binding`.
/// `binding` reflects state *before* this event was folded in (the
/// caller applies the event to the binding separately via
/// `daq_channel::connect::apply_callback`).
pub fn decide(
    binding: &Binding,
    event: &Event,
    tolerance: f64,
    config: &ChangeFilterConfig,
) -> Decision {
    if binding.write_pending && event.severity < most_severe_pending(binding) {
        return Decision::Suppress;
    }

    let is_first_callback = binding.callbacks_seen == 0;

    if is_first_callback {
        let suppress_initial = !config.log_initial_values
            && matches!(event.severity, Severity::NoAlarm | Severity::Invalid);
        return if suppress_initial {
            Decision::Suppress
        } else {
            Decision::Emit
        };
    }

    // The INVALID -> NO_ALARM transition that immediately follows an
    // unlogged first callback is itself never logged, but it still
    // updates last_severity (handled by the caller folding state in
    // before the *next* decision), so a later NO_ALARM -> NO_ALARM
    // value-only change is evaluated normally below.
    if binding.last_row.is_none()
        && binding.last_severity == Severity::Invalid
        && event.severity == Severity::NoAlarm
    {
        return Decision::Suppress;
    }

    let value_changed = has_value_changed(binding, event, tolerance);
    if binding.last_row.is_some() && !value_changed {
        return Decision::Suppress;
    }

    if config.required_change.severity && event.severity == binding.last_severity {
        return Decision::Suppress;
    }
    if config.required_change.status && event.status == binding.last_status {
        return Decision::Suppress;
    }

    Decision::Emit
}

fn most_severe_pending(binding: &Binding) -> Severity {
    // A pending two-phase write always corresponds to the binding's
    // last recorded severity; nothing less severe may preempt it.
    binding.last_severity
}

fn has_value_changed(binding: &Binding, event: &Event, tolerance: f64) -> bool {
    match &event.payload {
        Payload::Scalar(v) => (*v - binding.last_value).abs() >= tolerance,
        Payload::Enumerated { ordinal, .. } => (*ordinal as f64 - binding.last_value).abs() >= 1.0,
        Payload::Text(s) => binding.last_string.as_deref() != Some(s.as_str()),
        Payload::NumericWaveform(values) => match &binding.waveform {
            Some(daq_channel::WaveformPayload::Numeric(prev)) => prev != values,
            _ => true,
        },
        Payload::StringWaveform(values) => match &binding.waveform {
            Some(daq_channel::WaveformPayload::Strings(prev)) => prev != values,
            _ => true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_channel::BindingId;
    use daq_core::{SourceTimestamp, Status};

    fn scalar_event(value: f64, severity: Severity) -> Event {
        Event {
            binding: BindingId(0),
            source_time: SourceTimestamp::default(),
            client_time: SourceTimestamp::default(),
            status: Status::NoAlarm,
            severity,
            payload: Payload::Scalar(value),
            related_value: None,
        }
    }

    #[test]
    fn first_callback_suppressed_when_no_alarm_and_not_logging_initial() {
        let binding = Binding::new(BindingId(0), "X");
        let event = scalar_event(1.0, Severity::NoAlarm);
        let decision = decide(&binding, &event, 0.01, &ChangeFilterConfig::default());
        assert_eq!(decision, Decision::Suppress);
    }

    #[test]
    fn first_callback_emitted_when_log_initial_values_set() {
        let binding = Binding::new(BindingId(0), "X");
        let event = scalar_event(1.0, Severity::NoAlarm);
        let config = ChangeFilterConfig {
            log_initial_values: true,
            ..Default::default()
        };
        assert_eq!(decide(&binding, &event, 0.01, &config), Decision::Emit);
    }

    #[test]
    fn small_delta_below_tolerance_is_suppressed() {
        let mut binding = Binding::new(BindingId(0), "X");
        binding.callbacks_seen = 1;
        binding.last_row = Some(0);
        binding.last_value = 10.0;
        binding.last_severity = Severity::NoAlarm;
        let event = scalar_event(10.005, Severity::NoAlarm);
        assert_eq!(
            decide(&binding, &event, 0.01, &ChangeFilterConfig::default()),
            Decision::Suppress
        );
    }

    #[test]
    fn delta_at_or_above_tolerance_is_emitted() {
        let mut binding = Binding::new(BindingId(0), "X");
        binding.callbacks_seen = 1;
        binding.last_row = Some(0);
        binding.last_value = 10.0;
        binding.last_severity = Severity::NoAlarm;
        let event = scalar_event(10.02, Severity::NoAlarm);
        assert_eq!(
            decide(&binding, &event, 0.01, &ChangeFilterConfig::default()),
            Decision::Emit
        );
    }

    #[test]
    fn more_severe_pending_write_blocks_less_severe_callback() {
        let mut binding = Binding::new(BindingId(0), "X");
        binding.write_pending = true;
        binding.last_severity = Severity::Major;
        let event = scalar_event(1.0, Severity::Minor);
        assert_eq!(
            decide(&binding, &event, 0.01, &ChangeFilterConfig::default()),
            Decision::Suppress
        );
    }
}
