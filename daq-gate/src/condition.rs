// SPDX-License-Identifier: Apache-2.0

//! Condition evaluation: on each tick, read every condition
//! channel once and test `min <= value <= max`.

use std::collections::HashMap;

use daq_request::ConditionSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    AllMustPass,
    OneMustPass,
}

#[derive(Debug, Clone, Copy)]
pub struct GateOptions {
    pub mode: GateMode,
    /// On failure, touch the output file so observers see it as live.
    pub touch_output: bool,
    /// On failure, do not advance the step counter.
    pub retake_step: bool,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            mode: GateMode::AllMustPass,
            touch_output: false,
            retake_step: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionOutcome {
    pub passed: bool,
    pub failing_channels: Vec<String>,
}

/// Evaluates every row of `conditions` against `readings`, a
/// just-sampled value per `ControlName`. A channel missing from
/// `readings` counts as failing.
pub fn evaluate(conditions: &ConditionSet, readings: &HashMap<String, f64>) -> ConditionOutcome {
    let mut failing_channels = Vec::new();
    for row in &conditions.rows {
        let value = readings.get(&row.control_name).copied();
        let ok = value
            .map(|v| v >= row.minimum_value && v <= row.maximum_value)
            .unwrap_or(false);
        if !ok {
            failing_channels.push(row.control_name.clone());
        }
    }

    let passed = failing_channels.is_empty();
    ConditionOutcome {
        passed,
        failing_channels,
    }
}

/// Applies `options.mode` to a raw per-row outcome to decide whether
/// the gate as a whole passes.
pub fn gate_passes(outcome: &ConditionOutcome, total_rows: usize, options: &GateOptions) -> bool {
    if total_rows == 0 {
        return true;
    }
    match options.mode {
        GateMode::AllMustPass => outcome.failing_channels.is_empty(),
        GateMode::OneMustPass => outcome.failing_channels.len() < total_rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_request::ConditionRow;

    fn set(rows: Vec<ConditionRow>) -> ConditionSet {
        ConditionSet { rows }
    }

    #[test]
    fn all_must_pass_fails_if_any_row_out_of_range() {
        let conditions = set(vec![
            ConditionRow {
                control_name: "A".into(),
                minimum_value: 0.0,
                maximum_value: 10.0,
                holdoff: None,
                scale_factor: None,
            },
            ConditionRow {
                control_name: "B".into(),
                minimum_value: 0.0,
                maximum_value: 10.0,
                holdoff: None,
                scale_factor: None,
            },
        ]);
        let mut readings = HashMap::new();
        readings.insert("A".to_string(), 5.0);
        readings.insert("B".to_string(), 20.0);

        let outcome = evaluate(&conditions, &readings);
        assert_eq!(outcome.failing_channels, vec!["B".to_string()]);
        assert!(!gate_passes(&outcome, conditions.rows.len(), &GateOptions::default()));
    }

    #[test]
    fn one_must_pass_succeeds_with_a_single_passing_row() {
        let conditions = set(vec![
            ConditionRow {
                control_name: "A".into(),
                minimum_value: 0.0,
                maximum_value: 10.0,
                holdoff: None,
                scale_factor: None,
            },
            ConditionRow {
                control_name: "B".into(),
                minimum_value: 0.0,
                maximum_value: 10.0,
                holdoff: None,
                scale_factor: None,
            },
        ]);
        let mut readings = HashMap::new();
        readings.insert("A".to_string(), 5.0);
        readings.insert("B".to_string(), 20.0);

        let outcome = evaluate(&conditions, &readings);
        let options = GateOptions {
            mode: GateMode::OneMustPass,
            ..Default::default()
        };
        assert!(gate_passes(&outcome, conditions.rows.len(), &options));
    }

    #[test]
    fn missing_reading_counts_as_failing() {
        let conditions = set(vec![ConditionRow {
            control_name: "A".into(),
            minimum_value: 0.0,
            maximum_value: 10.0,
            holdoff: None,
            scale_factor: None,
        }]);
        let outcome = evaluate(&conditions, &HashMap::new());
        assert_eq!(outcome.failing_channels, vec!["A".to_string()]);
    }
}
