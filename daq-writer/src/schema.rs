// SPDX-License-Identifier: Apache-2.0

//! Auxiliary columns and the per-mode schema builders.

use daq_table::{DataType, Layout};

/// Columns that are never a request-row readback name but are always
/// allowed to coexist with them in an output file.
pub const AUXILIARY_COLUMNS: &[&str] = &["Step", "Time", "TimeOfDay", "DayOfMonth", "CAerrors"];

/// Builds the alarm-log schema: one row per logged event,
/// columns for identity/time/status/severity/value/related-value.
pub fn alarm_log_layout() -> Layout {
    Layout::new()
        .with_parameter("StartTime", DataType::F64)
        .with_column("ControlName", DataType::Str)
        .with_column("Time", DataType::F64)
        .with_column("Hour", DataType::F64)
        .with_column("AlarmStatus", DataType::Str)
        .with_column("AlarmSeverity", DataType::Str)
        .with_column("Value", DataType::F64)
        .with_column("RelatedValue", DataType::Str)
        .with_column("Duration", DataType::F64)
        .with_column("PreviousRow", DataType::I64)
}

/// Builds the periodic-log schema: StartTime/StartHour/... page
/// parameters, then Step/Time/TimeOfDay/DayOfMonth/CAerrors plus one
/// column per readback name.
pub fn periodic_log_layout(readback_names: &[&str]) -> Layout {
    let mut layout = Layout::new()
        .with_parameter("StartTime", DataType::F64)
        .with_parameter("StartHour", DataType::F64)
        .with_parameter("StartYear", DataType::I64)
        .with_parameter("StartMonth", DataType::I64)
        .with_parameter("StartDayOfMonth", DataType::I64)
        .with_parameter("StartJulianDay", DataType::I64)
        .with_parameter("YearStartTime", DataType::F64)
        .with_parameter("TimeStamp", DataType::Str)
        .with_parameter("PageTimeStamp", DataType::Str)
        .with_column("Step", DataType::I64)
        .with_column("Time", DataType::F64)
        .with_column("TimeOfDay", DataType::F64)
        .with_column("DayOfMonth", DataType::I64)
        .with_column("CAerrors", DataType::I64);
    for name in readback_names {
        layout = layout.with_column(*name, DataType::F64);
    }
    layout
}

/// Builds the change-log schema: same shape as the periodic log but
/// without a guaranteed row per tick.
pub fn change_log_layout(readback_names: &[&str]) -> Layout {
    periodic_log_layout(readback_names)
}

/// Builds the monitor-family schema: a page per trigger, with
/// per-predicate Triggered parameters and a PostTrigger column.
pub fn monitor_layout(readback_names: &[&str], predicate_names: &[&str]) -> Layout {
    let mut layout = Layout::new()
        .with_parameter("StartTime", DataType::F64)
        .with_parameter("AlarmSeverity", DataType::I64);
    for predicate in predicate_names {
        layout = layout.with_parameter(format!("{predicate}Triggered"), DataType::I64);
    }
    layout = layout
        .with_column("Step", DataType::I64)
        .with_column("Time", DataType::F64)
        .with_column("PostTrigger", DataType::I64);
    for name in readback_names {
        layout = layout.with_column(*name, DataType::F64);
    }
    layout
}
