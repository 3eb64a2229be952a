// SPDX-License-Identifier: Apache-2.0

//! The Trigger/Buffer Engine: a circular buffer of scalar
//! snapshots, glitch/level/alarm predicates, and the holdoff-gated
//! capture sequence.

pub mod buffer;
pub mod capture;
pub mod holdoff;
pub mod predicate;

pub use buffer::{CircularBuffer, Sample};
pub use capture::{CaptureResult, CaptureRow, FiredPredicate, TickOutcome, TriggerEngine};
pub use holdoff::{HoldoffConfig, HoldoffTracker};
pub use predicate::{
    AlarmPredicate, Direction, GlitchPredicate, LevelPredicate, SetMode, SeverityFilter,
    StatusFilter, Sign, Threshold,
};
