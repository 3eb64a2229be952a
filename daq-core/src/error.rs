// SPDX-License-Identifier: Apache-2.0

//! The error kinds this workspace's crates produce, aggregated into a single
//! top-level error so the Run Controller can match on `DaqError::kind`
//! without depending on every crate's concrete error type.

use std::fmt;

/// Coarse classification of a `DaqError`: the fatal-or-not kinds plus the
/// signal/corruption kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Fatal: a file does not match its expected columns/parameters.
    Schema,
    /// Not fatal per-channel: a channel failed to connect.
    Connect,
    /// Per get/put: logged and counted, never fatal by itself.
    TransientCa,
    /// Informational: acquisition is paused pending an inhibit channel.
    InhibitActive,
    /// Informational: a condition predicate failed this tick.
    ConditionFail,
    /// Fatal: the supervisor connection was lost or it aborted the run.
    SupervisorLost,
    /// Fatal unless a recovery pass is configured.
    FileCorruption,
    /// The process is terminating due to a fatal signal.
    FatalSignal,
}

impl ErrorKind {
    /// Whether this kind terminates the run by itself, independent of
    /// any retry/recovery policy layered on top.
    pub const fn is_fatal_by_default(self) -> bool {
        matches!(
            self,
            ErrorKind::Schema
                | ErrorKind::SupervisorLost
                | ErrorKind::FileCorruption
                | ErrorKind::FatalSignal
        )
    }
}

/// Top-level error type threaded through the Run Controller.
#[derive(Debug, thiserror::Error)]
pub enum DaqError {
    #[error("schema error: {0}")]
    Schema(String),

    #[error("channel '{channel}' did not connect within {timeout_secs:.1}s")]
    Connect { channel: String, timeout_secs: f64 },

    #[error("transient CA error on '{channel}': {detail}")]
    TransientCa { channel: String, detail: String },

    #[error("inhibit channel active, pausing for {wait_secs:.1}s")]
    InhibitActive { wait_secs: f64 },

    #[error("condition check failed: {detail}")]
    ConditionFail { detail: String },

    #[error("supervisor lost: {0}")]
    SupervisorLost(String),

    #[error("output file corrupted: {path} ({detail})")]
    FileCorruption { path: String, detail: String },

    #[error("terminated by fatal signal {signal}")]
    FatalSignal { signal: i32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DaqError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DaqError::Schema(_) => ErrorKind::Schema,
            DaqError::Connect { .. } => ErrorKind::Connect,
            DaqError::TransientCa { .. } => ErrorKind::TransientCa,
            DaqError::InhibitActive { .. } => ErrorKind::InhibitActive,
            DaqError::ConditionFail { .. } => ErrorKind::ConditionFail,
            DaqError::SupervisorLost(_) => ErrorKind::SupervisorLost,
            DaqError::FileCorruption { .. } => ErrorKind::FileCorruption,
            DaqError::FatalSignal { .. } => ErrorKind::FatalSignal,
            DaqError::Io(_) => ErrorKind::Schema,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal_by_default()
    }
}

/// Distinct, named termination reasons for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    DeadlineReached,
    StepCountReached,
    InhibitOnStartup,
    StopChannelNonZero,
    InputFileModified,
    FatalSignal(i32),
    SupervisorTimeout,
    SupervisorAbort,
}

impl TerminationReason {
    /// The process exit code associated with this reason.
    pub const fn exit_code(self) -> i32 {
        match self {
            TerminationReason::InhibitOnStartup => 0,
            TerminationReason::DeadlineReached
            | TerminationReason::StepCountReached
            | TerminationReason::StopChannelNonZero
            | TerminationReason::InputFileModified => 0,
            TerminationReason::FatalSignal(_)
            | TerminationReason::SupervisorTimeout
            | TerminationReason::SupervisorAbort => 1,
        }
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::DeadlineReached => write!(f, "deadline reached"),
            TerminationReason::StepCountReached => write!(f, "step count reached"),
            TerminationReason::InhibitOnStartup => write!(f, "inhibit active on startup"),
            TerminationReason::StopChannelNonZero => write!(f, "stop channel went non-zero"),
            TerminationReason::InputFileModified => write!(f, "request file modified"),
            TerminationReason::FatalSignal(sig) => write!(f, "fatal signal {sig}"),
            TerminationReason::SupervisorTimeout => write!(f, "supervisor timeout"),
            TerminationReason::SupervisorAbort => write!(f, "supervisor abort"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_spec_table() {
        assert_eq!(TerminationReason::InhibitOnStartup.exit_code(), 0);
        assert_eq!(TerminationReason::DeadlineReached.exit_code(), 0);
        assert_eq!(TerminationReason::SupervisorAbort.exit_code(), 1);
        assert_eq!(TerminationReason::FatalSignal(11).exit_code(), 1);
    }

    #[test]
    fn schema_and_corruption_are_fatal_by_default() {
        assert!(ErrorKind::Schema.is_fatal_by_default());
        assert!(ErrorKind::FileCorruption.is_fatal_by_default());
        assert!(!ErrorKind::TransientCa.is_fatal_by_default());
        assert!(!ErrorKind::ConditionFail.is_fatal_by_default());
    }
}
