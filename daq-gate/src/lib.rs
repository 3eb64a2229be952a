// SPDX-License-Identifier: Apache-2.0

//! The Condition/Inhibit Gate: evaluates a conditions file on
//! each tick and folds in the inhibit channel's current value.

pub mod condition;
pub mod inhibit;

pub use condition::{evaluate, gate_passes, ConditionOutcome, GateMode, GateOptions};
pub use inhibit::{InhibitConfig, InhibitGate, InhibitState};
