// SPDX-License-Identifier: Apache-2.0

//! The Request Model and the conditions-file reader used by
//! the Condition/Inhibit Gate.

pub mod conditions;
pub mod error;
pub mod request;

pub use conditions::{ConditionRow, ConditionSet};
pub use error::RequestError;
pub use request::{load, LoadOptions, RequestRow, RequestSet};
