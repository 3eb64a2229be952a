// SPDX-License-Identifier: Apache-2.0

//! The Run Controller: scheduling, rotation policy, signal
//! handling, the request-file watch, and the supervisor handshake.

pub mod context;
pub mod rotation;
pub mod signals;
pub mod supervisor;
pub mod watch;

pub use context::{cap_wait, RunController, RunOptions};
pub use rotation::{RotationPolicy, RotationState, PREVIOUS_ROW_SENTINEL};
pub use signals::{SignalClass, FATAL_SIGNALS, GRACEFUL_SIGNALS};
pub use supervisor::{NullSupervisor, PingOutcome, PingPolicy, PvSupervisor, Supervisor};
pub use watch::RequestFileWatch;
