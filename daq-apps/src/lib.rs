// SPDX-License-Identifier: Apache-2.0

//! Shared CLI surface and setup sequence for the five acquisition
//! binaries. Each binary owns its own sampling/trigger/write loop; this
//! crate only factors out the parts every program does the same way:
//! flag parsing, request-file load, binding/connect setup, and logging
//! init.

pub mod setup;

pub use setup::{readback_names, set_up, CommonArgs, Pipeline, RunGuard};
