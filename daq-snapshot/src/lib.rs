// SPDX-License-Identifier: Apache-2.0

//! Snapshot Save/Restore: format/compare scalar values, save a
//! bulk get to a table plus waveform side-cars, restore from a saved
//! table with optional verify, and drive a trigger-channel daemon
//! cycle.

pub mod daemon;
pub mod format;
pub mod metadata;
pub mod restore;
pub mod save;

pub use daemon::{acknowledge_trigger, current_input_filename, poll_trigger, publish_output_name, DaemonConfig, TriggerCause};
pub use format::{format_scalar, format_significant, format_string_value, values_match, ScalarKind};
pub use metadata::RunMetadata;
pub use restore::{restore, RestoreReport, VerifyFailure};
pub use save::{build_table, build_waveform_sidecar, save, snapshot_layout, SnapshotRow, SnapshotSet, WaveformSnapshot, WaveformValues};
