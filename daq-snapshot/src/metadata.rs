// SPDX-License-Identifier: Apache-2.0

//! Per-run save parameters: who ran it, when, how long connect
//! and save took, and which request/output files and description
//! apply.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RunMetadata {
    pub login_id: String,
    pub effective_uid: u32,
    pub group_id: String,
    pub save_time_unix: i64,
    pub connect_duration: Duration,
    pub save_duration: Duration,
    /// The CA pend-I/O bound this run was configured with, not a
    /// measured duration.
    pub pend_io_time: Duration,
    pub request_file: String,
    pub snapshot_filename: String,
    pub description: String,
}

impl RunMetadata {
    /// Human-readable rendering of `save_time_unix`, e.g.
    /// `"2026-08-01 12:34:56"`.
    pub fn timestamp_label(&self) -> String {
        chrono::DateTime::from_timestamp(self.save_time_unix, 0)
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| self.save_time_unix.to_string())
    }
}
