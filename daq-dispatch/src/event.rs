// SPDX-License-Identifier: Apache-2.0

//! The normalized `Event`: what a `RawCallback` becomes once the
//! dispatcher attaches binding identity and, for alarm events, a
//! related-value attachment.

use daq_channel::BindingId;
use daq_core::{Severity, SourceTimestamp, Status};

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Scalar(f64),
    Enumerated { ordinal: i32, label: String },
    Text(String),
    NumericWaveform(Vec<f64>),
    StringWaveform(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub binding: BindingId,
    pub source_time: SourceTimestamp,
    pub client_time: SourceTimestamp,
    pub status: Status,
    pub severity: Severity,
    pub payload: Payload,
    /// Populated by the two-phase related-value pattern once
    /// the follow-up get completes.
    pub related_value: Option<String>,
}

impl Event {
    pub fn from_raw(
        binding: BindingId,
        raw: &daq_channel::RawCallback,
    ) -> Self {
        let payload = match &raw.value {
            daq_channel::RawValue::Numeric(v) => Payload::Scalar(*v),
            daq_channel::RawValue::Text(s) => Payload::Text(s.clone()),
            daq_channel::RawValue::NumericWaveform(v) => Payload::NumericWaveform(v.clone()),
            daq_channel::RawValue::StringWaveform(v) => Payload::StringWaveform(v.clone()),
        };
        Event {
            binding,
            source_time: raw.source_time,
            client_time: raw.client_time,
            status: raw.status,
            severity: raw.severity,
            payload,
            related_value: None,
        }
    }
}
