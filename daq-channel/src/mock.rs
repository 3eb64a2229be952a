// SPDX-License-Identifier: Apache-2.0

//! A deterministic, in-process `ChannelProvider` used by tests across
//! the workspace: a scriptable fake exposed behind a `testing`
//! feature rather than mocking at the trait-object level per call
//! site.

use std::collections::HashMap;
use std::time::{Duration, SystemTime};

use crossbeam_channel::{unbounded, Receiver, Sender};
use daq_core::{Severity, SourceTimestamp, Status};

use crate::binding::{BindingId, FieldKind};
use crate::error::ChannelError;
use crate::provider::{ChannelProvider, ConnectReport, RawCallback, RawValue, SubscriptionMask};

#[derive(Debug, Clone)]
struct MockChannel {
    field_kind: FieldKind,
    connected: bool,
    precision: Option<f64>,
    current: RawValue,
    status: Status,
    severity: Severity,
}

/// A scriptable channel provider: tests register channels up front,
/// then call [`MockChannelProvider::inject`] to simulate a callback
/// arriving, which `pend_event` will later drain.
pub struct MockChannelProvider {
    channels: HashMap<BindingId, MockChannel>,
    names: HashMap<BindingId, String>,
    tx: Sender<RawCallback>,
    rx: Receiver<RawCallback>,
    clock: u64,
}

impl Default for MockChannelProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChannelProvider {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self {
            channels: HashMap::new(),
            names: HashMap::new(),
            tx,
            rx,
            clock: 0,
        }
    }

    pub fn register_scalar(&mut self, binding: BindingId, name: &str, initial: f64) {
        self.names.insert(binding, name.to_owned());
        self.channels.insert(
            binding,
            MockChannel {
                field_kind: FieldKind::NumericScalar { labels: None },
                connected: true,
                precision: Some(1e-9),
                current: RawValue::Numeric(initial),
                status: Status::NoAlarm,
                severity: Severity::NoAlarm,
            },
        );
    }

    pub fn register_waveform(&mut self, binding: BindingId, name: &str, initial: Vec<f64>) {
        let element_count = initial.len() as u32;
        self.names.insert(binding, name.to_owned());
        self.channels.insert(
            binding,
            MockChannel {
                field_kind: FieldKind::NumericWaveform { element_count },
                connected: true,
                precision: None,
                current: RawValue::NumericWaveform(initial),
                status: Status::NoAlarm,
                severity: Severity::NoAlarm,
            },
        );
    }

    fn next_timestamp(&mut self) -> SourceTimestamp {
        self.clock += 1;
        let base = SourceTimestamp::from_system_time(SystemTime::UNIX_EPOCH);
        SourceTimestamp::new(base.seconds + self.clock as i64, base.nanos)
    }

    /// Queues a value/alarm update as if a callback thread delivered
    /// it; becomes visible to the next `pend_event` call.
    pub fn inject(&mut self, binding: BindingId, value: RawValue, status: Status, severity: Severity) {
        if let Some(ch) = self.channels.get_mut(&binding) {
            ch.current = value.clone();
            ch.status = status;
            ch.severity = severity;
        }
        let client_time = self.next_timestamp();
        let _ = self.tx.send(RawCallback {
            binding,
            status,
            severity,
            value,
            client_time,
            source_time: client_time,
            is_timeout_pseudo_event: false,
        });
    }
}

impl ChannelProvider for MockChannelProvider {
    fn search(&mut self, _binding: BindingId, _name: &str) -> Result<(), ChannelError> {
        Ok(())
    }

    fn connect_all(&mut self, _timeout: Duration) -> ConnectReport {
        let mut report = ConnectReport::default();
        for (id, ch) in &self.channels {
            if ch.connected {
                report.connected.push(*id);
            } else {
                report.did_not_connect.push(*id);
            }
        }
        report
    }

    fn discovered_field_kind(&self, binding: BindingId) -> Option<FieldKind> {
        self.channels.get(&binding).map(|c| c.field_kind.clone())
    }

    fn subscribe(&mut self, _binding: BindingId, _mask: SubscriptionMask) -> Result<(), ChannelError> {
        Ok(())
    }

    fn get(&mut self, binding: BindingId) -> Result<RawValue, ChannelError> {
        self.channels
            .get(&binding)
            .map(|c| c.current.clone())
            .ok_or(ChannelError::UnknownBinding(binding))
    }

    fn put(&mut self, binding: BindingId, value: RawValue) -> Result<(), ChannelError> {
        let ch = self
            .channels
            .get_mut(&binding)
            .ok_or(ChannelError::UnknownBinding(binding))?;
        ch.current = value;
        Ok(())
    }

    fn disconnect(&mut self, binding: BindingId) {
        if let Some(ch) = self.channels.get_mut(&binding) {
            ch.connected = false;
        }
    }

    fn pend_event(&mut self, max_wait: Duration) -> Vec<RawCallback> {
        let mut out = Vec::new();
        if let Ok(first) = self.rx.recv_timeout(max_wait) {
            out.push(first);
        } else {
            return out;
        }
        while let Ok(next) = self.rx.try_recv() {
            out.push(next);
        }
        out
    }

    fn published_precision(&self, binding: BindingId) -> Option<f64> {
        self.channels.get(&binding).and_then(|c| c.precision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_then_pend_event_delivers_callback() {
        let mut provider = MockChannelProvider::new();
        let binding = BindingId(0);
        provider.register_scalar(binding, "X", 1.0);

        provider.inject(binding, RawValue::Numeric(2.0), Status::NoAlarm, Severity::NoAlarm);

        let callbacks = provider.pend_event(Duration::from_millis(50));
        assert_eq!(callbacks.len(), 1);
        assert_eq!(callbacks[0].binding, binding);
        assert_eq!(callbacks[0].value, RawValue::Numeric(2.0));
    }

    #[test]
    fn pend_event_times_out_with_no_callbacks() {
        let mut provider = MockChannelProvider::new();
        let callbacks = provider.pend_event(Duration::from_millis(10));
        assert!(callbacks.is_empty());
    }
}
