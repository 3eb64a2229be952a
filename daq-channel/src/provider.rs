// SPDX-License-Identifier: Apache-2.0

//! The `ChannelProvider` trait: the boundary standing in for "CA".

use std::time::Duration;

use daq_core::{Severity, SourceTimestamp, Status};

use crate::binding::{BindingId, FieldKind};
use crate::error::ChannelError;

/// A put/get value, scalar or waveform, as delivered by the provider
/// before the binding's discovered `FieldKind` is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Numeric(f64),
    Text(String),
    NumericWaveform(Vec<f64>),
    StringWaveform(Vec<String>),
}

/// A bitmask of the subscription kinds a binding can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionMask {
    pub value_change: bool,
    pub alarm_change: bool,
}

impl SubscriptionMask {
    pub const VALUE: Self = Self {
        value_change: true,
        alarm_change: false,
    };
    pub const ALARM: Self = Self {
        value_change: false,
        alarm_change: true,
    };
    pub const BOTH: Self = Self {
        value_change: true,
        alarm_change: true,
    };
}

/// A raw callback as drained by `pend_event`, before dispatcher
/// normalization into an `Event` (daq-dispatch owns that step so the
/// Channel Layer stays ignorant of logging policy).
#[derive(Debug, Clone, PartialEq)]
pub struct RawCallback {
    pub binding: BindingId,
    pub status: Status,
    pub severity: Severity,
    pub value: RawValue,
    pub client_time: SourceTimestamp,
    pub source_time: SourceTimestamp,
    /// Set when this callback represents a connect-timeout
    /// pseudo-event rather than a real
    /// channel update.
    pub is_timeout_pseudo_event: bool,
}

/// Report produced by `connect_all`.
#[derive(Debug, Clone, Default)]
pub struct ConnectReport {
    pub connected: Vec<BindingId>,
    pub did_not_connect: Vec<BindingId>,
}

/// The Channel Layer's contract. Implementations wrap a real
/// CA client or, for tests, an in-process mock.
pub trait ChannelProvider {
    fn search(&mut self, binding: BindingId, name: &str) -> Result<(), ChannelError>;

    fn connect_all(&mut self, timeout: Duration) -> ConnectReport;

    fn discovered_field_kind(&self, binding: BindingId) -> Option<FieldKind>;

    fn subscribe(&mut self, binding: BindingId, mask: SubscriptionMask) -> Result<(), ChannelError>;

    fn get(&mut self, binding: BindingId) -> Result<RawValue, ChannelError>;

    fn put(&mut self, binding: BindingId, value: RawValue) -> Result<(), ChannelError>;

    fn disconnect(&mut self, binding: BindingId);

    /// Services pending callbacks, blocking for up to `max_wait` if
    /// none are immediately available. This is the "pend event"
    /// primitive from the Glossary: the only suspension point that
    /// also makes progress on asynchronous channel I/O.
    fn pend_event(&mut self, max_wait: Duration) -> Vec<RawCallback>;

    /// Published numeric precision for a scalar channel, used by the
    /// Save/Restore verify comparison.
    fn published_precision(&self, binding: BindingId) -> Option<f64>;
}
