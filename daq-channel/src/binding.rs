// SPDX-License-Identifier: Apache-2.0

//! The Channel Binding: the durable association between one
//! request row and one channel.

use std::collections::HashMap;

use daq_core::{Severity, SourceTimestamp, Status};

/// Opaque handle identifying a binding, stable for the run's
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Unconnected,
    Connected,
    ValueSeen,
}

/// The discovered field type of a channel.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A numeric scalar, optionally with an enumerated label mapping
    /// (ordinal -> text), e.g. for ENUM-typed channels.
    NumericScalar { labels: Option<Vec<String>> },
    /// A string-typed scalar (EPICS `STRING` field type).
    StringScalar,
    /// A waveform of `element_count` numeric elements.
    NumericWaveform { element_count: u32 },
    /// A waveform of `element_count` string elements.
    StringWaveform { element_count: u32 },
}

impl FieldKind {
    pub fn is_waveform(&self) -> bool {
        matches!(
            self,
            FieldKind::NumericWaveform { .. } | FieldKind::StringWaveform { .. }
        )
    }

    pub fn element_count(&self) -> u32 {
        match self {
            FieldKind::NumericScalar { .. } | FieldKind::StringScalar => 1,
            FieldKind::NumericWaveform { element_count }
            | FieldKind::StringWaveform { element_count } => *element_count,
        }
    }
}

/// A waveform's payload, owned by the binding that subscribed, sized
/// to the discovered (or hinted, pre-connect) element count.
#[derive(Debug, Clone, PartialEq)]
pub enum WaveformPayload {
    Numeric(Vec<f64>),
    Strings(Vec<String>),
}

/// The durable per-request-row state the Channel Layer owns for the
/// run's lifetime.
#[derive(Debug, Clone)]
pub struct Binding {
    pub id: BindingId,
    pub name: String,
    pub readback_name: Option<String>,
    pub related_name: Option<String>,
    pub state: ConnectionState,
    pub field_kind: Option<FieldKind>,
    pub waveform: Option<WaveformPayload>,
    pub last_status: Status,
    pub last_severity: Severity,
    pub last_value: f64,
    pub last_string: Option<String>,
    pub last_client_time: Option<SourceTimestamp>,
    pub last_source_time: Option<SourceTimestamp>,
    /// Index of the previous output row emitted for this binding, or
    /// `None` if none has been emitted yet.
    pub last_row: Option<u64>,
    /// True while a two-phase related-value write is outstanding.
    pub write_pending: bool,
    /// Connection attempts that ended in disconnect, for diagnostics.
    pub reconnect_count: u32,
    /// Number of callbacks delivered since the binding connected,
    /// independent of how many produced an output row. Used by the
    /// change filter to distinguish "first callback" from "first row
    /// emitted".
    pub callbacks_seen: u64,
}

impl Binding {
    pub fn new(id: BindingId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            readback_name: None,
            related_name: None,
            state: ConnectionState::Unconnected,
            field_kind: None,
            waveform: None,
            last_status: Status::NoAlarm,
            last_severity: Severity::Invalid,
            last_value: 0.0,
            last_string: None,
            last_client_time: None,
            last_source_time: None,
            last_row: None,
            write_pending: false,
            reconnect_count: 0,
            callbacks_seen: 0,
        }
    }

    pub fn mark_connected(&mut self) {
        if self.state == ConnectionState::Unconnected {
            self.state = ConnectionState::Connected;
        }
    }

    pub fn mark_value_seen(&mut self) {
        self.state = ConnectionState::ValueSeen;
    }

    pub fn mark_disconnected(&mut self) {
        if self.state != ConnectionState::Unconnected {
            self.reconnect_count += 1;
        }
        self.state = ConnectionState::Unconnected;
    }
}

/// Owns every binding for the run, indexed by `BindingId` and by
/// name for subscription dispatch.
#[derive(Debug, Default)]
pub struct BindingTable {
    bindings: Vec<Binding>,
    by_name: HashMap<String, BindingId>,
}

impl BindingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>) -> BindingId {
        let name = name.into();
        if let Some(id) = self.by_name.get(&name) {
            return *id;
        }
        let id = BindingId(self.bindings.len() as u32);
        self.bindings.push(Binding::new(id, name.clone()));
        self.by_name.insert(name, id);
        id
    }

    pub fn get(&self, id: BindingId) -> Option<&Binding> {
        self.bindings.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: BindingId) -> Option<&mut Binding> {
        self.bindings.get_mut(id.0 as usize)
    }

    pub fn by_name(&self, name: &str) -> Option<BindingId> {
        self.by_name.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Binding> {
        self.bindings.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_transitions_in_order() {
        let mut b = Binding::new(BindingId(0), "X");
        assert_eq!(b.state, ConnectionState::Unconnected);
        b.mark_connected();
        assert_eq!(b.state, ConnectionState::Connected);
        b.mark_value_seen();
        assert_eq!(b.state, ConnectionState::ValueSeen);
        b.mark_disconnected();
        assert_eq!(b.state, ConnectionState::Unconnected);
        assert_eq!(b.reconnect_count, 1);
    }

    #[test]
    fn binding_table_deduplicates_by_name() {
        let mut table = BindingTable::new();
        let a1 = table.insert("A");
        let a2 = table.insert("A");
        assert_eq!(a1, a2);
        assert_eq!(table.len(), 1);
    }
}
