// SPDX-License-Identifier: Apache-2.0

//! Save: after request-model load and channel connect, issue
//! one bulk get for all bindings; format scalars into a string
//! column, and either side-car or multi-page the waveforms.

use std::collections::HashMap;

use daq_channel::{Binding, BindingId, BindingTable, ChannelProvider, RawValue};
use daq_core::DaqError;
use daq_table::{ColumnData, DataType, Layout, ParamValue, Page, Table};

use crate::format::{format_scalar, format_string_value, ScalarKind};
use crate::metadata::RunMetadata;

#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRow {
    pub control_name: String,
    pub value_string: String,
    /// "-" for a scalar; the waveform's PV name for a waveform row.
    pub indirect_name: String,
    /// Number of elements the value represents: 1 for a scalar, the
    /// element count for a waveform's indirection row.
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WaveformValues {
    Numeric(Vec<f64>),
    Strings(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaveformSnapshot {
    pub pv_name: String,
    pub values: WaveformValues,
}

#[derive(Debug, Clone, Default)]
pub struct SnapshotSet {
    pub rows: Vec<SnapshotRow>,
    pub waveforms: Vec<WaveformSnapshot>,
}

/// Issues one get per binding (a "bulk get" in the sense that no
/// other channel I/O interleaves it) and formats each scalar's value
/// string, per the channel's `ScalarKind` hint.
pub fn save(
    provider: &mut dyn ChannelProvider,
    bindings: &BindingTable,
    scalar_kinds: &HashMap<BindingId, ScalarKind>,
) -> Result<SnapshotSet, DaqError> {
    let mut set = SnapshotSet::default();
    for binding in bindings.iter() {
        let value = provider.get(binding.id).map_err(|e| DaqError::TransientCa {
            channel: binding.name.clone(),
            detail: e.to_string(),
        })?;
        append_snapshot_row(binding, value, scalar_kinds, &mut set);
    }
    Ok(set)
}

fn append_snapshot_row(
    binding: &Binding,
    value: RawValue,
    scalar_kinds: &HashMap<BindingId, ScalarKind>,
    set: &mut SnapshotSet,
) {
    match value {
        RawValue::Numeric(v) => {
            let kind = scalar_kinds.get(&binding.id).cloned().unwrap_or(ScalarKind::Double);
            set.rows.push(SnapshotRow {
                control_name: binding.name.clone(),
                value_string: format_scalar(v, &kind),
                indirect_name: "-".to_string(),
                count: 1,
            });
        }
        RawValue::Text(s) => {
            set.rows.push(SnapshotRow {
                control_name: binding.name.clone(),
                value_string: format_string_value(&s),
                indirect_name: "-".to_string(),
                count: 1,
            });
        }
        RawValue::NumericWaveform(values) => {
            set.rows.push(SnapshotRow {
                control_name: binding.name.clone(),
                value_string: "WaveformPV".to_string(),
                indirect_name: binding.name.clone(),
                count: values.len() as u32,
            });
            set.waveforms.push(WaveformSnapshot {
                pv_name: binding.name.clone(),
                values: WaveformValues::Numeric(values),
            });
        }
        RawValue::StringWaveform(values) => {
            set.rows.push(SnapshotRow {
                control_name: binding.name.clone(),
                value_string: "WaveformPV".to_string(),
                indirect_name: binding.name.clone(),
                count: values.len() as u32,
            });
            set.waveforms.push(WaveformSnapshot {
                pv_name: binding.name.clone(),
                values: WaveformValues::Strings(values),
            });
        }
    }
}

pub fn snapshot_layout() -> Layout {
    Layout::new()
        .with_parameter("LoginID", DataType::Str)
        .with_parameter("EffectiveUID", DataType::I64)
        .with_parameter("GroupID", DataType::Str)
        .with_parameter("SnapType", DataType::Str)
        .with_parameter("TimeStamp", DataType::Str)
        .with_parameter("StartTime", DataType::F64)
        .with_parameter("Time", DataType::I64)
        .with_parameter("RequestFile", DataType::Str)
        .with_parameter("SnapshotFilename", DataType::Str)
        .with_parameter("SnapshotDescription", DataType::Str)
        .with_parameter("ElapsedTimeToCAConnect", DataType::F64)
        .with_parameter("ElapsedTimeToSave", DataType::F64)
        .with_parameter("PendIOTime", DataType::F64)
        .with_column("ControlName", DataType::Str)
        .with_column("ValueString", DataType::Str)
        .with_column("IndirectName", DataType::Str)
        .with_column("CAError", DataType::Str)
        .with_column("Count", DataType::I64)
        .with_column("Lineage", DataType::Str)
}

pub fn build_table(set: &SnapshotSet, metadata: &RunMetadata) -> Table {
    let layout = snapshot_layout();
    let mut page = Page::new(&layout);
    page.set_parameter("LoginID", ParamValue::Str(metadata.login_id.clone()));
    page.set_parameter("EffectiveUID", ParamValue::I64(metadata.effective_uid as i64));
    page.set_parameter("GroupID", ParamValue::Str(metadata.group_id.clone()));
    page.set_parameter("SnapType", ParamValue::Str("Absolute".to_string()));
    page.set_parameter("TimeStamp", ParamValue::Str(metadata.timestamp_label()));
    page.set_parameter("StartTime", ParamValue::F64(metadata.save_time_unix as f64));
    page.set_parameter("Time", ParamValue::I64(metadata.save_time_unix));
    page.set_parameter("RequestFile", ParamValue::Str(metadata.request_file.clone()));
    page.set_parameter("SnapshotFilename", ParamValue::Str(metadata.snapshot_filename.clone()));
    page.set_parameter("SnapshotDescription", ParamValue::Str(metadata.description.clone()));
    page.set_parameter(
        "ElapsedTimeToCAConnect",
        ParamValue::F64(metadata.connect_duration.as_secs_f64()),
    );
    page.set_parameter(
        "ElapsedTimeToSave",
        ParamValue::F64(metadata.save_duration.as_secs_f64()),
    );
    page.set_parameter("PendIOTime", ParamValue::F64(metadata.pend_io_time.as_secs_f64()));

    if let ColumnData::Str(names) = page.column_mut("ControlName").unwrap() {
        names.extend(set.rows.iter().map(|r| r.control_name.clone()));
    }
    if let ColumnData::Str(values) = page.column_mut("ValueString").unwrap() {
        values.extend(set.rows.iter().map(|r| r.value_string.clone()));
    }
    if let ColumnData::Str(indirect) = page.column_mut("IndirectName").unwrap() {
        indirect.extend(set.rows.iter().map(|r| r.indirect_name.clone()));
    }
    // The save path aborts on the first failed get (see `save` above),
    // so every row that makes it into a snapshot was read without
    // error by construction.
    if let ColumnData::Str(ca_error) = page.column_mut("CAError").unwrap() {
        ca_error.extend(set.rows.iter().map(|_| "n".to_string()));
    }
    if let ColumnData::I64(count) = page.column_mut("Count").unwrap() {
        count.extend(set.rows.iter().map(|r| r.count as i64));
    }
    if let ColumnData::Str(lineage) = page.column_mut("Lineage").unwrap() {
        lineage.extend(set.rows.iter().map(|_| "direct".to_string()));
    }

    let mut table = Table::new(layout);
    table.push_page(page);
    table
}

/// Builds one side-car table for a waveform: Index/Waveform columns,
/// WaveformPV/Time parameters.
pub fn build_waveform_sidecar(waveform: &WaveformSnapshot, save_time_unix: i64) -> Table {
    let data_type = match &waveform.values {
        WaveformValues::Numeric(_) => DataType::F64,
        WaveformValues::Strings(_) => DataType::Str,
    };
    let layout = Layout::new()
        .with_parameter("WaveformPV", DataType::Str)
        .with_parameter("Time", DataType::I64)
        .with_column("Index", DataType::I64)
        .with_column("Waveform", data_type);

    let mut page = Page::new(&layout);
    page.set_parameter("WaveformPV", ParamValue::Str(waveform.pv_name.clone()));
    page.set_parameter("Time", ParamValue::I64(save_time_unix));

    if let ColumnData::I64(idx) = page.column_mut("Index").unwrap() {
        let len = match &waveform.values {
            WaveformValues::Numeric(v) => v.len(),
            WaveformValues::Strings(v) => v.len(),
        };
        idx.extend(0..len as i64);
    }
    match (&waveform.values, page.column_mut("Waveform").unwrap()) {
        (WaveformValues::Numeric(v), ColumnData::F64(dest)) => dest.extend_from_slice(v),
        (WaveformValues::Strings(v), ColumnData::Str(dest)) => dest.extend(v.iter().cloned()),
        _ => unreachable!("column type is derived from the same waveform kind"),
    }

    let mut table = Table::new(layout);
    table.push_page(page);
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_channel::mock::MockChannelProvider;

    #[test]
    fn save_formats_scalar_and_captures_waveform() {
        let mut provider = MockChannelProvider::new();
        let mut bindings = BindingTable::new();
        let scalar_id = bindings.insert("A");
        let waveform_id = bindings.insert("W");

        provider.register_scalar(scalar_id, "A", 3.14);
        provider.register_waveform(waveform_id, "W", vec![1.0, 2.0, 3.0, 4.0]);

        let mut kinds = HashMap::new();
        kinds.insert(scalar_id, ScalarKind::Double);

        let set = save(&mut provider, &bindings, &kinds).unwrap();
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0].indirect_name, "-");
        assert_eq!(set.rows[1].indirect_name, "W");
        assert_eq!(set.waveforms.len(), 1);
        assert_eq!(
            set.waveforms[0].values,
            WaveformValues::Numeric(vec![1.0, 2.0, 3.0, 4.0])
        );
    }

    #[test]
    fn waveform_sidecar_has_index_and_value_columns() {
        let waveform = WaveformSnapshot {
            pv_name: "W".to_string(),
            values: WaveformValues::Numeric(vec![1.0, 2.0, 3.0, 4.0]),
        };
        let table = build_waveform_sidecar(&waveform, 1000);
        assert_eq!(table.pages[0].row_count(), 4);
        assert_eq!(table.pages[0].column("Index").unwrap().get_i64(3), Some(3));
    }
}
