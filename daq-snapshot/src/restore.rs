// SPDX-License-Identifier: Apache-2.0

//! Restore: parse each row's `ValueString` back into the
//! channel's field type, issue a bulk put, and optionally verify by
//! re-reading and comparing.

use daq_channel::{BindingId, BindingTable, ChannelProvider, RawValue};
use daq_core::DaqError;

use crate::format::values_match;
use crate::save::SnapshotRow;

#[derive(Debug, Clone, PartialEq)]
pub struct VerifyFailure {
    pub control_name: String,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Clone, Default)]
pub struct RestoreReport {
    pub restored: Vec<String>,
    /// Verification failures are reported per channel but are not
    /// fatal.
    pub verify_failures: Vec<VerifyFailure>,
}

/// Restores every row in `rows` whose `ControlName` has a binding in
/// `bindings`, issuing a put per row. When `verify` is set, re-reads
/// and compares using the channel's published precision on retry.
pub fn restore(
    provider: &mut dyn ChannelProvider,
    bindings: &BindingTable,
    rows: &[SnapshotRow],
    verify: bool,
) -> Result<RestoreReport, DaqError> {
    let mut report = RestoreReport::default();
    for row in rows {
        let Some(id) = bindings.by_name(&row.control_name) else {
            continue;
        };
        let value = parse_value_string(&row.value_string);
        provider.put(id, value.clone()).map_err(|e| DaqError::TransientCa {
            channel: row.control_name.clone(),
            detail: e.to_string(),
        })?;
        report.restored.push(row.control_name.clone());

        if verify {
            if let Some(failure) = verify_one(provider, id, &row.control_name, &value) {
                report.verify_failures.push(failure);
            }
        }
    }
    Ok(report)
}

fn verify_one(
    provider: &mut dyn ChannelProvider,
    id: BindingId,
    control_name: &str,
    expected: &RawValue,
) -> Option<VerifyFailure> {
    let actual = provider.get(id).ok()?;
    match (expected, &actual) {
        (RawValue::Numeric(expected_value), RawValue::Numeric(actual_value)) => {
            let precision = provider.published_precision(id);
            if values_match(*expected_value, *actual_value, precision) {
                None
            } else {
                Some(VerifyFailure {
                    control_name: control_name.to_string(),
                    expected: expected_value.to_string(),
                    actual: actual_value.to_string(),
                })
            }
        }
        (RawValue::Text(expected_str), RawValue::Text(actual_str)) if expected_str == actual_str => None,
        (RawValue::Text(expected_str), RawValue::Text(actual_str)) => Some(VerifyFailure {
            control_name: control_name.to_string(),
            expected: expected_str.clone(),
            actual: actual_str.clone(),
        }),
        _ => None,
    }
}

fn parse_value_string(value_string: &str) -> RawValue {
    if value_string == "WaveformPV" {
        // Waveform restore is driven separately from the side-car
        // file; the ValueString column only carries the marker.
        return RawValue::Text(value_string.to_string());
    }
    if let Some(unquoted) = value_string.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return RawValue::Text(unquoted.to_string());
    }
    match value_string.parse::<f64>() {
        Ok(v) => RawValue::Numeric(v),
        Err(_) => RawValue::Text(value_string.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_channel::mock::MockChannelProvider;

    #[test]
    fn restore_puts_parsed_numeric_value_and_verifies() {
        let mut provider = MockChannelProvider::new();
        let mut bindings = BindingTable::new();
        let id = bindings.insert("A");
        provider.register_scalar(id, "A", 0.0);

        let rows = vec![SnapshotRow {
            control_name: "A".to_string(),
            value_string: "3.14".to_string(),
            indirect_name: "-".to_string(),
            count: 1,
        }];

        let report = restore(&mut provider, &bindings, &rows, true).unwrap();
        assert_eq!(report.restored, vec!["A".to_string()]);
        assert!(report.verify_failures.is_empty());
    }

    #[test]
    fn restore_skips_rows_with_no_matching_binding() {
        let mut provider = MockChannelProvider::new();
        let bindings = BindingTable::new();
        let rows = vec![SnapshotRow {
            control_name: "MISSING".to_string(),
            value_string: "1.0".to_string(),
            indirect_name: "-".to_string(),
            count: 1,
        }];
        let report = restore(&mut provider, &bindings, &rows, true).unwrap();
        assert!(report.restored.is_empty());
    }
}
