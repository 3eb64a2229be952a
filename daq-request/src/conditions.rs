// SPDX-License-Identifier: Apache-2.0

//! The conditions file read by the Condition/Inhibit Gate.

use std::path::Path;

use daq_table::{ColumnData, DataType, Table};

use crate::error::RequestError;

#[derive(Debug, Clone, PartialEq)]
pub struct ConditionRow {
    pub control_name: String,
    pub minimum_value: f64,
    pub maximum_value: f64,
    pub holdoff: Option<f64>,
    pub scale_factor: Option<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct ConditionSet {
    pub rows: Vec<ConditionRow>,
}

pub fn load(path: impl AsRef<Path>) -> Result<ConditionSet, RequestError> {
    let table = Table::load(path)?;
    load_from_table(&table)
}

pub fn load_from_table(table: &Table) -> Result<ConditionSet, RequestError> {
    for required in ["ControlName", "MinimumValue", "MaximumValue"] {
        if table.layout.column(required).is_none() {
            return Err(RequestError::MissingRequiredColumn(match required {
                "ControlName" => "ControlName",
                "MinimumValue" => "MinimumValue",
                _ => "MaximumValue",
            }));
        }
    }

    let mut rows = Vec::new();
    for page in &table.pages {
        let ColumnData::Str(names) = page.column("ControlName")? else {
            return Err(RequestError::WrongColumnType {
                column: "ControlName",
                expected: "str",
                found: page.column("ControlName")?.data_type().name(),
            });
        };
        let min_col = page.column("MinimumValue")?;
        let max_col = page.column("MaximumValue")?;
        let holdoff_col = page.column("Holdoff").ok();
        let scale_col = page.column("ScaleFactor").ok();

        for (i, control_name) in names.iter().enumerate() {
            rows.push(ConditionRow {
                control_name: control_name.clone(),
                minimum_value: min_col.get_f64(i).unwrap_or(f64::NEG_INFINITY),
                maximum_value: max_col.get_f64(i).unwrap_or(f64::INFINITY),
                holdoff: holdoff_col.and_then(|c| c.get_f64(i)),
                scale_factor: scale_col.and_then(|c| c.get_f64(i)),
            });
        }
    }
    Ok(ConditionSet { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_table::{Layout, Page};

    #[test]
    fn loads_ranges_and_optional_columns() {
        let layout = Layout::new()
            .with_column("ControlName", DataType::Str)
            .with_column("MinimumValue", DataType::F64)
            .with_column("MaximumValue", DataType::F64);
        let mut table = Table::new(layout.clone());
        let mut page = Page::new(&layout);
        if let ColumnData::Str(v) = page.column_mut("ControlName").unwrap() {
            v.push("PRESSURE".to_string());
        }
        if let ColumnData::F64(v) = page.column_mut("MinimumValue").unwrap() {
            v.push(1.0);
        }
        if let ColumnData::F64(v) = page.column_mut("MaximumValue").unwrap() {
            v.push(5.0);
        }
        table.push_page(page);

        let set = load_from_table(&table).unwrap();
        assert_eq!(set.rows.len(), 1);
        assert_eq!(set.rows[0].minimum_value, 1.0);
        assert_eq!(set.rows[0].maximum_value, 5.0);
        assert_eq!(set.rows[0].holdoff, None);
    }
}
