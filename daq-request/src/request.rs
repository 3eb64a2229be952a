// SPDX-License-Identifier: Apache-2.0

//! The Request Model: loads a request table describing the
//! channels a run should observe.

use std::collections::HashSet;
use std::path::Path;

use daq_table::{ColumnData, DataType, Table};

use crate::error::RequestError;

/// One row of the request table. Optional columns default to `None`
/// / `false` when absent from the file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestRow {
    pub control_name: String,
    pub readback_name: Option<String>,
    pub readback_units: Option<String>,
    pub description: Option<String>,
    pub related_control_name: Option<String>,
    pub tolerance: Option<f64>,
    pub initial_value: Option<f64>,
    pub initial_change: Option<f64>,
    pub lower_limit: Option<f64>,
    pub upper_limit: Option<f64>,
    pub disable: bool,
    pub expect_numeric: Option<bool>,
    pub expect_field_type: Option<String>,
    pub expect_elements: Option<u32>,
    pub bit_decoder_array: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestSet {
    pub rows: Vec<RequestRow>,
}

impl RequestSet {
    pub fn active_rows(&self) -> impl Iterator<Item = &RequestRow> {
        self.rows.iter().filter(|r| !r.disable)
    }

    pub fn control_names(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.control_name.as_str()).collect()
    }
}

/// Options controlling how the request table is loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Collapse duplicate rows by `ControlName` to the first
    /// occurrence (`-unique`).
    pub unique: bool,
}

fn get_str_column<'a>(
    table: &'a Table,
    name: &str,
    row: usize,
) -> Result<Option<&'a str>, RequestError> {
    let Some(col) = table.layout.column(name) else {
        return Ok(None);
    };
    if col.data_type != DataType::Str {
        return Err(RequestError::WrongColumnType {
            column: leak_name(name),
            expected: "str",
            found: col.data_type.name(),
        });
    }
    let page = table.pages.first();
    Ok(page.and_then(|p| p.column(name).ok()).and_then(|c| c.get_str(row)))
}

fn get_f64_column(table: &Table, name: &str, row: usize) -> Result<Option<f64>, RequestError> {
    let Some(col) = table.layout.column(name) else {
        return Ok(None);
    };
    if matches!(col.data_type, DataType::Str) {
        return Err(RequestError::WrongColumnType {
            column: leak_name(name),
            expected: "numeric",
            found: "str",
        });
    }
    let page = table.pages.first();
    Ok(page.and_then(|p| p.column(name).ok()).and_then(|c| c.get_f64(row)))
}

// Column names are a small fixed set known at compile time; this
// turns a borrowed `&str` we already validated against that set into
// a `'static` str for error messages without inventing an owned-error
// variant everywhere.
fn leak_name(name: &str) -> &'static str {
    match name {
        "ControlName" => "ControlName",
        "ReadbackName" => "ReadbackName",
        "ReadbackUnits" => "ReadbackUnits",
        "Description" => "Description",
        "RelatedControlName" => "RelatedControlName",
        "Tolerance" => "Tolerance",
        "InitialValue" => "InitialValue",
        "InitialChange" => "InitialChange",
        "LowerLimit" => "LowerLimit",
        "UpperLimit" => "UpperLimit",
        "Disable" => "Disable",
        "ExpectNumeric" => "ExpectNumeric",
        "ExpectFieldType" => "ExpectFieldType",
        "ExpectElements" => "ExpectElements",
        "BitDecoderArray" => "BitDecoderArray",
        _ => "<column>",
    }
}

/// Loads the request table at `path`. Multi-page files accumulate
/// rows across pages. An empty file yields an empty `RequestSet`
/// (caller may proceed with a warning).
pub fn load(path: impl AsRef<Path>, options: LoadOptions) -> Result<RequestSet, RequestError> {
    let table = Table::load(path)?;
    load_from_table(&table, options)
}

pub fn load_from_table(
    table: &Table,
    options: LoadOptions,
) -> Result<RequestSet, RequestError> {
    if table.layout.column("ControlName").is_none() {
        return Err(RequestError::MissingRequiredColumn("ControlName"));
    }
    if table.layout.column("ControlName").unwrap().data_type != DataType::Str {
        return Err(RequestError::WrongColumnType {
            column: "ControlName",
            expected: "str",
            found: table.layout.column("ControlName").unwrap().data_type.name(),
        });
    }

    let mut rows = Vec::new();
    let mut seen = HashSet::new();

    for page in &table.pages {
        let ColumnData::Str(names) = page.column("ControlName")? else {
            return Err(RequestError::WrongColumnType {
                column: "ControlName",
                expected: "str",
                found: page.column("ControlName")?.data_type().name(),
            });
        };

        for (i, control_name) in names.iter().enumerate() {
            if options.unique && !seen.insert(control_name.clone()) {
                continue;
            }

            let disable = get_f64_column(table, "Disable", i)?.unwrap_or(0.0) != 0.0;
            let expect_numeric = get_f64_column(table, "ExpectNumeric", i)?.map(|v| v != 0.0);
            let expect_elements = get_f64_column(table, "ExpectElements", i)?.map(|v| v as u32);

            rows.push(RequestRow {
                control_name: control_name.clone(),
                readback_name: get_str_column(table, "ReadbackName", i)?.map(str::to_owned),
                readback_units: get_str_column(table, "ReadbackUnits", i)?.map(str::to_owned),
                description: get_str_column(table, "Description", i)?.map(str::to_owned),
                related_control_name: get_str_column(table, "RelatedControlName", i)?
                    .map(str::to_owned),
                tolerance: get_f64_column(table, "Tolerance", i)?,
                initial_value: get_f64_column(table, "InitialValue", i)?,
                initial_change: get_f64_column(table, "InitialChange", i)?,
                lower_limit: get_f64_column(table, "LowerLimit", i)?,
                upper_limit: get_f64_column(table, "UpperLimit", i)?,
                disable,
                expect_numeric,
                expect_field_type: get_str_column(table, "ExpectFieldType", i)?.map(str::to_owned),
                expect_elements,
                bit_decoder_array: get_str_column(table, "BitDecoderArray", i)?.map(str::to_owned),
            });
        }
    }

    Ok(RequestSet { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_table::{Layout, Page};
    use tempfile::tempdir;

    fn build_table(names: &[&str], tolerances: &[f64]) -> Table {
        let layout = Layout::new()
            .with_column("ControlName", DataType::Str)
            .with_column("Tolerance", DataType::F64);
        let mut table = Table::new(layout.clone());
        let mut page = Page::new(&layout);
        if let ColumnData::Str(v) = page.column_mut("ControlName").unwrap() {
            v.extend(names.iter().map(|s| s.to_string()));
        }
        if let ColumnData::F64(v) = page.column_mut("Tolerance").unwrap() {
            v.extend_from_slice(tolerances);
        }
        table.push_page(page);
        table
    }

    #[test]
    fn loads_rows_with_recognized_optional_columns() {
        let table = build_table(&["X", "Y"], &[0.1, 0.2]);
        let set = load_from_table(&table, LoadOptions::default()).unwrap();
        assert_eq!(set.rows.len(), 2);
        assert_eq!(set.rows[0].control_name, "X");
        assert_eq!(set.rows[0].tolerance, Some(0.1));
    }

    #[test]
    fn missing_control_name_column_is_fatal() {
        let layout = Layout::new().with_column("Tolerance", DataType::F64);
        let table = Table::new(layout);
        let err = load_from_table(&table, LoadOptions::default()).unwrap_err();
        assert!(matches!(err, RequestError::MissingRequiredColumn("ControlName")));
    }

    #[test]
    fn empty_file_yields_empty_request_set() {
        let layout = Layout::new().with_column("ControlName", DataType::Str);
        let table = Table::new(layout);
        let set = load_from_table(&table, LoadOptions::default()).unwrap();
        assert!(set.rows.is_empty());
    }

    #[test]
    fn unique_flag_collapses_duplicates_to_first() {
        let table = build_table(&["X", "X", "Y"], &[0.1, 0.9, 0.2]);
        let set = load_from_table(&table, LoadOptions { unique: true }).unwrap();
        assert_eq!(set.control_names(), vec!["X", "Y"]);
        assert_eq!(set.rows[0].tolerance, Some(0.1));
    }

    #[test]
    fn round_trips_through_disk_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("req.daq");
        let table = build_table(&["A"], &[1.0]);
        table.store(&path).unwrap();

        let set = load(&path, LoadOptions::default()).unwrap();
        assert_eq!(set.rows.len(), 1);
        assert_eq!(set.rows[0].control_name, "A");
    }

    #[test]
    fn multi_page_file_accumulates_channels_across_pages() {
        let layout = Layout::new().with_column("ControlName", DataType::Str);
        let mut table = Table::new(layout.clone());

        let mut page1 = Page::new(&layout);
        if let ColumnData::Str(v) = page1.column_mut("ControlName").unwrap() {
            v.push("A".to_string());
        }
        table.push_page(page1);

        let mut page2 = Page::new(&layout);
        if let ColumnData::Str(v) = page2.column_mut("ControlName").unwrap() {
            v.push("B".to_string());
        }
        table.push_page(page2);

        let set = load_from_table(&table, LoadOptions::default()).unwrap();
        assert_eq!(set.control_names(), vec!["A", "B"]);
    }
}
