// SPDX-License-Identifier: Apache-2.0

//! A single page: one value per declared parameter, one equal-length
//! array per declared column.

use std::collections::HashMap;

use crate::error::TableError;
use crate::layout::Layout;
use crate::value::{ColumnData, ParamValue};

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub parameters: HashMap<String, ParamValue>,
    pub columns: HashMap<String, ColumnData>,
}

impl Page {
    /// An empty page with every declared column initialized (but
    /// length zero) and no parameters set.
    pub fn new(layout: &Layout) -> Self {
        let columns = layout
            .columns
            .iter()
            .map(|c| (c.name.clone(), ColumnData::empty(c.data_type)))
            .collect();
        Self {
            parameters: HashMap::new(),
            columns,
        }
    }

    pub fn row_count(&self) -> usize {
        self.columns.values().map(ColumnData::len).max().unwrap_or(0)
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: ParamValue) {
        self.parameters.insert(name.into(), value);
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.get(name)
    }

    pub fn column(&self, name: &str) -> Result<&ColumnData, TableError> {
        self.columns
            .get(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_owned()))
    }

    pub fn column_mut(&mut self, name: &str) -> Result<&mut ColumnData, TableError> {
        self.columns
            .get_mut(name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_owned()))
    }

    /// Extends every column with `additional` default-valued slots so
    /// subsequent appends do not need to reallocate one row at a time.
    pub fn lengthen(&mut self, additional: usize) {
        for col in self.columns.values_mut() {
            col.reserve(additional);
        }
    }

    pub fn rows_allocated(&self) -> usize {
        self.columns.values().map(|c| match c {
            ColumnData::I64(v) => v.capacity(),
            ColumnData::F64(v) => v.capacity(),
            ColumnData::F32(v) => v.capacity(),
            ColumnData::Str(v) => v.capacity(),
        }).min().unwrap_or(0)
    }

    /// Truncates every column to `len` rows — used by the recovery
    /// path to drop a trailing partial page.
    pub fn truncate_rows(&mut self, len: usize) {
        for col in self.columns.values_mut() {
            col.truncate(len);
        }
    }
}
