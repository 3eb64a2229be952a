// SPDX-License-Identifier: Apache-2.0

//! The schema of a table: an ordered list of parameter definitions
//! (one value per page) and an ordered list of column definitions
//! (one array per page, all of the same length).

use crate::error::TableError;
use crate::value::DataType;

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Layout {
    pub parameters: Vec<ParamDef>,
    pub columns: Vec<ColumnDef>,
}

impl Layout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parameter(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.parameters.push(ParamDef {
            name: name.into(),
            data_type,
        });
        self
    }

    pub fn with_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.columns.push(ColumnDef {
            name: name.into(),
            data_type,
        });
        self
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn parameter(&self, name: &str) -> Option<&ParamDef> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Schema-equality check used when opening a file in append mode
    ///: every name in `required_columns` must
    /// appear in `self`, and every column of `self` must be in
    /// `required_columns` or in `auxiliary`.
    pub fn compatible_for_append(
        &self,
        required_columns: &[&str],
        auxiliary: &[&str],
    ) -> Result<(), TableError> {
        for required in required_columns {
            if self.column(required).is_none() {
                return Err(TableError::SchemaMismatch(format!(
                    "required readback column '{required}' missing from existing file"
                )));
            }
        }
        for existing in self.column_names() {
            let is_required = required_columns.contains(&existing);
            let is_auxiliary = auxiliary.contains(&existing);
            if !is_required && !is_auxiliary {
                return Err(TableError::SchemaMismatch(format!(
                    "existing column '{existing}' is neither a readback nor an auxiliary column"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Layout {
        Layout::new()
            .with_column("Step", DataType::I64)
            .with_column("Time", DataType::F64)
            .with_column("X", DataType::F64)
            .with_column("Y", DataType::F64)
    }

    #[test]
    fn append_ok_when_every_readback_present_and_no_extra_columns() {
        let layout = sample();
        assert!(
            layout
                .compatible_for_append(&["X", "Y"], &["Step", "Time"])
                .is_ok()
        );
    }

    #[test]
    fn append_rejected_when_readback_missing() {
        let layout = sample();
        assert!(
            layout
                .compatible_for_append(&["X", "Y", "Z"], &["Step", "Time"])
                .is_err()
        );
    }

    #[test]
    fn append_rejected_when_unexplained_column_present() {
        let layout = sample();
        assert!(layout.compatible_for_append(&["X", "Y"], &["Time"]).is_err());
    }
}
