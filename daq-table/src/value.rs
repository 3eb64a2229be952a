// SPDX-License-Identifier: Apache-2.0

//! Typed scalar values and columnar arrays for table parameters and
//! columns.

use crate::error::TableError;

/// The element type of a column or the value type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    I64,
    F64,
    F32,
    Str,
}

impl DataType {
    pub(crate) fn tag(self) -> u8 {
        match self {
            DataType::I64 => 0,
            DataType::F64 => 1,
            DataType::F32 => 2,
            DataType::Str => 3,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Result<Self, TableError> {
        Ok(match tag {
            0 => DataType::I64,
            1 => DataType::F64,
            2 => DataType::F32,
            3 => DataType::Str,
            other => return Err(TableError::UnknownType(other)),
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            DataType::I64 => "i64",
            DataType::F64 => "f64",
            DataType::F32 => "f32",
            DataType::Str => "str",
        }
    }
}

/// A single parameter value (page-scoped, one instance per page).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    I64(i64),
    F64(f64),
    F32(f32),
    Str(String),
}

impl ParamValue {
    pub fn data_type(&self) -> DataType {
        match self {
            ParamValue::I64(_) => DataType::I64,
            ParamValue::F64(_) => DataType::F64,
            ParamValue::F32(_) => DataType::F32,
            ParamValue::Str(_) => DataType::Str,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::I64(v) => Some(*v as f64),
            ParamValue::F64(v) => Some(*v),
            ParamValue::F32(v) => Some(*v as f64),
            ParamValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// A column's backing storage: one homogeneous vector per declared
/// `DataType`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    I64(Vec<i64>),
    F64(Vec<f64>),
    F32(Vec<f32>),
    Str(Vec<String>),
}

impl ColumnData {
    pub fn empty(ty: DataType) -> Self {
        match ty {
            DataType::I64 => ColumnData::I64(Vec::new()),
            DataType::F64 => ColumnData::F64(Vec::new()),
            DataType::F32 => ColumnData::F32(Vec::new()),
            DataType::Str => ColumnData::Str(Vec::new()),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            ColumnData::I64(_) => DataType::I64,
            ColumnData::F64(_) => DataType::F64,
            ColumnData::F32(_) => DataType::F32,
            ColumnData::Str(_) => DataType::Str,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::I64(v) => v.len(),
            ColumnData::F64(v) => v.len(),
            ColumnData::F32(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn truncate(&mut self, len: usize) {
        match self {
            ColumnData::I64(v) => v.truncate(len),
            ColumnData::F64(v) => v.truncate(len),
            ColumnData::F32(v) => v.truncate(len),
            ColumnData::Str(v) => v.truncate(len),
        }
    }

    pub fn reserve(&mut self, additional: usize) {
        match self {
            ColumnData::I64(v) => v.reserve(additional),
            ColumnData::F64(v) => v.reserve(additional),
            ColumnData::F32(v) => v.reserve(additional),
            ColumnData::Str(v) => v.reserve(additional),
        }
    }

    pub fn push_i64(&mut self, v: i64) -> Result<(), TableError> {
        match self {
            ColumnData::I64(vec) => {
                vec.push(v);
                Ok(())
            }
            other => type_mismatch("<column>", DataType::I64, other.data_type()),
        }
    }

    pub fn push_f64(&mut self, v: f64) -> Result<(), TableError> {
        match self {
            ColumnData::F64(vec) => {
                vec.push(v);
                Ok(())
            }
            other => type_mismatch("<column>", DataType::F64, other.data_type()),
        }
    }

    pub fn push_str(&mut self, v: impl Into<String>) -> Result<(), TableError> {
        match self {
            ColumnData::Str(vec) => {
                vec.push(v.into());
                Ok(())
            }
            other => type_mismatch("<column>", DataType::Str, other.data_type()),
        }
    }

    pub fn get_f64(&self, idx: usize) -> Option<f64> {
        match self {
            ColumnData::I64(v) => v.get(idx).map(|x| *x as f64),
            ColumnData::F64(v) => v.get(idx).copied(),
            ColumnData::F32(v) => v.get(idx).map(|x| *x as f64),
            ColumnData::Str(_) => None,
        }
    }

    pub fn get_str(&self, idx: usize) -> Option<&str> {
        match self {
            ColumnData::Str(v) => v.get(idx).map(|s| s.as_str()),
            _ => None,
        }
    }

    pub fn get_i64(&self, idx: usize) -> Option<i64> {
        match self {
            ColumnData::I64(v) => v.get(idx).copied(),
            ColumnData::F64(v) => v.get(idx).map(|x| *x as i64),
            _ => None,
        }
    }
}

fn type_mismatch<T>(name: &str, expected: DataType, found: DataType) -> Result<T, TableError> {
    Err(TableError::TypeMismatch {
        name: name.to_owned(),
        expected: expected.name(),
        found: found.name(),
    })
}
