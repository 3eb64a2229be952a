// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad magic: expected {expected:?}, found {found:?}")]
    BadMagic { expected: [u8; 6], found: [u8; 6] },

    #[error("unknown type tag {0}")]
    UnknownType(u8),

    #[error("string too long ({0} bytes)")]
    StringTooLong(usize),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("column '{0}' not found")]
    UnknownColumn(String),

    #[error("parameter '{0}' not found")]
    UnknownParameter(String),

    #[error("type mismatch on '{name}': expected {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("row index {index} out of bounds (column length {len})")]
    RowOutOfBounds { index: usize, len: usize },

    #[error("corrupt file: {0}")]
    Corrupt(String),
}
