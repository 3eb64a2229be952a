// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("table error: {0}")]
    Table(#[from] daq_table::TableError),

    #[error("required column '{0}' is missing")]
    MissingRequiredColumn(&'static str),

    #[error("column '{column}' has the wrong type: expected {expected}, found {found}")]
    WrongColumnType {
        column: &'static str,
        expected: &'static str,
        found: &'static str,
    },
}
