// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WriterError {
    #[error(transparent)]
    Table(#[from] daq_table::TableError),
    #[error("cannot append to '{path}': {detail}")]
    AppendSchemaMismatch { path: PathBuf, detail: String },
    #[error("writer has no open page")]
    NoOpenPage,
}
