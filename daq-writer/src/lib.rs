// SPDX-License-Identifier: Apache-2.0

//! The Output Writer: schema management, preallocation,
//! append/recover, and flush policy layered on `daq-table`.

pub mod bit_decoder;
pub mod error;
pub mod schema;
pub mod writer;

pub use bit_decoder::WriterBitDecoderResolver;
pub use error::WriterError;
pub use schema::{alarm_log_layout, change_log_layout, monitor_layout, periodic_log_layout, AUXILIARY_COLUMNS};
pub use writer::{CellValue, OpenMode, PreallocationPolicy, Writer};
