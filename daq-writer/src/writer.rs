// SPDX-License-Identifier: Apache-2.0

//! The Output Writer: `open`/`append_row`/`set_page_parameter`/
//! `start_page`/`lengthen_page`/`flush`/`close`/`recover` over the
//! self-describing tabular format.

use std::path::{Path, PathBuf};

use daq_table::{ColumnData, Layout, Page, ParamValue, Table};

use crate::error::WriterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    Create,
    /// `toPage=true` extends the last page of the existing file;
    /// `toPage=false` starts a new page, copying parameters from the
    /// last page of the existing file.
    Append { to_page: bool },
}

/// The block size new pages/lengthen calls preallocate by, e.g. 100
/// rows for alarm logs or `flushInterval` rows for periodic logs.
#[derive(Debug, Clone, Copy)]
pub struct PreallocationPolicy {
    pub block_rows: usize,
}

pub struct Writer {
    path: PathBuf,
    table: Table,
    preallocation: PreallocationPolicy,
    writes_since_flush: u32,
    flush_interval: u32,
}

impl Writer {
    /// Opens `path` for writing under `mode`. `required_columns` are
    /// the request-row readback names the schema must carry; they are
    /// checked against the existing file's layout when appending.
    pub fn open(
        path: impl AsRef<Path>,
        mode: OpenMode,
        layout: Layout,
        required_columns: &[&str],
        preallocation: PreallocationPolicy,
        flush_interval: u32,
    ) -> Result<Self, WriterError> {
        let path = path.as_ref().to_path_buf();
        let table = match mode {
            OpenMode::Create => Table::new(layout),
            OpenMode::Append { to_page } => {
                let mut existing = if path.exists() {
                    Table::load(&path)
                } else {
                    Ok(Table::new(layout.clone()))
                }
                .or_else(|_| Table::recover(&path))?;

                existing
                    .layout
                    .compatible_for_append(required_columns, crate::schema::AUXILIARY_COLUMNS)
                    .map_err(|e| WriterError::AppendSchemaMismatch {
                        path: path.clone(),
                        detail: e.to_string(),
                    })?;

                if !to_page || existing.pages.is_empty() {
                    let params = existing
                        .pages
                        .last()
                        .map(|p| p.parameters.clone())
                        .unwrap_or_default();
                    let mut page = Page::new(&existing.layout);
                    page.parameters = params;
                    page.lengthen(preallocation.block_rows);
                    existing.push_page(page);
                }
                existing
            }
        };

        let mut writer = Self {
            path,
            table,
            preallocation,
            writes_since_flush: 0,
            flush_interval,
        };
        if writer.table.pages.is_empty() {
            writer.start_page(preallocation.block_rows);
        }
        Ok(writer)
    }

    pub fn layout(&self) -> &Layout {
        &self.table.layout
    }

    /// The current page's parameters, for resolving a `BitDecoderArray`
    /// lookup against the schema the writer itself owns.
    pub fn current_page_parameters(&self) -> Option<&std::collections::HashMap<String, ParamValue>> {
        self.table.pages.last().map(|p| &p.parameters)
    }

    pub fn set_page_parameter(&mut self, name: &str, value: ParamValue) -> Result<(), WriterError> {
        let page = self.table.last_page_mut().ok_or(WriterError::NoOpenPage)?;
        page.set_parameter(name, value);
        Ok(())
    }

    pub fn start_page(&mut self, preallocate: usize) {
        let mut page = Page::new(&self.table.layout);
        page.lengthen(preallocate);
        self.table.push_page(page);
    }

    /// Extends the current page's columns by `additional` rows. The
    /// writer lengthens on demand whenever `rows_allocated <=
    /// rows_used` rather than rejecting the write.
    pub fn lengthen_page(&mut self, additional: usize) -> Result<(), WriterError> {
        let page = self.table.last_page_mut().ok_or(WriterError::NoOpenPage)?;
        page.lengthen(additional);
        Ok(())
    }

    fn ensure_capacity(&mut self) -> Result<(), WriterError> {
        let block = self.preallocation.block_rows.max(1);
        let page = self.table.last_page_mut().ok_or(WriterError::NoOpenPage)?;
        if page.rows_allocated() <= page.row_count() {
            page.lengthen(block);
        }
        Ok(())
    }

    /// Appends one row's values, one per column name in the layout's
    /// declared order. Columns not present in `values` are left at
    /// their type's default (caller-populated by calling
    /// `column_mut` directly for auxiliary columns before commit, if
    /// needed).
    pub fn append_row(&mut self, values: &[(&str, CellValue)]) -> Result<(), WriterError> {
        self.ensure_capacity()?;
        let page = self.table.last_page_mut().ok_or(WriterError::NoOpenPage)?;
        for (name, value) in values {
            let column = page.column_mut(name)?;
            push_cell(column, value)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), WriterError> {
        self.table.store(&self.path)?;
        self.writes_since_flush = 0;
        Ok(())
    }

    /// Call after every write cycle; flushes synchronously once
    /// `flushInterval` cycles have elapsed.
    pub fn tick_flush(&mut self) -> Result<bool, WriterError> {
        self.writes_since_flush += 1;
        if self.writes_since_flush >= self.flush_interval.max(1) {
            self.flush()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn close(mut self) -> Result<(), WriterError> {
        self.flush()
    }

    pub fn total_rows(&self) -> usize {
        self.table.total_rows()
    }

    pub fn current_row_count(&self) -> usize {
        self.table.pages.last().map(Page::row_count).unwrap_or(0)
    }
}

/// A typed cell value for `append_row`, mirroring the table's column
/// types without exposing `daq_table::ColumnData` directly.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    I64(i64),
    F64(f64),
    Str(String),
}

fn push_cell(column: &mut ColumnData, value: &CellValue) -> Result<(), WriterError> {
    match value {
        CellValue::I64(v) => column.push_i64(*v)?,
        CellValue::F64(v) => column.push_f64(*v)?,
        CellValue::Str(v) => column.push_str(v.clone())?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use daq_table::DataType;
    use tempfile::tempdir;

    fn layout() -> Layout {
        Layout::new()
            .with_column("Step", DataType::I64)
            .with_column("X", DataType::F64)
    }

    #[test]
    fn append_row_lengthens_on_demand() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.daq");
        let mut writer = Writer::open(
            &path,
            OpenMode::Create,
            layout(),
            &["X"],
            PreallocationPolicy { block_rows: 2 },
            10,
        )
        .unwrap();

        for i in 0..5 {
            writer
                .append_row(&[("Step", CellValue::I64(i)), ("X", CellValue::F64(i as f64))])
                .unwrap();
        }
        assert_eq!(writer.current_row_count(), 5);
        writer.flush().unwrap();

        let reloaded = Table::load(&path).unwrap();
        assert_eq!(reloaded.pages[0].row_count(), 5);
    }

    #[test]
    fn append_mode_rejects_schema_mismatch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.daq");
        let mut writer = Writer::open(
            &path,
            OpenMode::Create,
            layout(),
            &["X"],
            PreallocationPolicy { block_rows: 2 },
            1,
        )
        .unwrap();
        writer
            .append_row(&[("Step", CellValue::I64(0)), ("X", CellValue::F64(1.0))])
            .unwrap();
        writer.close().unwrap();

        let result = Writer::open(
            &path,
            OpenMode::Append { to_page: true },
            layout(),
            &["X", "Y"],
            PreallocationPolicy { block_rows: 2 },
            1,
        );
        assert!(result.is_err());
    }

    #[test]
    fn append_to_page_extends_last_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.daq");
        let mut writer = Writer::open(
            &path,
            OpenMode::Create,
            layout(),
            &["X"],
            PreallocationPolicy { block_rows: 2 },
            1,
        )
        .unwrap();
        writer
            .append_row(&[("Step", CellValue::I64(0)), ("X", CellValue::F64(1.0))])
            .unwrap();
        writer.close().unwrap();

        let mut writer = Writer::open(
            &path,
            OpenMode::Append { to_page: true },
            layout(),
            &["X"],
            PreallocationPolicy { block_rows: 2 },
            1,
        )
        .unwrap();
        writer
            .append_row(&[("Step", CellValue::I64(1)), ("X", CellValue::F64(2.0))])
            .unwrap();
        writer.flush().unwrap();

        let reloaded = Table::load(&path).unwrap();
        assert_eq!(reloaded.pages.len(), 1);
        assert_eq!(reloaded.pages[0].row_count(), 2);
    }
}
