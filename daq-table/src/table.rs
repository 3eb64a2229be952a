// SPDX-License-Identifier: Apache-2.0

//! In-memory representation of a whole file: a `Layout` plus an
//! ordered list of `Page`s, with load/store/recover operations.

use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::codec;
use crate::error::TableError;
use crate::layout::Layout;
use crate::page::Page;

#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub layout: Layout,
    pub pages: Vec<Page>,
}

impl Table {
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            pages: Vec::new(),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let file = File::open(path)?;
        let mut r = BufReader::new(file);
        Self::read_from(&mut r)
    }

    pub fn read_from(r: &mut impl Read) -> Result<Self, TableError> {
        let layout = codec::read_header_and_layout(r)?;
        let mut pages = Vec::new();
        loop {
            match codec::read_page(r, &layout) {
                Ok(page) => pages.push(page),
                Err(TableError::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e),
            }
        }
        Ok(Self { layout, pages })
    }

    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), TableError> {
        let file = File::create(path)?;
        let mut w = BufWriter::new(file);
        self.write_to(&mut w)?;
        w.flush()?;
        Ok(())
    }

    pub fn write_to(&self, w: &mut impl Write) -> Result<(), TableError> {
        codec::write_header_and_layout(w, &self.layout)?;
        for page in &self.pages {
            codec::write_page(w, &self.layout, page)?;
        }
        Ok(())
    }

    /// One-shot recovery: re-reads the file page by page, keeping
    /// every page that parses completely and discarding a trailing
    /// partial page.
    pub fn recover(path: impl AsRef<Path>) -> Result<Self, TableError> {
        let bytes = std::fs::read(&path)?;
        let mut cursor = Cursor::new(&bytes);
        let layout = codec::read_header_and_layout(&mut cursor)?;

        let mut pages = Vec::new();
        loop {
            let checkpoint = cursor.position();
            match codec::read_page(&mut cursor, &layout) {
                Ok(page) => pages.push(page),
                Err(_) => {
                    cursor.seek(SeekFrom::Start(checkpoint))?;
                    break;
                }
            }
        }

        let recovered = Self { layout, pages };
        recovered.store(&path)?;
        Ok(recovered)
    }

    pub fn last_page_mut(&mut self) -> Option<&mut Page> {
        self.pages.last_mut()
    }

    pub fn push_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn total_rows(&self) -> usize {
        self.pages.iter().map(Page::row_count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{ColumnData, DataType, ParamValue};
    use tempfile::tempdir;

    fn sample_layout() -> Layout {
        Layout::new()
            .with_parameter("StartTime", DataType::F64)
            .with_column("Step", DataType::I64)
            .with_column("X", DataType::F64)
    }

    fn sample_page(layout: &Layout, xs: &[f64]) -> Page {
        let mut page = Page::new(layout);
        page.set_parameter("StartTime", ParamValue::F64(1000.0));
        if let ColumnData::I64(v) = page.column_mut("Step").unwrap() {
            v.extend((0..xs.len() as i64).collect::<Vec<_>>());
        }
        if let ColumnData::F64(v) = page.column_mut("X").unwrap() {
            v.extend_from_slice(xs);
        }
        page
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.daq");
        let layout = sample_layout();
        let mut table = Table::new(layout.clone());
        table.push_page(sample_page(&layout, &[1.0, 2.0, 3.0]));

        table.store(&path).unwrap();
        let loaded = Table::load(&path).unwrap();

        assert_eq!(loaded.layout, layout);
        assert_eq!(loaded.pages.len(), 1);
        assert_eq!(loaded.pages[0].row_count(), 3);
    }

    #[test]
    fn recover_drops_trailing_partial_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.daq");
        let layout = sample_layout();
        let mut table = Table::new(layout.clone());
        table.push_page(sample_page(&layout, &[1.0, 2.0]));
        table.store(&path).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        bytes.extend_from_slice(&[0xAB; 5]); // truncated/garbage trailing page
        std::fs::write(&path, &bytes).unwrap();

        let recovered = Table::recover(&path).unwrap();
        assert_eq!(recovered.pages.len(), 1);
        assert_eq!(recovered.pages[0].row_count(), 2);

        // File on disk was rewritten clean.
        let reloaded = Table::load(&path).unwrap();
        assert_eq!(reloaded.pages.len(), 1);
    }
}
