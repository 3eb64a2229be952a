// SPDX-License-Identifier: Apache-2.0

//! Binary framing: fixed-width big-endian scalars, length-prefixed
//! strings and names, a layout header, then zero or more pages until
//! EOF. This is the on-disk byte format `daq-writer` exposes as "the
//! table library".

use std::io::{Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::TableError;
use crate::layout::{ColumnDef, Layout, ParamDef};
use crate::page::Page;
use crate::value::{ColumnData, DataType, ParamValue};

pub const MAGIC: [u8; 6] = *b"DAQTBL";
pub const VERSION: u8 = 1;

fn write_name(w: &mut impl Write, name: &str) -> Result<(), TableError> {
    let bytes = name.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(TableError::StringTooLong(bytes.len()));
    }
    w.write_u16::<BigEndian>(bytes.len() as u16)?;
    w.write_all(bytes)?;
    Ok(())
}

fn read_name(r: &mut impl Read) -> Result<String, TableError> {
    let len = r.read_u16::<BigEndian>()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| TableError::Corrupt(e.to_string()))
}

fn write_str_value(w: &mut impl Write, s: &str) -> Result<(), TableError> {
    let bytes = s.as_bytes();
    if bytes.len() > u32::MAX as usize {
        return Err(TableError::StringTooLong(bytes.len()));
    }
    w.write_u32::<BigEndian>(bytes.len() as u32)?;
    w.write_all(bytes)?;
    Ok(())
}

fn read_str_value(r: &mut impl Read) -> Result<String, TableError> {
    let len = r.read_u32::<BigEndian>()? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| TableError::Corrupt(e.to_string()))
}

pub fn write_header_and_layout(w: &mut impl Write, layout: &Layout) -> Result<(), TableError> {
    w.write_all(&MAGIC)?;
    w.write_u8(VERSION)?;

    w.write_u32::<BigEndian>(layout.parameters.len() as u32)?;
    for p in &layout.parameters {
        write_name(w, &p.name)?;
        w.write_u8(p.data_type.tag())?;
    }

    w.write_u32::<BigEndian>(layout.columns.len() as u32)?;
    for c in &layout.columns {
        write_name(w, &c.name)?;
        w.write_u8(c.data_type.tag())?;
    }
    Ok(())
}

pub fn read_header_and_layout(r: &mut impl Read) -> Result<Layout, TableError> {
    let mut magic = [0u8; 6];
    r.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(TableError::BadMagic {
            expected: MAGIC,
            found: magic,
        });
    }
    let _version = r.read_u8()?;

    let param_count = r.read_u32::<BigEndian>()? as usize;
    let mut parameters = Vec::with_capacity(param_count);
    for _ in 0..param_count {
        let name = read_name(r)?;
        let data_type = DataType::from_tag(r.read_u8()?)?;
        parameters.push(ParamDef { name, data_type });
    }

    let column_count = r.read_u32::<BigEndian>()? as usize;
    let mut columns = Vec::with_capacity(column_count);
    for _ in 0..column_count {
        let name = read_name(r)?;
        let data_type = DataType::from_tag(r.read_u8()?)?;
        columns.push(ColumnDef { name, data_type });
    }

    Ok(Layout { parameters, columns })
}

fn write_param_value(w: &mut impl Write, value: &ParamValue) -> Result<(), TableError> {
    match value {
        ParamValue::I64(v) => w.write_i64::<BigEndian>(*v)?,
        ParamValue::F64(v) => w.write_f64::<BigEndian>(*v)?,
        ParamValue::F32(v) => w.write_f32::<BigEndian>(*v)?,
        ParamValue::Str(s) => write_str_value(w, s)?,
    }
    Ok(())
}

fn read_param_value(r: &mut impl Read, data_type: DataType) -> Result<ParamValue, TableError> {
    Ok(match data_type {
        DataType::I64 => ParamValue::I64(r.read_i64::<BigEndian>()?),
        DataType::F64 => ParamValue::F64(r.read_f64::<BigEndian>()?),
        DataType::F32 => ParamValue::F32(r.read_f32::<BigEndian>()?),
        DataType::Str => ParamValue::Str(read_str_value(r)?),
    })
}

pub fn write_page(w: &mut impl Write, layout: &Layout, page: &Page) -> Result<(), TableError> {
    let row_count = page.row_count();
    for col in &layout.columns {
        let len = page
            .columns
            .get(&col.name)
            .map(ColumnData::len)
            .unwrap_or(0);
        if len != row_count && len != 0 {
            return Err(TableError::SchemaMismatch(format!(
                "column '{}' has {len} rows, page has {row_count}",
                col.name
            )));
        }
    }

    w.write_u32::<BigEndian>(row_count as u32)?;

    for p in &layout.parameters {
        let value = page.parameters.get(&p.name).cloned().unwrap_or(match p.data_type {
            DataType::I64 => ParamValue::I64(0),
            DataType::F64 => ParamValue::F64(0.0),
            DataType::F32 => ParamValue::F32(0.0),
            DataType::Str => ParamValue::Str(String::new()),
        });
        write_param_value(w, &value)?;
    }

    for col in &layout.columns {
        let empty = ColumnData::empty(col.data_type);
        let data = page.columns.get(&col.name).unwrap_or(&empty);
        match data {
            ColumnData::I64(v) => {
                for x in v {
                    w.write_i64::<BigEndian>(*x)?;
                }
            }
            ColumnData::F64(v) => {
                for x in v {
                    w.write_f64::<BigEndian>(*x)?;
                }
            }
            ColumnData::F32(v) => {
                for x in v {
                    w.write_f32::<BigEndian>(*x)?;
                }
            }
            ColumnData::Str(v) => {
                for x in v {
                    write_str_value(w, x)?;
                }
            }
        }
    }
    Ok(())
}

pub fn read_page(r: &mut impl Read, layout: &Layout) -> Result<Page, TableError> {
    let row_count = r.read_u32::<BigEndian>()? as usize;

    let mut page = Page::new(layout);
    for p in &layout.parameters {
        let value = read_param_value(r, p.data_type)?;
        page.set_parameter(p.name.clone(), value);
    }

    for col in &layout.columns {
        let data = page
            .columns
            .get_mut(&col.name)
            .expect("Page::new populates every declared column");
        match data {
            ColumnData::I64(v) => {
                v.reserve(row_count);
                for _ in 0..row_count {
                    v.push(r.read_i64::<BigEndian>()?);
                }
            }
            ColumnData::F64(v) => {
                v.reserve(row_count);
                for _ in 0..row_count {
                    v.push(r.read_f64::<BigEndian>()?);
                }
            }
            ColumnData::F32(v) => {
                v.reserve(row_count);
                for _ in 0..row_count {
                    v.push(r.read_f32::<BigEndian>()?);
                }
            }
            ColumnData::Str(v) => {
                v.reserve(row_count);
                for _ in 0..row_count {
                    v.push(read_str_value(r)?);
                }
            }
        }
    }

    Ok(page)
}
