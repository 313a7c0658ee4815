//! The mutable DBF cursor: open/create/close, navigation, and record I/O.
//!
//! Goto/Skip/AppendBlank/Delete all reposition and rewrite in place, so a
//! single `Dbf` owns a read-write `File` and seeks explicitly rather than
//! streaming through it in one direction.

use crate::dbf::field::{FieldDescriptor, FieldType};
use crate::dbf::header::{
    dbf_header, field_descriptor, EOF_MARKER, FIELD_DESCRIPTOR_SIZE, HEADER_SIZE,
    HEADER_TERMINATOR, VERSION_MEMO, VERSION_PLAIN,
};
use crate::error::{ErrorKind, XbaseError, XbaseResult};
use crate::value::Value;
use binary_layout::prelude::*;
use chrono::{Datelike, Local};
use log::{debug, trace, warn};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

pub const DELETE_MARKER: u8 = b'*';
pub const ACTIVE_MARKER: u8 = b' ';

pub struct Dbf {
    file: File,
    path: PathBuf,
    pub alias: String,
    pub readonly: bool,
    pub exclusive: bool,
    pub fields: Vec<FieldDescriptor>,
    header_size: u16,
    record_size: u16,
    reccount: u32,

    /// 1-based; 0 means "before first".
    current: u32,
    buffer: Vec<u8>,
    deleted: bool,
    modified: bool,
    bof: bool,
    eof: bool,
}

fn derive_alias(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default()
}

impl Dbf {
    pub fn open(path: impl AsRef<Path>, readonly: bool) -> XbaseResult<Dbf> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .read(true)
            .write(!readonly)
            .open(&path)
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    XbaseError::new(ErrorKind::FileNotFound, format!("{}", path.display()))
                } else {
                    XbaseError::with_source(ErrorKind::FileRead, "opening DBF", e)
                }
            })?;

        let mut hdr_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut hdr_buf)
            .map_err(|e| XbaseError::with_source(ErrorKind::FileRead, "reading DBF header", e))?;
        let view = dbf_header::View::new(&hdr_buf);
        let version = view.version().read();
        if version != VERSION_PLAIN && version != VERSION_MEMO {
            return Err(XbaseError::new(
                ErrorKind::InvalidDbf,
                format!("unrecognised DBF version byte {:#x}", version),
            ));
        }
        let reccount = view.n_records().read();
        let header_size = view.n_header_bytes().read();
        let record_size = view.n_record_bytes().read();

        let n_fields = (header_size as usize - HEADER_SIZE - 1) / FIELD_DESCRIPTOR_SIZE;
        let mut fields = Vec::with_capacity(n_fields);
        let mut offset = 1usize; // skip the delete marker
        let mut field_buf = vec![0u8; FIELD_DESCRIPTOR_SIZE];
        for _ in 0..n_fields {
            file.read_exact(&mut field_buf)
                .map_err(|e| XbaseError::with_source(ErrorKind::FileRead, "reading field descriptor", e))?;
            let fd = FieldDescriptor::from_bytes(&field_buf, offset)?;
            offset += fd.length;
            fields.push(fd);
        }
        let declared_size = offset; // includes the leading delete-marker byte
        if declared_size != record_size as usize {
            return Err(XbaseError::new(
                ErrorKind::InvalidDbf,
                format!(
                    "field lengths sum to {} but header declares record size {}",
                    declared_size, record_size
                ),
            ));
        }

        let mut term = [0u8; 1];
        file.read_exact(&mut term)
            .map_err(|e| XbaseError::with_source(ErrorKind::FileRead, "reading header terminator", e))?;
        if term[0] != HEADER_TERMINATOR {
            return Err(XbaseError::new(
                ErrorKind::InvalidDbf,
                format!("expected header terminator 0x0D, found {:#x}", term[0]),
            ));
        }

        let alias = derive_alias(&path);
        let mut dbf = Dbf {
            file,
            path,
            alias,
            readonly,
            exclusive: false,
            fields,
            header_size,
            record_size,
            reccount,
            current: 0,
            buffer: vec![ACTIVE_MARKER; record_size as usize],
            deleted: false,
            modified: false,
            bof: true,
            eof: true,
        };
        if reccount > 0 {
            dbf.goto(1)?;
        } else {
            dbf.bof = true;
            dbf.eof = true;
            dbf.current = 0;
        }
        debug!("opened DBF {} ({} records)", dbf.path.display(), reccount);
        Ok(dbf)
    }

    pub fn create(path: impl AsRef<Path>, fields: Vec<FieldDescriptor>) -> XbaseResult<Dbf> {
        let path = path.as_ref().to_path_buf();
        if fields.is_empty() || fields.len() > 128 {
            return Err(XbaseError::new(
                ErrorKind::InvalidField,
                "a DBF must have between 1 and 128 fields",
            ));
        }
        let mut fields = fields;
        for f in fields.iter_mut() {
            f.length = FieldDescriptor::normalized_length(f.field_type, f.length);
        }
        for f in &fields {
            f.validate_for_create()?;
        }

        let mut offset = 1usize;
        for f in fields.iter_mut() {
            f.offset = offset;
            offset += f.length;
        }
        let record_size = offset as u16;
        let header_size = (HEADER_SIZE + fields.len() * FIELD_DESCRIPTOR_SIZE + 1) as u16;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| XbaseError::with_source(ErrorKind::FileCreate, "creating DBF", e))?;

        write_header(&mut file, 0, header_size, record_size)?;
        for f in &fields {
            let mut buf = [0u8; FIELD_DESCRIPTOR_SIZE];
            f.to_bytes(&mut buf);
            file.write_all(&buf)?;
        }
        file.write_all(&[HEADER_TERMINATOR])?;
        file.write_all(&[EOF_MARKER])?;
        file.flush()?;

        let alias = derive_alias(&path);
        debug!("created DBF {} with {} fields", path.display(), fields.len());
        Ok(Dbf {
            file,
            path,
            alias,
            readonly: false,
            exclusive: false,
            fields,
            header_size,
            record_size,
            reccount: 0,
            current: 0,
            buffer: vec![ACTIVE_MARKER; record_size as usize],
            deleted: false,
            modified: false,
            bof: true,
            eof: true,
        })
    }

    pub fn close(&mut self) -> XbaseResult<()> {
        if self.modified {
            self.flush_current()?;
        }
        self.file.flush()?;
        Ok(())
    }

    fn record_offset(&self, recno: u32) -> u64 {
        self.header_size as u64 + (recno as u64 - 1) * self.record_size as u64
    }

    fn flush_current(&mut self) -> XbaseResult<()> {
        if self.current >= 1 && self.current <= self.reccount {
            let off = self.record_offset(self.current);
            self.file.seek(SeekFrom::Start(off))?;
            self.file.write_all(&self.buffer)?;
            self.modified = false;
        }
        Ok(())
    }

    pub fn goto(&mut self, n: u32) -> XbaseResult<()> {
        if self.modified {
            self.flush_current()?;
        }
        if n == 0 {
            self.current = 0;
            self.bof = true;
            self.eof = self.reccount == 0;
            self.buffer.iter_mut().for_each(|b| *b = ACTIVE_MARKER);
            self.deleted = false;
            return Ok(());
        }
        if n > self.reccount {
            self.current = n;
            self.eof = true;
            self.bof = false;
            self.buffer.iter_mut().for_each(|b| *b = ACTIVE_MARKER);
            self.deleted = false;
            return Ok(());
        }
        let off = self.record_offset(n);
        self.file.seek(SeekFrom::Start(off))?;
        self.file.read_exact(&mut self.buffer)?;
        self.current = n;
        self.bof = false;
        self.eof = false;
        self.deleted = self.buffer[0] == DELETE_MARKER;
        self.modified = false;
        Ok(())
    }

    pub fn skip(&mut self, delta: i64) -> XbaseResult<()> {
        let cur = self.current as i64;
        let new = (cur + delta).max(0) as u32;
        self.goto(new)
    }

    pub fn go_top(&mut self) -> XbaseResult<()> {
        if self.reccount == 0 {
            self.bof = true;
            self.eof = true;
            self.current = 0;
            return Ok(());
        }
        self.goto(1)
    }

    pub fn go_bottom(&mut self) -> XbaseResult<()> {
        if self.reccount == 0 {
            self.bof = true;
            self.eof = true;
            self.current = 0;
            return Ok(());
        }
        self.goto(self.reccount)
    }

    pub fn bof(&self) -> bool {
        self.bof
    }

    pub fn eof(&self) -> bool {
        self.eof
    }

    pub fn recno(&self) -> u32 {
        self.current
    }

    pub fn reccount(&self) -> u32 {
        self.reccount
    }

    pub fn deleted(&self) -> bool {
        self.deleted
    }

    pub fn append_blank(&mut self) -> XbaseResult<()> {
        if self.readonly {
            return Err(XbaseError::new(ErrorKind::FileWrite, "DBF is open read-only"));
        }
        if self.modified {
            self.flush_current()?;
        }
        let new_recno = self.reccount + 1;
        let off = self.record_offset(new_recno);
        self.file.seek(SeekFrom::Start(off))?;
        let mut row = vec![ACTIVE_MARKER; self.record_size as usize];
        row[0] = ACTIVE_MARKER;
        self.file.write_all(&row)?;
        self.file.write_all(&[EOF_MARKER])?;
        self.reccount = new_recno;

        let today = Local::now().date_naive();
        self.write_header(Some((today.year(), today.month() as u8, today.day() as u8)))?;

        self.buffer = row;
        self.current = new_recno;
        self.bof = false;
        self.eof = false;
        self.deleted = false;
        self.modified = false;
        trace!("appended blank record {}", new_recno);
        Ok(())
    }

    fn write_header(&mut self, last_updated: Option<(i32, u8, u8)>) -> XbaseResult<()> {
        write_header(&mut self.file, self.reccount, self.header_size, self.record_size)?;
        if let Some((y, m, d)) = last_updated {
            let mut buf = [0u8; HEADER_SIZE];
            self.file.seek(SeekFrom::Start(0))?;
            self.file.read_exact(&mut buf)?;
            let mut view = dbf_header::View::new(&mut buf);
            {
                let mut lu = view.last_updated_mut();
                lu.year_mut().write(((y - 1900).max(0)) as u8);
                lu.month_mut().write(m);
                lu.day_mut().write(d);
            }
            self.file.seek(SeekFrom::Start(0))?;
            self.file.write_all(&buf)?;
        }
        self.file.flush()?;
        Ok(())
    }

    fn require_current(&self) -> XbaseResult<()> {
        if self.bof || self.eof || self.current == 0 {
            return Err(XbaseError::new(ErrorKind::InvalidRecord, "no current record"));
        }
        Ok(())
    }

    pub fn delete(&mut self) -> XbaseResult<()> {
        if self.readonly {
            return Err(XbaseError::new(ErrorKind::FileWrite, "DBF is open read-only"));
        }
        self.require_current()?;
        self.buffer[0] = DELETE_MARKER;
        self.deleted = true;
        self.modified = true;
        Ok(())
    }

    pub fn recall(&mut self) -> XbaseResult<()> {
        if self.readonly {
            return Err(XbaseError::new(ErrorKind::FileWrite, "DBF is open read-only"));
        }
        self.require_current()?;
        self.buffer[0] = ACTIVE_MARKER;
        self.deleted = false;
        self.modified = true;
        Ok(())
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        let upper = name.to_uppercase();
        self.fields.iter().position(|f| f.name == upper)
    }

    pub fn get(&self, idx: usize) -> XbaseResult<Value> {
        self.require_current()?;
        let fd = self
            .fields
            .get(idx)
            .ok_or_else(|| XbaseError::new(ErrorKind::InvalidField, "field index out of range"))?;
        fd.get(&self.buffer)
    }

    pub fn put(&mut self, idx: usize, value: &Value) -> XbaseResult<()> {
        if self.readonly {
            return Err(XbaseError::new(ErrorKind::FileWrite, "DBF is open read-only"));
        }
        self.require_current()?;
        let fd = self
            .fields
            .get(idx)
            .ok_or_else(|| XbaseError::new(ErrorKind::InvalidField, "field index out of range"))?
            .clone();
        fd.put(&mut self.buffer, value)?;
        self.modified = true;
        Ok(())
    }

    pub fn flush(&mut self) -> XbaseResult<()> {
        if self.modified {
            self.flush_current()?;
        }
        self.file.flush()?;
        Ok(())
    }

    pub fn pack(&mut self) -> XbaseResult<u32> {
        if self.readonly {
            return Err(XbaseError::new(ErrorKind::FileWrite, "DBF is open read-only"));
        }
        if self.modified {
            self.flush_current()?;
        }
        let mut write_recno: u32 = 0;
        let mut row = vec![0u8; self.record_size as usize];
        for read_recno in 1..=self.reccount {
            let off = self.record_offset(read_recno);
            self.file.seek(SeekFrom::Start(off))?;
            self.file.read_exact(&mut row)?;
            if row[0] == DELETE_MARKER {
                continue;
            }
            write_recno += 1;
            if write_recno != read_recno {
                let wout = self.record_offset(write_recno);
                self.file.seek(SeekFrom::Start(wout))?;
                self.file.write_all(&row)?;
            }
        }
        let tail = self.record_offset(write_recno + 1);
        self.file.seek(SeekFrom::Start(tail))?;
        self.file.write_all(&[EOF_MARKER])?;
        self.file.set_len(tail + 1)?;
        self.reccount = write_recno;
        self.write_header(None)?;
        self.goto(if self.reccount > 0 { 1 } else { 0 })?;
        if self.reccount == 0 {
            self.bof = true;
            self.eof = true;
        }
        debug!("packed DBF {}: {} surviving records", self.path.display(), write_recno);
        Ok(write_recno)
    }

    pub fn zap(&mut self) -> XbaseResult<()> {
        if self.readonly {
            return Err(XbaseError::new(ErrorKind::FileWrite, "DBF is open read-only"));
        }
        self.reccount = 0;
        let tail = self.header_size as u64;
        self.file.seek(SeekFrom::Start(tail))?;
        self.file.write_all(&[EOF_MARKER])?;
        self.file.set_len(tail + 1)?;
        self.write_header(None)?;
        self.current = 0;
        self.bof = true;
        self.eof = true;
        self.buffer.iter_mut().for_each(|b| *b = ACTIVE_MARKER);
        self.deleted = false;
        self.modified = false;
        warn!("zapped DBF {}: all records removed", self.path.display());
        Ok(())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field_type(&self, idx: usize) -> Option<FieldType> {
        self.fields.get(idx).map(|f| f.field_type)
    }
}

fn write_header(file: &mut File, reccount: u32, header_size: u16, record_size: u16) -> XbaseResult<()> {
    let mut buf = [0u8; HEADER_SIZE];
    {
        let mut view = dbf_header::View::new(&mut buf);
        view.version_mut().write(VERSION_PLAIN);
        let today = Local::now().date_naive();
        {
            let mut lu = view.last_updated_mut();
            lu.year_mut().write((today.year() - 1900).max(0) as u8);
            lu.month_mut().write(today.month() as u8);
            lu.day_mut().write(today.day() as u8);
        }
        view.n_records_mut().write(reccount);
        view.n_header_bytes_mut().write(header_size);
        view.n_record_bytes_mut().write(record_size);
    }
    file.seek(SeekFrom::Start(0))?;
    file.write_all(&buf)?;
    file.flush()?;
    Ok(())
}

#[allow(dead_code)]
fn _assert_field_descriptor_size() {
    let _ = field_descriptor::View::new([0u8; FIELD_DESCRIPTOR_SIZE]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dbf::field::FieldType;

    fn sample_fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor { name: "NAME".into(), field_type: FieldType::Character, length: 20, decimal_count: 0, offset: 0 },
            FieldDescriptor { name: "AGE".into(), field_type: FieldType::Numeric, length: 3, decimal_count: 0, offset: 0 },
            FieldDescriptor { name: "ACTIVE".into(), field_type: FieldType::Logical, length: 1, decimal_count: 0, offset: 0 },
        ]
    }

    #[test]
    fn create_then_reopen_preserves_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.dbf");
        {
            let dbf = Dbf::create(&path, sample_fields()).unwrap();
            assert_eq!(dbf.reccount(), 0);
        }
        let dbf = Dbf::open(&path, false).unwrap();
        assert_eq!(dbf.fields.len(), 3);
        assert_eq!(dbf.fields[0].name, "NAME");
        assert_eq!(dbf.fields[1].length, 3);
    }

    #[test]
    fn append_replace_list() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.dbf");
        let mut dbf = Dbf::create(&path, sample_fields()).unwrap();
        dbf.append_blank().unwrap();
        dbf.put(0, &Value::String("John Doe".into())).unwrap();
        dbf.put(1, &Value::Number(25.0)).unwrap();
        dbf.put(2, &Value::Logical(true)).unwrap();
        dbf.flush().unwrap();
        assert_eq!(dbf.reccount(), 1);

        dbf.goto(1).unwrap();
        assert_eq!(dbf.get(0).unwrap(), Value::String("John Doe".to_string() + &" ".repeat(12)));
        assert_eq!(dbf.get(1).unwrap(), Value::Number(25.0));
        assert_eq!(dbf.get(2).unwrap(), Value::Logical(true));
    }

    #[test]
    fn navigation_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dbf");
        let mut dbf = Dbf::create(&path, sample_fields()).unwrap();
        for name in ["Alice", "Bob", "Carol"] {
            dbf.append_blank().unwrap();
            dbf.put(0, &Value::String(name.into())).unwrap();
        }
        dbf.go_top().unwrap();
        assert_eq!(dbf.recno(), 1);
        dbf.skip(2).unwrap();
        assert_eq!(dbf.recno(), 3);
        dbf.go_bottom().unwrap();
        assert_eq!(dbf.recno(), 3);
        dbf.skip(1).unwrap();
        assert!(dbf.eof());
    }

    #[test]
    fn delete_pack_zap_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dbf");
        let mut dbf = Dbf::create(&path, sample_fields()).unwrap();
        for name in ["Alice", "Bob", "Carol"] {
            dbf.append_blank().unwrap();
            dbf.put(0, &Value::String(name.into())).unwrap();
        }
        dbf.goto(2).unwrap();
        dbf.delete().unwrap();
        let packed = dbf.pack().unwrap();
        assert_eq!(packed, 2);
        assert_eq!(dbf.reccount(), 2);
        dbf.goto(1).unwrap();
        assert!(dbf.get(0).unwrap().to_display_string().starts_with("Alice"));
        dbf.goto(2).unwrap();
        assert!(dbf.get(0).unwrap().to_display_string().starts_with("Carol"));

        dbf.zap().unwrap();
        assert_eq!(dbf.reccount(), 0);
        assert!(dbf.bof());
        assert!(dbf.eof());
    }

    #[test]
    fn skip_zero_is_noop_and_skip_negative_hits_bof() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.dbf");
        let mut dbf = Dbf::create(&path, sample_fields()).unwrap();
        dbf.append_blank().unwrap();
        dbf.goto(1).unwrap();
        dbf.skip(0).unwrap();
        assert_eq!(dbf.recno(), 1);
        dbf.skip(-1).unwrap();
        assert!(dbf.bof());
        assert_eq!(dbf.recno(), 0);
    }
}
