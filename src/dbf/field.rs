//! Field descriptors and typed field codecs.
//!
//! Reads and writes field bytes against a fixed-offset byte slice within a
//! mutable in-memory record buffer (see `cursor.rs`).

use crate::dbf::header::field_descriptor;
use crate::error::{ErrorKind, XbaseError, XbaseResult};
use crate::value::Value;
use chrono::NaiveDate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Character,
    Numeric,
    Date,
    Logical,
    Memo,
}

impl FieldType {
    pub fn code(&self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric => b'N',
            FieldType::Date => b'D',
            FieldType::Logical => b'L',
            FieldType::Memo => b'M',
        }
    }

    pub fn from_code(c: u8) -> XbaseResult<FieldType> {
        match c {
            b'C' => Ok(FieldType::Character),
            b'N' => Ok(FieldType::Numeric),
            b'D' => Ok(FieldType::Date),
            b'L' => Ok(FieldType::Logical),
            b'M' => Ok(FieldType::Memo),
            other => Err(XbaseError::new(
                ErrorKind::InvalidDbf,
                format!("unknown field type byte: {:#x}", other),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub field_type: FieldType,
    pub length: usize,
    pub decimal_count: u8,
    /// Byte offset of this field within a record row, past the delete
    /// marker byte.
    pub offset: usize,
}

fn data_to_string(data: &[u8]) -> String {
    String::from_utf8_lossy(data).trim_end_matches('\0').to_string()
}

impl FieldDescriptor {
    pub fn from_bytes(data: &[u8], offset: usize) -> XbaseResult<FieldDescriptor> {
        let view = field_descriptor::View::new(data);
        let name = data_to_string(view.name()).trim_end().to_uppercase();
        let field_type = FieldType::from_code(view.f_type().read())?;
        Ok(FieldDescriptor {
            name,
            field_type,
            length: view.length().read() as usize,
            decimal_count: view.decimal_count().read(),
            offset,
        })
    }

    pub fn to_bytes(&self, buf: &mut [u8]) {
        let mut view = field_descriptor::View::new(buf);
        let mut name_bytes = [0u8; 11];
        let upper = self.name.to_uppercase();
        let n = upper.len().min(11);
        name_bytes[..n].copy_from_slice(&upper.as_bytes()[..n]);
        view.name_mut().copy_from_slice(&name_bytes);
        view.f_type_mut().write(self.field_type.code());
        view.length_mut().write(self.length as u8);
        view.decimal_count_mut().write(self.decimal_count);
    }

    /// Validates per-type length rules for `Create`.
    pub fn validate_for_create(&self) -> XbaseResult<()> {
        let ok = match self.field_type {
            FieldType::Character => (1..=254).contains(&self.length),
            FieldType::Numeric => (1..=20).contains(&self.length),
            FieldType::Date => self.length == 8,
            FieldType::Logical => self.length == 1,
            FieldType::Memo => self.length == 10,
        };
        if ok {
            Ok(())
        } else {
            Err(XbaseError::new(
                ErrorKind::InvalidField,
                format!("invalid length {} for field {} ({:?})", self.length, self.name, self.field_type),
            ))
        }
    }

    /// Normalises a field's declared length for the types that are always a
    /// fixed width regardless of request (DATE/LOGICAL/MEMO).
    pub fn normalized_length(field_type: FieldType, requested: usize) -> usize {
        match field_type {
            FieldType::Date => 8,
            FieldType::Logical => 1,
            FieldType::Memo => 10,
            _ => requested,
        }
    }

    pub fn get(&self, raw: &[u8]) -> XbaseResult<Value> {
        let slice = &raw[self.offset..self.offset + self.length];
        match self.field_type {
            FieldType::Character => {
                Ok(Value::String(String::from_utf8_lossy(slice).to_string()))
            }
            FieldType::Numeric => {
                let s = String::from_utf8_lossy(slice);
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Ok(Value::Number(0.0))
                } else {
                    Ok(Value::Number(trimmed.parse::<f64>()?))
                }
            }
            FieldType::Date => {
                let s = String::from_utf8_lossy(slice).to_string();
                if s.trim().is_empty() {
                    Ok(Value::empty_date())
                } else {
                    Ok(Value::Date(s))
                }
            }
            FieldType::Logical => match slice.first() {
                Some(b'T') | Some(b't') | Some(b'Y') | Some(b'y') => Ok(Value::Logical(true)),
                Some(b'F') | Some(b'f') | Some(b'N') | Some(b'n') => Ok(Value::Logical(false)),
                _ => Ok(Value::Logical(false)),
            },
            FieldType::Memo => Ok(Value::String(String::from_utf8_lossy(slice).trim().to_string())),
        }
    }

    pub fn put(&self, raw: &mut [u8], value: &Value) -> XbaseResult<()> {
        let slice = &mut raw[self.offset..self.offset + self.length];
        match self.field_type {
            FieldType::Character => {
                let s = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_display_string(),
                };
                write_padded_left(slice, s.as_bytes());
                Ok(())
            }
            FieldType::Numeric => {
                let n = value.to_number();
                let text = format_numeric(n, self.length, self.decimal_count);
                match text {
                    Some(t) => {
                        write_padded_right(slice, t.as_bytes());
                        Ok(())
                    }
                    None => {
                        // Overflow: fill with asterisks, the common dBASE
                        // convention.
                        for b in slice.iter_mut() {
                            *b = b'*';
                        }
                        Ok(())
                    }
                }
            }
            FieldType::Date => {
                let s = match value {
                    Value::Date(s) => s.clone(),
                    Value::Nil => crate::value::EMPTY_DATE.to_string(),
                    other => {
                        return Err(XbaseError::new(
                            ErrorKind::TypeMismatch,
                            format!("cannot store {:?} into DATE field", other),
                        ))
                    }
                };
                slice.copy_from_slice(s.as_bytes());
                Ok(())
            }
            FieldType::Logical => {
                let b = value.to_logical();
                slice[0] = if b { b'T' } else { b'F' };
                Ok(())
            }
            FieldType::Memo => Err(XbaseError::new(
                ErrorKind::NotImplemented,
                "memo fields are not supported",
            )),
        }
    }
}

fn write_padded_left(dst: &mut [u8], src: &[u8]) {
    let n = src.len().min(dst.len());
    dst[..n].copy_from_slice(&src[..n]);
    for b in dst[n..].iter_mut() {
        *b = b' ';
    }
}

fn write_padded_right(dst: &mut [u8], src: &[u8]) {
    let n = src.len().min(dst.len());
    let pad = dst.len() - n;
    for b in dst[..pad].iter_mut() {
        *b = b' ';
    }
    dst[pad..].copy_from_slice(&src[src.len() - n..]);
}

/// Formats a number into exactly `length` bytes with `decimals` digits
/// after the point, right-aligned. Returns `None` on overflow.
fn format_numeric(n: f64, length: usize, decimals: u8) -> Option<String> {
    let text = format!("{:.*}", decimals as usize, n);
    if text.len() > length {
        None
    } else {
        Some(text)
    }
}

/// Parses a `YYYYMMDD` date string for validity; used by callers that need
/// a `chrono::NaiveDate` rather than the raw `Value::Date`.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fd(ft: FieldType, len: usize, dec: u8, off: usize) -> FieldDescriptor {
        FieldDescriptor {
            name: "F".into(),
            field_type: ft,
            length: len,
            decimal_count: dec,
            offset: off,
        }
    }

    #[test]
    fn char_roundtrip() {
        let f = fd(FieldType::Character, 10, 0, 0);
        let mut buf = vec![0u8; 10];
        f.put(&mut buf, &Value::String("hi".into())).unwrap();
        assert_eq!(&buf, b"hi        ");
        let v = f.get(&buf).unwrap();
        assert_eq!(v, Value::String("hi        ".into()));
    }

    #[test]
    fn numeric_roundtrip_with_decimals() {
        let f = fd(FieldType::Numeric, 8, 2, 0);
        let mut buf = vec![0u8; 8];
        f.put(&mut buf, &Value::Number(12.345)).unwrap();
        let v = f.get(&buf).unwrap();
        match v {
            Value::Number(n) => assert!((n - 12.35).abs() < 1e-9 || (n - 12.34).abs() < 1e-9),
            _ => panic!("expected number"),
        }
    }

    #[test]
    fn numeric_overflow_fills_asterisks() {
        let f = fd(FieldType::Numeric, 3, 0, 0);
        let mut buf = vec![0u8; 3];
        f.put(&mut buf, &Value::Number(99999.0)).unwrap();
        assert_eq!(&buf, b"***");
    }

    #[test]
    fn logical_roundtrip() {
        let f = fd(FieldType::Logical, 1, 0, 0);
        let mut buf = vec![0u8; 1];
        f.put(&mut buf, &Value::Logical(true)).unwrap();
        assert_eq!(f.get(&buf).unwrap(), Value::Logical(true));
    }
}
