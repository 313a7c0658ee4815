//! On-disk DBF header and field-descriptor layouts.
//!
//! Standard dBASE III+ layout: a 32-byte file header followed by a
//! 32-byte descriptor per field.

use binary_layout::prelude::*;

define_layout!(yymmdd, LittleEndian, {
    year: u8,
    month: u8,
    day: u8,
});

define_layout!(dbf_header, LittleEndian, {
    version: u8,
    last_updated: yymmdd::NestedView,
    n_records: u32,
    n_header_bytes: u16,
    n_record_bytes: u16,
    _reserved1: [u8; 2],
    incomplete_transaction: u8,
    encrypted: u8,
    _reserved2: [u8; 12],
    _reserved3: [u8; 2],
});

define_layout!(field_descriptor, LittleEndian, {
    name: [u8; 11],
    f_type: u8,
    _reserved1: [u8; 4],
    length: u8,
    decimal_count: u8,
    _reserved2: [u8; 14],
});

pub const HEADER_SIZE: usize = 32;
pub const FIELD_DESCRIPTOR_SIZE: usize = 32;
pub const HEADER_TERMINATOR: u8 = 0x0D;
pub const EOF_MARKER: u8 = 0x1A;

pub const VERSION_PLAIN: u8 = 0x03;
pub const VERSION_MEMO: u8 = 0x83;
