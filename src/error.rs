//! Wire-stable error taxonomy for the whole crate.
//!
//! A `thiserror::Error` enum carrying a message and an optional source,
//! covering DBF I/O, the XDX engine, the parser and the evaluator.

use std::io;
use std::num::{ParseFloatError, ParseIntError};
use thiserror::Error;

/// A wire-stable identifier for the kind of failure, independent of the
/// human-readable message carried alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    FileNotFound,
    FileCreate,
    FileRead,
    FileWrite,
    InvalidDbf,
    InvalidIndex,
    InvalidField,
    InvalidRecord,
    OutOfMemory,
    Syntax,
    TypeMismatch,
    UndefinedVariable,
    UndefinedFunction,
    DivisionByZero,
    Overflow,
    NoDatabase,
    DuplicateKey,
    Eof,
    Bof,
    NotImplemented,
    Internal,
}

#[derive(Error, Debug)]
#[error("{kind:?}: {message}")]
pub struct XbaseError {
    pub kind: ErrorKind,
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl XbaseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        XbaseError {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        XbaseError {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<io::Error> for XbaseError {
    fn from(e: io::Error) -> Self {
        let kind = match e.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            _ => ErrorKind::FileRead,
        };
        XbaseError::with_source(kind, "I/O error", e)
    }
}

impl From<ParseFloatError> for XbaseError {
    fn from(e: ParseFloatError) -> Self {
        XbaseError::with_source(ErrorKind::TypeMismatch, "invalid numeric field", e)
    }
}

impl From<ParseIntError> for XbaseError {
    fn from(e: ParseIntError) -> Self {
        XbaseError::with_source(ErrorKind::TypeMismatch, "invalid integer field", e)
    }
}

pub type XbaseResult<T> = Result<T, XbaseError>;
