//! `xbase3`: a dBASE III+ compatible DBF/XDX database engine and command
//! interpreter.
//!
//! The crate is organised by subsystem: a DBF record engine (`dbf`), an
//! XDX B-tree index engine (`xdx`), an expression/command language
//! (`lang`), a memory variable store (`vars`), a function catalogue
//! (`funcs`), and the `Session` dispatcher that ties them together.

pub mod config;
pub mod dbf;
pub mod error;
pub mod funcs;
pub mod lang;
pub mod session;
pub mod value;
pub mod vars;
pub mod xdx;

pub use config::SessionConfig;
pub use error::{ErrorKind, XbaseError, XbaseResult};
pub use session::Session;
pub use value::Value;
