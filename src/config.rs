//! Optional session configuration, loaded from a JSON file via `serde`.

use crate::error::{ErrorKind, XbaseError, XbaseResult};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Overrides the process's current directory for relative USE/INDEX/CREATE paths.
    pub working_dir: Option<PathBuf>,
    /// Default `INDEX ON ... TO` B-tree order, overriding `xdx::header::DEFAULT_ORDER`.
    pub default_order: Option<u16>,
    /// Column width LIST/DISPLAY wrap at; currently advisory only.
    pub output_width: usize,
    /// Initial `SET DELETED` state.
    pub set_deleted: bool,
    /// Initial `SET EXACT` state.
    pub set_exact: bool,
}

impl Default for SessionConfig {
    fn default() -> SessionConfig {
        SessionConfig {
            working_dir: None,
            default_order: None,
            output_width: 80,
            set_deleted: false,
            set_exact: false,
        }
    }
}

impl SessionConfig {
    pub fn load(path: impl AsRef<Path>) -> XbaseResult<SessionConfig> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                XbaseError::new(ErrorKind::FileNotFound, format!("{}", path.display()))
            } else {
                XbaseError::with_source(ErrorKind::FileRead, "opening session config", e)
            }
        })?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| XbaseError::with_source(ErrorKind::Syntax, "parsing session config", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.output_width, 80);
        assert!(!cfg.set_deleted);
    }

    #[test]
    fn round_trips_through_json() {
        let cfg = SessionConfig { set_deleted: true, output_width: 132, ..Default::default() };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: SessionConfig = serde_json::from_str(&json).unwrap();
        assert!(back.set_deleted);
        assert_eq!(back.output_width, 132);
    }
}
