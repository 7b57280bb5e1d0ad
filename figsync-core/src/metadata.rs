//! Per-model metadata documents.
//!
//! Each model has one YAML document with a `metrics` section keyed by task:
//!
//! ```yaml
//! model_name: MACE
//! metrics:
//!   discovery:
//!     pred_file: models/mace/2024-07-20-wbm-preds.csv.gz
//!     pred_file_url: https://figshare.com/ndownloader/files/123
//! ```
//!
//! Saves follow the registry's atomic pattern: serialize → `<file>.tmp`
//! sibling → `rename`.

use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};

use crate::error::{io_err, MetadataError};
use crate::types::TaskId;

const METRICS_KEY: &str = "metrics";

/// A loaded model metadata document.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDocument {
    pub path: PathBuf,
    pub root: Value,
}

impl ModelDocument {
    /// Load the document at `path`.
    ///
    /// Returns `NotFound` if absent, `Parse` (with path + line context) if
    /// malformed, `NotAMapping` if the root is a scalar or sequence.
    pub fn load_at(path: &Path) -> Result<Self, MetadataError> {
        if !path.exists() {
            return Err(MetadataError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let root: Value = serde_yaml::from_str(&contents).map_err(|e| MetadataError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        if !root.is_mapping() {
            return Err(MetadataError::NotAMapping {
                path: path.to_path_buf(),
            });
        }
        Ok(Self {
            path: path.to_path_buf(),
            root,
        })
    }

    /// `metrics.<task>` as a mapping; `None` if missing or not a mapping.
    pub fn task_metrics(&self, task: &TaskId) -> Option<&Mapping> {
        self.root
            .get(METRICS_KEY)?
            .get(task.0.as_str())?
            .as_mapping()
    }

    /// Mutable access to `metrics.<task>`.
    pub fn task_metrics_mut(&mut self, task: &TaskId) -> Option<&mut Mapping> {
        self.root
            .get_mut(METRICS_KEY)?
            .get_mut(task.0.as_str())?
            .as_mapping_mut()
    }

    /// Atomically write the document back to [`ModelDocument::path`].
    pub fn save(&self) -> Result<(), MetadataError> {
        let yaml = serde_yaml::to_string(&self.root)?;
        write_atomic(&self.path, &yaml)
    }
}

/// Write `contents` to `<path>.tmp` then rename over `path`.
///
/// The `.tmp` sibling lives in the same directory (same filesystem), so the
/// rename is atomic on POSIX.
pub(crate) fn write_atomic(path: &Path, contents: &str) -> Result<(), MetadataError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{file_name}.tmp"));
    std::fs::write(&tmp, contents).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
