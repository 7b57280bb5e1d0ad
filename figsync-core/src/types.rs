//! Domain types for figsync.
//!
//! All types that cross a file boundary are serializable via serde + serde_yaml.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Key suffix marking a metadata leaf as a file reference.
pub const FILE_SUFFIX: &str = "_file";

/// Suffix appended to a file-reference key to form its locator sibling.
pub const LOCATOR_SUFFIX: &str = "_url";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Identifier of a modeling task (`discovery`, `diatomics`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskId(pub String);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of a model whose artifacts are synchronized.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ModelName(pub String);

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ModelName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ModelName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Remote collection ("article") identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionId(pub u64);

impl fmt::Display for CollectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Remote file identifier, unique across the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileId(pub u64);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Key paths
// ---------------------------------------------------------------------------

/// Location of a leaf inside a nested metadata mapping.
///
/// Segments are stored separately so keys containing `.` never split.
/// `Display` renders the dotted form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<String>);

impl KeyPath {
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.to_owned());
        Self(segments)
    }

    /// Final segment (the file-reference key itself).
    pub fn leaf(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Sibling key holding the remote locator: `<leaf>_url`.
    pub fn locator_key(&self) -> Option<String> {
        self.leaf().map(|leaf| format!("{leaf}{LOCATOR_SUFFIX}"))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

impl FromStr for KeyPath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.split('.').map(str::to_owned).collect()))
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which file-reference keys take part in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FileTypeFilter {
    #[default]
    All,
    Analysis,
    Pred,
}

impl FileTypeFilter {
    /// `true` when a key carrying the file suffix passes this filter.
    ///
    /// Keys without the `_file` suffix never match.
    pub fn matches(&self, key: &str) -> bool {
        if !key.ends_with(FILE_SUFFIX) {
            return false;
        }
        match self {
            FileTypeFilter::All => true,
            FileTypeFilter::Analysis => key.ends_with("analysis_file"),
            FileTypeFilter::Pred => key.ends_with("pred_file"),
        }
    }
}

impl fmt::Display for FileTypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileTypeFilter::All => write!(f, "all"),
            FileTypeFilter::Analysis => write!(f, "analysis"),
            FileTypeFilter::Pred => write!(f, "pred"),
        }
    }
}

impl FromStr for FileTypeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "analysis" => Ok(Self::Analysis),
            "pred" => Ok(Self::Pred),
            other => Err(format!(
                "unknown file type '{other}'; expected: all, analysis, pred"
            )),
        }
    }
}

/// Whether a run performs remote and local mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Report intended actions only. No uploads, no creates, no metadata writes.
    Simulate,
    #[default]
    Execute,
}

impl SyncMode {
    pub fn is_simulate(&self) -> bool {
        matches!(self, SyncMode::Simulate)
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// Content hash + size of a local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentIdentity {
    /// Lowercase hex MD5 digest, comparable with the remote `computed_md5`.
    pub md5: String,
    pub size: u64,
}

/// A file attached to a remote collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    pub id: FileId,
    pub name: String,
    /// Populated by the remote once an upload has been processed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub computed_md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
