//! Per-file outcomes and per-task aggregation.

use chrono::{DateTime, Utc};

use figsync_core::{CollectionId, KeyPath, ModelName, SyncMode, TaskId};
use figsync_remote::RemoteInventory;

/// What happened to one discovered artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileAction {
    /// Uploaded under a name the collection did not have before.
    Created,
    /// Uploaded over a same-named file that was already in the collection.
    Updated,
    /// Remote content already matches.
    Skipped,
    /// Simulate mode: would have been uploaded.
    WouldUpload,
    /// The referenced file does not exist locally.
    MissingLocal,
    /// The local file exists but could not be read.
    Unreadable,
}

impl FileAction {
    pub const ALL: [FileAction; 6] = [
        FileAction::Created,
        FileAction::Updated,
        FileAction::Skipped,
        FileAction::WouldUpload,
        FileAction::MissingLocal,
        FileAction::Unreadable,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FileAction::Created => "newly added",
            FileAction::Updated => "updated",
            FileAction::Skipped => "skipped (already exists with same hash)",
            FileAction::WouldUpload => "would upload",
            FileAction::MissingLocal => "missing locally",
            FileAction::Unreadable => "unreadable",
        }
    }
}

/// Outcome for one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    pub model: ModelName,
    pub key_path: KeyPath,
    pub rel_path: String,
    pub action: FileAction,
    /// Download URL for `Created`, `Updated` and `Skipped`.
    pub url: Option<String>,
}

/// Everything one task's sync did.
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: TaskId,
    pub mode: SyncMode,
    /// `None` in simulate mode when the collection does not exist yet.
    pub collection: Option<CollectionId>,
    pub collection_url: Option<String>,
    pub created_collection: bool,
    /// Remote files as listed before any upload.
    pub inventory: RemoteInventory,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    outcomes: Vec<FileOutcome>,
}

impl TaskReport {
    pub fn new(task: TaskId, mode: SyncMode) -> Self {
        Self {
            task,
            mode,
            collection: None,
            collection_url: None,
            created_collection: false,
            inventory: RemoteInventory::new(),
            started_at: Utc::now(),
            finished_at: None,
            outcomes: Vec::new(),
        }
    }

    /// Add an outcome. A relative path appears at most once per report; a
    /// later outcome for the same path replaces the earlier one.
    pub fn record(&mut self, outcome: FileOutcome) {
        if let Some(pos) = self
            .outcomes
            .iter()
            .position(|o| o.rel_path == outcome.rel_path)
        {
            let previous = self.outcomes.remove(pos);
            tracing::warn!(
                file = %outcome.rel_path,
                first = %format!("{}:{}", previous.model, previous.key_path),
                second = %format!("{}:{}", outcome.model, outcome.key_path),
                "file referenced by more than one key path, keeping the last outcome"
            );
        }
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[FileOutcome] {
        &self.outcomes
    }

    pub fn by_action(&self, action: FileAction) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(move |o| o.action == action)
    }

    pub fn count(&self, action: FileAction) -> usize {
        self.by_action(action).count()
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, once finished.
    pub fn elapsed(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}
