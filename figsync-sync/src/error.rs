//! Error types for figsync-sync.

use thiserror::Error;

use figsync_core::{MetadataError, ModelName, TaskId};
use figsync_remote::RemoteError;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Metadata, catalog or identity failure.
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// The remote repository call failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("unknown task '{0}'")]
    UnknownTask(TaskId),

    #[error("unknown model '{0}'")]
    UnknownModel(ModelName),

    /// Execute mode reached an upload without a resolved collection.
    #[error("no collection resolved for task '{0}'")]
    NoCollection(TaskId),
}

/// A run aborted while processing one task.
///
/// Carries the state needed to reproduce the failure: where it happened and
/// what the run was asked to do.
#[derive(Debug, Error)]
#[error(
    "sync failed for task '{task}' (model: {current}; requested models: {models}; requested tasks: {tasks}): {source}",
    current = display_model(.model),
    models = join(.requested_models),
    tasks = join(.requested_tasks)
)]
pub struct RunFailure {
    pub task: TaskId,
    /// `None` when the failure happened before any model was processed.
    pub model: Option<ModelName>,
    pub requested_models: Vec<ModelName>,
    pub requested_tasks: Vec<TaskId>,
    #[source]
    pub source: SyncError,
}

fn display_model(model: &Option<ModelName>) -> String {
    model
        .as_ref()
        .map_or_else(|| "-".to_string(), ToString::to_string)
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
