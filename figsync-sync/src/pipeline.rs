//! Run orchestration: tasks × models.
//!
//! For each requested task: resolve (or lazily create) its collection, list
//! the remote inventory once, then walk and reconcile every requested model's
//! metadata. A model's document is written back only in execute mode and only
//! when its tree changed.

use std::path::Path;

use figsync_core::{
    find_file_references, Catalog, CollectionId, FileTypeFilter, MetadataError, ModelDocument,
    ModelName, SyncMode, TaskId,
};
use figsync_remote::{RemoteInventory, Repository};

use crate::error::{RunFailure, SyncError};
use crate::reconcile::Reconciler;
use crate::report::TaskReport;

/// What a run should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub tasks: Vec<TaskId>,
    pub models: Vec<ModelName>,
    pub mode: SyncMode,
    pub file_type: FileTypeFilter,
    /// Upload even when the remote content already matches.
    pub force: bool,
}

/// Failure inside one task, before run context is attached.
struct TaskFailure {
    model: Option<ModelName>,
    source: SyncError,
}

impl From<SyncError> for TaskFailure {
    fn from(source: SyncError) -> Self {
        Self {
            model: None,
            source,
        }
    }
}

impl From<figsync_remote::RemoteError> for TaskFailure {
    fn from(err: figsync_remote::RemoteError) -> Self {
        SyncError::from(err).into()
    }
}

fn at_model<E: Into<SyncError>>(model: &ModelName) -> impl FnOnce(E) -> TaskFailure + '_ {
    move |err| TaskFailure {
        model: Some(model.clone()),
        source: err.into(),
    }
}

/// Run the sync pipeline.
///
/// Tasks are processed in request order. The first failing task aborts the
/// run; its [`RunFailure`] names the task, the model being processed and the
/// full request. A collection created along the way is recorded in the
/// catalog at `catalog_path` immediately.
pub fn run<R: Repository + ?Sized>(
    catalog: &mut Catalog,
    catalog_path: &Path,
    repo: &R,
    request: &SyncRequest,
) -> Result<Vec<TaskReport>, RunFailure> {
    let mut reports = Vec::with_capacity(request.tasks.len());
    for task in &request.tasks {
        let report = sync_task(catalog, catalog_path, repo, task, request).map_err(|failure| {
            RunFailure {
                task: task.clone(),
                model: failure.model,
                requested_models: request.models.clone(),
                requested_tasks: request.tasks.clone(),
                source: failure.source,
            }
        })?;
        reports.push(report);
    }
    Ok(reports)
}

fn sync_task<R: Repository + ?Sized>(
    catalog: &mut Catalog,
    catalog_path: &Path,
    repo: &R,
    task: &TaskId,
    request: &SyncRequest,
) -> Result<TaskReport, TaskFailure> {
    let mut report = TaskReport::new(task.clone(), request.mode);
    let (collection, created) = resolve_collection(catalog, catalog_path, repo, task, request.mode)?;
    report.collection = collection;
    report.created_collection = created;
    report.collection_url = collection.map(|id| catalog.remote.collection_url(id));

    report.inventory = match collection {
        Some(id) => repo.list_files(id)?,
        None => RemoteInventory::new(),
    };
    tracing::info!(
        task = %task,
        files = report.inventory.len(),
        "listed existing remote files"
    );

    let root = catalog.artifact_root(catalog_path);
    let reconciler = Reconciler {
        repo,
        settings: &catalog.remote,
        task,
        collection,
        inventory: &report.inventory,
        mode: request.mode,
        force: request.force,
    };

    let mut outcomes = Vec::new();
    for model in &request.models {
        let entry = catalog
            .model(model)
            .ok_or_else(|| SyncError::UnknownModel(model.clone()))
            .map_err(at_model(model))?;
        let doc_path = catalog.model_document_path(catalog_path, entry);
        let mut doc = match ModelDocument::load_at(&doc_path) {
            Ok(doc) => doc,
            Err(MetadataError::NotFound { path }) => {
                tracing::warn!(model = %model, path = %path.display(), "missing model metadata file, skipping");
                continue;
            }
            Err(err) => return Err(at_model(model)(err)),
        };

        let Some(tree) = doc.task_metrics_mut(task) else {
            tracing::debug!(model = %model, task = %task, "no metrics for task");
            continue;
        };

        let refs = find_file_references(tree, request.file_type);
        let synced = reconciler
            .reconcile(model, &root, tree, refs)
            .map_err(at_model(model))?;
        outcomes.extend(synced.outcomes);

        if synced.mutated && !request.mode.is_simulate() {
            doc.save().map_err(at_model(model))?;
            tracing::info!(model = %model, path = %doc.path.display(), "wrote metadata");
        }
    }

    for outcome in outcomes {
        report.record(outcome);
    }
    report.finish();
    Ok(report)
}

/// Find the task's collection, creating it in execute mode when absent.
///
/// Returns the id (if any) and whether it was created by this call.
fn resolve_collection<R: Repository + ?Sized>(
    catalog: &mut Catalog,
    catalog_path: &Path,
    repo: &R,
    task: &TaskId,
    mode: SyncMode,
) -> Result<(Option<CollectionId>, bool), SyncError> {
    let configured = catalog
        .task(task)
        .ok_or_else(|| SyncError::UnknownTask(task.clone()))?
        .collection_id;

    if let Some(id) = configured {
        if repo.collection_exists(id)? {
            tracing::info!(task = %task, collection = %id, "found existing collection");
            return Ok((Some(id), false));
        }
        tracing::warn!(task = %task, collection = %id, "configured collection not found");
    }

    if mode.is_simulate() {
        tracing::info!(task = %task, "[dry-run] would create new collection");
        return Ok((None, false));
    }

    let metadata = catalog.collection_metadata(task)?;
    let id = repo.create_collection(&metadata)?;
    catalog.record_collection_id(task, id)?;
    catalog.save_at(catalog_path)?;
    tracing::warn!(
        task = %task,
        collection = %id,
        catalog = %catalog_path.display(),
        "created new collection and recorded its id in the catalog"
    );
    Ok((Some(id), true))
}
